use crate::value_objects::tick_record::TickRecord;
use chrono::NaiveDate;

/// Per-column arrays of a batch, in the table's column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickColumns {
    pub timestamps_ms: Vec<i64>,
    pub tickers: Vec<String>,
    pub clients: Vec<String>,
    pub opens: Vec<f32>,
    pub highs: Vec<f32>,
    pub lows: Vec<f32>,
    pub closes: Vec<f32>,
    pub volumes: Vec<u32>,
    pub dates_ms: Vec<i64>,
}

impl TickColumns {
    pub fn from_records(records: &[TickRecord]) -> Self {
        let n = records.len();
        let mut cols = Self {
            timestamps_ms: Vec::with_capacity(n),
            tickers: Vec::with_capacity(n),
            clients: Vec::with_capacity(n),
            opens: Vec::with_capacity(n),
            highs: Vec::with_capacity(n),
            lows: Vec::with_capacity(n),
            closes: Vec::with_capacity(n),
            volumes: Vec::with_capacity(n),
            dates_ms: Vec::with_capacity(n),
        };
        for record in records {
            cols.timestamps_ms.push(record.timestamp.timestamp_millis());
            cols.tickers.push(record.ticker.clone());
            cols.clients.push(record.client.clone());
            cols.opens.push(record.open as f32);
            cols.highs.push(record.high as f32);
            cols.lows.push(record.low as f32);
            cols.closes.push(record.close as f32);
            cols.volumes.push(record.volume);
            cols.dates_ms.push(date_to_millis(record.date));
        }
        cols
    }

    pub fn len(&self) -> usize {
        self.timestamps_ms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps_ms.is_empty()
    }
}

/// Midnight UTC of `date`, in epoch milliseconds.
pub fn date_to_millis(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp_millis())
        .unwrap_or_default()
}
