use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One simulated market observation. Immutable once generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickRecord {
    pub timestamp: DateTime<Utc>,
    pub ticker: String,
    pub client: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u32,
    pub date: NaiveDate,
}

impl TickRecord {
    pub fn prices(&self) -> [f64; 4] {
        [self.open, self.high, self.low, self.close]
    }
}
