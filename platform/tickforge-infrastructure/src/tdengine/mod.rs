use std::time::Instant;
use taos::sync::*;
use taos::{ColumnView, Stmt, Taos, TaosBuilder};
use tickforge_domain::repositories::tick_sink::TickSink;
use tickforge_domain::services::columns::TickColumns;
use tickforge_domain::value_objects::tick_record::TickRecord;

/// `TickSink` over the TDengine WebSocket driver.
///
/// Holds one connection for its lifetime. The insert statement is prepared
/// on first use and reused while the statement text stays the same.
pub struct TdengineTickSink {
    taos: Taos,
    prepared: Option<(String, Stmt)>,
}

impl TdengineTickSink {
    pub fn connect(dsn: &str) -> Result<Self, String> {
        let start = Instant::now();
        let builder = TaosBuilder::from_dsn(dsn).map_err(|err| {
            record_error("dsn");
            format!("invalid TDengine dsn: {err}")
        })?;
        let taos = builder.build().map_err(|err| {
            record_error("connect");
            format!("failed to connect to TDengine: {err}")
        })?;
        metrics::histogram!("tickforge.infra.tdengine.connect_ms")
            .record(start.elapsed().as_secs_f64() * 1000.0);
        tracing::info!("connected to TDengine");
        Ok(Self {
            taos,
            prepared: None,
        })
    }

    fn statement(&mut self, sql: &str) -> Result<&mut Stmt, String> {
        let reusable = matches!(&self.prepared, Some((text, _)) if text.as_str() == sql);
        if !reusable {
            let mut stmt = Stmt::init(&self.taos).map_err(|err| {
                record_error("stmt_init");
                format!("failed to init statement: {err}")
            })?;
            stmt.prepare(sql).map_err(|err| {
                record_error("prepare");
                format!("failed to prepare insert: {err}")
            })?;
            self.prepared = Some((sql.to_string(), stmt));
        }
        match self.prepared.as_mut() {
            Some((_, stmt)) => Ok(stmt),
            None => Err("prepared statement missing".to_string()),
        }
    }
}

impl TickSink for TdengineTickSink {
    fn execute(&mut self, sql: &str) -> Result<(), String> {
        tracing::debug!(sql = %sql, "tdengine exec");
        self.taos.exec(sql).map_err(|err| {
            record_error("exec");
            tracing::error!(error = %err, sql = %sql, "statement failed");
            format!("statement failed: {err}")
        })?;
        Ok(())
    }

    fn write_batch(&mut self, statement: &str, batch: &[TickRecord]) -> Result<usize, String> {
        if batch.is_empty() {
            return Ok(0);
        }
        let span = tracing::debug_span!("infra.tdengine.write_batch", rows = batch.len());
        let _enter = span.enter();

        let params = bind_columns(TickColumns::from_records(batch));
        let start = Instant::now();
        let stmt = self.statement(statement)?;
        stmt.bind(&params).map_err(|err| {
            record_error("bind");
            format!("failed to bind columns: {err}")
        })?;
        stmt.add_batch().map_err(|err| {
            record_error("add_batch");
            format!("failed to add batch: {err}")
        })?;
        let affected = stmt.execute().map_err(|err| {
            record_error("execute");
            tracing::error!(error = %err, "batch insert failed");
            format!("batch insert failed: {err}")
        })?;

        metrics::histogram!("tickforge.infra.tdengine.write_ms")
            .record(start.elapsed().as_secs_f64() * 1000.0);
        metrics::counter!("tickforge.infra.tdengine.write_batch.calls_total", "result" => "ok")
            .increment(1);
        Ok(affected)
    }
}

/// Column binders in table order: ts, ticker, client, open, high, low,
/// close, volume, date.
fn bind_columns(cols: TickColumns) -> Vec<ColumnView> {
    vec![
        ColumnView::from_millis_timestamp(cols.timestamps_ms),
        ColumnView::from_nchar(cols.tickers),
        ColumnView::from_nchar(cols.clients),
        ColumnView::from_floats(cols.opens),
        ColumnView::from_floats(cols.highs),
        ColumnView::from_floats(cols.lows),
        ColumnView::from_floats(cols.closes),
        ColumnView::from_unsigned_ints(cols.volumes),
        ColumnView::from_millis_timestamp(cols.dates_ms),
    ]
}

fn record_error(stage: &'static str) {
    metrics::counter!("tickforge.infra.tdengine.errors_total", "stage" => stage).increment(1);
}
