use crate::config::Config;
use crate::schema::{initialize_schema, insert_sql, SchemaTarget};
use parking_lot::{Condvar, Mutex};
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tickforge_domain::repositories::tick_sink::TickSink;
use tickforge_domain::services::generator::TickGenerator;
use tracing::info_span;

const DOTS_PER_LINE: u64 = 80;

pub trait RunControl {
    fn should_stop(&self) -> bool;

    /// Blocks for up to `timeout`. Returns `false` if a stop was requested
    /// before or during the wait.
    fn wait(&self, timeout: Duration) -> bool;
}

/// Never stops; waits are plain sleeps.
pub struct NoopControl;

impl RunControl for NoopControl {
    fn should_stop(&self) -> bool {
        false
    }

    fn wait(&self, timeout: Duration) -> bool {
        std::thread::sleep(timeout);
        true
    }
}

/// Stop flag shared with an interrupt handler. A stop request wakes a
/// pending `wait` immediately.
#[derive(Clone, Default)]
pub struct StopSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        let (lock, cvar) = &*self.inner;
        *lock.lock() = true;
        cvar.notify_all();
    }
}

impl RunControl for StopSignal {
    fn should_stop(&self) -> bool {
        *self.inner.0.lock()
    }

    fn wait(&self, timeout: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let deadline = Instant::now() + timeout;
        let mut stopped = lock.lock();
        while !*stopped {
            if cvar.wait_until(&mut stopped, deadline).timed_out() {
                break;
            }
        }
        !*stopped
    }
}

pub trait ProgressReporter {
    fn on_batch(&mut self, batch_index: u64, rows: usize);

    fn finish(&mut self) {}
}

pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn on_batch(&mut self, _batch_index: u64, _rows: usize) {}
}

/// One `.` per batch, wrapped every 80 batches.
pub struct DotProgress<W: Write> {
    out: W,
    dots_on_line: u64,
}

impl<W: Write> DotProgress<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            dots_on_line: 0,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl DotProgress<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> ProgressReporter for DotProgress<W> {
    fn on_batch(&mut self, _batch_index: u64, _rows: usize) {
        self.dots_on_line += 1;
        let _ = self.out.write_all(b".");
        if self.dots_on_line % DOTS_PER_LINE == 0 {
            let _ = self.out.write_all(b"\n");
            self.dots_on_line = 0;
        }
        let _ = self.out.flush();
    }

    fn finish(&mut self) {
        if self.dots_on_line > 0 {
            let _ = self.out.write_all(b"\n");
            self.dots_on_line = 0;
        }
        let _ = self.out.flush();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Interrupted,
    MaxRunElapsed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProducerSummary {
    pub table: String,
    pub batches: u64,
    pub rows: u64,
    pub elapsed_ms: u64,
    pub stop_reason: StopReason,
}

/// Initializes the schema, then writes one generated batch per interval
/// until `control` requests a stop or `generation.max_run_ms` elapses.
/// A failed write aborts the run.
pub fn run_producer(
    config: &Config,
    sink: &mut dyn TickSink,
    generator: &TickGenerator,
    control: &dyn RunControl,
    progress: &mut dyn ProgressReporter,
) -> Result<ProducerSummary, String> {
    let target = SchemaTarget::from_config(&config.database);
    initialize_schema(sink, &target)?;

    let _span = info_span!(
        "run_producer",
        table = %target.table,
        rows_per_batch = generator.rows_per_batch(),
        interval_ms = config.generation.interval_ms
    )
    .entered();

    let statement = insert_sql(&target.table);
    let interval = config.generation.interval();
    let max_run = config.generation.max_run();
    let started = Instant::now();
    let mut batches = 0u64;
    let mut rows = 0u64;

    tracing::info!(
        interval_ms = config.generation.interval_ms,
        "inserting data into TDengine"
    );

    let stop_reason = loop {
        if control.should_stop() {
            break StopReason::Interrupted;
        }
        if max_run.is_some_and(|max| started.elapsed() >= max) {
            break StopReason::MaxRunElapsed;
        }

        let batch = generator.generate_batch();
        let write_start = Instant::now();
        let written = sink
            .write_batch(&statement, &batch)
            .map_err(|err| format!("failed to write batch {}: {err}", batches + 1))?;
        metrics::histogram!("tickforge.producer.batch_write_ms")
            .record(write_start.elapsed().as_secs_f64() * 1000.0);
        metrics::counter!("tickforge.producer.batches_total").increment(1);
        metrics::counter!("tickforge.producer.rows_total").increment(written as u64);

        batches += 1;
        rows += written as u64;
        tracing::debug!(batch = batches, rows = written, table = %target.table, "wrote batch");
        progress.on_batch(batches, written);

        let pause = match max_run {
            Some(max) => interval.min(max.saturating_sub(started.elapsed())),
            None => interval,
        };
        if !control.wait(pause) {
            break StopReason::Interrupted;
        }
    };

    progress.finish();
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    tracing::info!(
        batches,
        rows,
        elapsed_ms,
        reason = ?stop_reason,
        "shutting down"
    );

    Ok(ProducerSummary {
        table: target.table,
        batches,
        rows,
        elapsed_ms,
        stop_reason,
    })
}
