use crate::value_objects::tick_record::TickRecord;

/// Destination for generated ticks.
///
/// `execute` runs a single DDL/utility statement. `write_batch` binds
/// `batch` column-wise to the parameterized `statement`, executes it as one
/// batch and returns the number of rows written.
pub trait TickSink {
    fn execute(&mut self, sql: &str) -> Result<(), String>;

    fn write_batch(&mut self, statement: &str, batch: &[TickRecord]) -> Result<usize, String>;
}
