use tickforge_domain::repositories::tick_sink::TickSink;
use tickforge_domain::services::generator::MAX_LABEL_CHARS;
use tracing::info_span;

pub const COLUMN_COUNT: usize = 9;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaTarget {
    pub database: String,
    pub table: String,
    pub keep_days: Option<u32>,
}

impl SchemaTarget {
    pub fn from_config(config: &crate::config::DatabaseConfig) -> Self {
        Self {
            database: config.name.clone(),
            table: config.table.clone(),
            keep_days: config.keep_days,
        }
    }
}

pub fn create_database_sql(database: &str, keep_days: Option<u32>) -> String {
    match keep_days {
        Some(days) => format!("CREATE DATABASE IF NOT EXISTS {database} KEEP {days}"),
        None => format!("CREATE DATABASE IF NOT EXISTS {database}"),
    }
}

pub fn use_database_sql(database: &str) -> String {
    format!("USE {database}")
}

pub fn drop_table_sql(table: &str) -> String {
    format!("DROP TABLE IF EXISTS {table}")
}

pub fn create_table_sql(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS `{table}` (\
         `timestamp` TIMESTAMP, \
         `ticker` NCHAR({MAX_LABEL_CHARS}), \
         `client` NCHAR({MAX_LABEL_CHARS}), \
         `open` FLOAT, \
         `high` FLOAT, \
         `low` FLOAT, \
         `close` FLOAT, \
         `volume` INT UNSIGNED, \
         `date` TIMESTAMP)"
    )
}

pub fn insert_sql(table: &str) -> String {
    let placeholders = vec!["?"; COLUMN_COUNT].join(", ");
    format!("INSERT INTO {table} VALUES ({placeholders})")
}

/// Creates the database if missing, then drops and recreates the table.
/// Existing rows are discarded on every call.
pub fn initialize_schema<S: TickSink + ?Sized>(
    sink: &mut S,
    target: &SchemaTarget,
) -> Result<(), String> {
    let _span = info_span!(
        "initialize_schema",
        database = %target.database,
        table = %target.table
    )
    .entered();

    validate_identifier(&target.database)
        .map_err(|err| format!("invalid database name: {err}"))?;
    validate_identifier(&target.table).map_err(|err| format!("invalid table name: {err}"))?;

    sink.execute(&create_database_sql(&target.database, target.keep_days))
        .map_err(|err| format!("failed to create database {}: {err}", target.database))?;
    sink.execute(&use_database_sql(&target.database))
        .map_err(|err| format!("failed to select database {}: {err}", target.database))?;
    tracing::info!(database = %target.database, "created database");

    sink.execute(&drop_table_sql(&target.table))
        .map_err(|err| format!("failed to drop table {}: {err}", target.table))?;
    sink.execute(&create_table_sql(&target.table))
        .map_err(|err| format!("failed to create table {}: {err}", target.table))?;
    tracing::info!(table = %target.table, "created table");
    Ok(())
}

pub fn validate_identifier(name: &str) -> Result<(), String> {
    let mut chars = name.chars();
    let first = chars
        .next()
        .ok_or_else(|| "identifier is empty".to_string())?;
    if !(first.is_ascii_alphabetic() || first == '_') {
        return Err(format!("invalid identifier '{name}'"));
    }
    if !chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
        return Err(format!("invalid identifier '{name}'"));
    }
    Ok(())
}
