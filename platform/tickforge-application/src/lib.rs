pub mod config;
pub mod producer;
pub mod schema;
