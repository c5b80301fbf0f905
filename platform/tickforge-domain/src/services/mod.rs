pub mod columns;
pub mod generator;
