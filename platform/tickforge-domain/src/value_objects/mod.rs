pub mod tick_record;
