pub mod tick_sink;
