mod obs;

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tickforge_application::config::{self, Config};
use tickforge_application::producer::{
    run_producer, DotProgress, NoopProgress, ProducerSummary, StopSignal,
};
use tickforge_domain::services::generator::TickGenerator;
use tickforge_infrastructure::tdengine::TdengineTickSink;

const CONFIG_ENV: &str = "TICKFORGE_CONFIG";

#[derive(Parser, Debug)]
#[command(name = "tickforge")]
#[command(about = "Writes batches of synthetic market ticks into TDengine until interrupted.", version)]
struct Cli {
    /// Config file path (TOML). If omitted, uses env TICKFORGE_CONFIG, then built-in defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log output format; overrides logging.format from the config.
    #[arg(long)]
    log_format: Option<LogFormat>,

    /// Prometheus metrics listen addr (e.g. 127.0.0.1:9898). Optional.
    #[arg(long)]
    metrics_addr: Option<String>,

    /// Print the effective config as TOML and exit.
    #[arg(long)]
    print_config: bool,

    /// Print a single JSON summary line on exit instead of progress dots.
    #[arg(long)]
    json: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    fn as_str(self) -> &'static str {
        match self {
            LogFormat::Text => "text",
            LogFormat::Json => "json",
        }
    }
}

fn main() {
    if let Err(err) = run(Cli::parse()) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let config = resolve_config(cli.config)?;
    if cli.print_config {
        print!("{}", config::to_toml_pretty(&config)?);
        return Ok(());
    }

    let log_format = cli
        .log_format
        .map(LogFormat::as_str)
        .unwrap_or(config.logging.format.as_str());
    obs::init_tracing(&config.logging.level, log_format)?;
    obs::init_metrics(cli.metrics_addr.as_deref())?;

    let generator = TickGenerator::new(config.generation.to_generator_config())?;

    let stop = StopSignal::new();
    let handler_stop = stop.clone();
    ctrlc::set_handler(move || {
        tracing::info!("interrupt received");
        handler_stop.request_stop();
    })
    .map_err(|err| format!("failed to install interrupt handler: {err}"))?;

    tracing::info!(dsn = %config.connection.redacted_dsn(), "connecting to TDengine");
    let mut sink = TdengineTickSink::connect(&config.connection.resolve_dsn()?)?;

    let summary = if cli.json {
        run_producer(&config, &mut sink, &generator, &stop, &mut NoopProgress)?
    } else {
        let mut progress = DotProgress::stdout();
        run_producer(&config, &mut sink, &generator, &stop, &mut progress)?
    };

    if cli.json {
        println!("{}", summary_json(&summary)?);
    }
    Ok(())
}

fn resolve_config(path: Option<PathBuf>) -> Result<Config, String> {
    let path = path.or_else(|| {
        std::env::var(CONFIG_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
    });
    match path {
        Some(path) => config::load_config(&path),
        None => Ok(Config::default()),
    }
}

fn summary_json(summary: &ProducerSummary) -> Result<String, String> {
    serde_json::to_string(summary).map_err(|err| format!("failed to serialize summary: {err}"))
}
