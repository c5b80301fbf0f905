use std::net::SocketAddr;

pub const LOG_ENV: &str = "TICKFORGE_LOG";

/// Logs go to stderr so stdout stays free for progress dots and `--json`.
pub fn init_tracing(log_level: &str, log_format: &str) -> Result<(), String> {
    let filter = std::env::var(LOG_ENV)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| log_level.to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_new(filter)
        .map_err(|err| format!("invalid log filter: {err}"))?;

    let format = log_format.trim().to_lowercase();
    if format == "json" {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

/// Starts the Prometheus exporter when `--metrics-addr` is given. Without
/// it, `metrics` calls go to the no-op recorder.
pub fn init_metrics(metrics_addr: Option<&str>) -> Result<(), String> {
    match parse_metrics_addr(metrics_addr)? {
        Some(addr) => install_exporter(addr),
        None => Ok(()),
    }
}

fn parse_metrics_addr(raw: Option<&str>) -> Result<Option<SocketAddr>, String> {
    let Some(raw) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    raw.parse()
        .map(Some)
        .map_err(|err| format!("invalid --metrics-addr '{raw}' (expected host:port): {err}"))
}

#[cfg(feature = "prometheus")]
fn install_exporter(addr: SocketAddr) -> Result<(), String> {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|err| format!("failed to start metrics exporter on {addr}: {err}"))?;
    tracing::info!(metrics_addr = %addr, "serving prometheus metrics");
    Ok(())
}

#[cfg(not(feature = "prometheus"))]
fn install_exporter(addr: SocketAddr) -> Result<(), String> {
    Err(format!(
        "--metrics-addr {addr} needs a build with the `prometheus` feature"
    ))
}

#[cfg(test)]
mod tests {
    use super::parse_metrics_addr;

    #[test]
    fn metrics_addr_is_optional() {
        assert_eq!(parse_metrics_addr(None).unwrap(), None);
        assert_eq!(parse_metrics_addr(Some("  ")).unwrap(), None);
    }

    #[test]
    fn metrics_addr_must_be_host_and_port() {
        let addr = parse_metrics_addr(Some("127.0.0.1:9898")).unwrap();
        assert_eq!(addr.map(|a| a.port()), Some(9898));

        let err = parse_metrics_addr(Some("localhost")).unwrap_err();
        assert!(err.contains("--metrics-addr 'localhost'"));
    }
}
