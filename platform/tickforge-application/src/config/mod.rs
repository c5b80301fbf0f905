use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tickforge_domain::services::generator::{
    GeneratorConfig, PriceRange, DEFAULT_CLIENTS, DEFAULT_SYMBOLS,
};
use url::Url;

pub const DB_PASSWORD_ENV: &str = "TICKFORGE_DB_PASSWORD";

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    pub connection: ConnectionConfig,
    pub database: DatabaseConfig,
    pub generation: GenerationConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    /// Full DSN (e.g. a `wss://...?token=...` cloud URL). Overrides the fields above.
    pub dsn: Option<String>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6041,
            user: "root".to_string(),
            password: Some("taosdata".to_string()),
            dsn: None,
        }
    }
}

impl ConnectionConfig {
    fn dsn_override(&self) -> Option<&str> {
        self.dsn.as_deref().map(str::trim).filter(|d| !d.is_empty())
    }

    /// Builds `ws://user:pass@host:port` with the userinfo percent-encoded,
    /// unless a full `dsn` override is configured.
    pub fn resolve_dsn(&self) -> Result<String, String> {
        if let Some(dsn) = self.dsn_override() {
            return Ok(dsn.to_string());
        }
        let password = self
            .password
            .clone()
            .or_else(|| {
                std::env::var(DB_PASSWORD_ENV)
                    .ok()
                    .filter(|v| !v.trim().is_empty())
            })
            .unwrap_or_default();

        let mut url = Url::parse(&format!("ws://{}", self.host.trim()))
            .map_err(|err| format!("invalid connection.host '{}': {err}", self.host))?;
        url.set_username(&self.user)
            .map_err(|()| format!("cannot use connection.user '{}'", self.user))?;
        if !password.is_empty() {
            url.set_password(Some(&password))
                .map_err(|()| "cannot use connection.password".to_string())?;
        }
        let host = url.host_str().unwrap_or_default();
        Ok(match url.password() {
            Some(password) => format!(
                "ws://{}:{}@{}:{}",
                url.username(),
                password,
                host,
                self.port
            ),
            None => format!("ws://{}@{}:{}", url.username(), host, self.port),
        })
    }

    /// DSN with the password and query string masked, for log lines.
    pub fn redacted_dsn(&self) -> String {
        match self.dsn_override() {
            Some(dsn) => redact_dsn(dsn),
            None => format!("ws://{}@{}:{}", self.user, self.host, self.port),
        }
    }
}

fn redact_dsn(dsn: &str) -> String {
    let (base, has_query) = match dsn.split_once('?') {
        Some((base, _)) => (base, true),
        None => (dsn, false),
    };
    let base = match base.split_once("://") {
        Some((scheme, rest)) => match rest.rsplit_once('@') {
            Some((userinfo, hosts)) => {
                let user = userinfo.split(':').next().unwrap_or_default();
                format!("{scheme}://{user}@{hosts}")
            }
            None => base.to_string(),
        },
        None => base.to_string(),
    };
    if has_query {
        format!("{base}?<redacted>")
    } else {
        base
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct DatabaseConfig {
    pub name: String,
    pub table: String,
    pub keep_days: Option<u32>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            name: "stocks".to_string(),
            table: "stocks_values".to_string(),
            keep_days: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct GenerationConfig {
    pub interval_ms: u64,
    pub rows_per_batch: usize,
    pub max_run_ms: Option<u64>,
    pub modifier_min: u32,
    pub modifier_max: u32,
    pub volume_min: u32,
    pub volume_max: u32,
    pub row_spacing_ms: u64,
    pub timestamp_jitter_ms: Option<u64>,
    pub symbols: Vec<String>,
    pub clients: Vec<String>,
    pub open: PriceRange,
    pub high: PriceRange,
    pub low: PriceRange,
    pub close: PriceRange,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        let domain = GeneratorConfig::default();
        Self {
            interval_ms: 250,
            rows_per_batch: domain.rows_per_batch,
            max_run_ms: None,
            modifier_min: domain.modifier_min,
            modifier_max: domain.modifier_max,
            volume_min: domain.volume_min,
            volume_max: domain.volume_max,
            row_spacing_ms: domain.row_spacing_ms,
            timestamp_jitter_ms: domain.timestamp_jitter_ms,
            symbols: DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect(),
            clients: DEFAULT_CLIENTS.iter().map(|s| s.to_string()).collect(),
            open: domain.open,
            high: domain.high,
            low: domain.low,
            close: domain.close,
        }
    }
}

impl GenerationConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn max_run(&self) -> Option<Duration> {
        self.max_run_ms.map(Duration::from_millis)
    }

    pub fn to_generator_config(&self) -> GeneratorConfig {
        GeneratorConfig {
            rows_per_batch: self.rows_per_batch,
            symbols: self.symbols.clone(),
            clients: self.clients.clone(),
            modifier_min: self.modifier_min,
            modifier_max: self.modifier_max,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume_min: self.volume_min,
            volume_max: self.volume_max,
            row_spacing_ms: self.row_spacing_ms,
            timestamp_jitter_ms: self.timestamp_jitter_ms,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), String> {
        crate::schema::validate_identifier(&self.database.name)
            .map_err(|err| format!("invalid database.name: {err}"))?;
        crate::schema::validate_identifier(&self.database.table)
            .map_err(|err| format!("invalid database.table: {err}"))?;
        self.generation
            .to_generator_config()
            .validate()
            .map_err(|err| format!("invalid generation config: {err}"))?;
        if self.connection.dsn.is_none() && self.connection.host.trim().is_empty() {
            return Err("connection.host must not be empty".to_string());
        }
        match self.logging.format.trim().to_lowercase().as_str() {
            "text" | "json" => {}
            other => {
                return Err(format!(
                    "unsupported logging.format '{other}'; expected 'text' or 'json'"
                ))
            }
        }
        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config, String> {
    let (config, _source) = load_config_with_source(path)?;
    Ok(config)
}

pub fn load_config_with_source(path: &Path) -> Result<(Config, String), String> {
    let contents = fs::read_to_string(path)
        .map_err(|err| format!("failed to read config {}: {}", path.display(), err))?;
    let config: Config = toml::from_str(&contents)
        .map_err(|err| format!("failed to parse TOML {}: {}", path.display(), err))?;
    config
        .validate()
        .map_err(|err| format!("invalid config {}: {}", path.display(), err))?;
    Ok((config, contents))
}

pub fn to_toml_pretty(config: &Config) -> Result<String, String> {
    toml::to_string_pretty(config)
        .map_err(|err| format!("failed to serialize config as TOML: {err}"))
}
