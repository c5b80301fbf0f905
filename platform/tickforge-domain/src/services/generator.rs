use crate::value_objects::tick_record::TickRecord;
use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SYMBOLS: [&str; 13] = [
    "AAPL.N", "AMZN.N", "QQQ.N", "NVDA.N", "TSLA.N", "FB.N", "MSFT.N", "TLT.N", "XIV.N", "YY.N",
    "CSCO.N", "GOOGL.N", "PCLN.N",
];

pub const DEFAULT_CLIENTS: [&str; 9] = [
    "Homer", "Marge", "Bart", "Lisa", "Maggie", "Moe", "Lenny", "Carl", "Krusty",
];

pub const MAX_TIMESTAMP_JITTER_MS: u64 = 86_400_000;
pub const MAX_ROW_SPACING_MS: u64 = 60_000;

/// Width of the `ticker` and `client` NCHAR columns, in characters.
pub const MAX_LABEL_CHARS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceField {
    Open,
    High,
    Low,
    Close,
}

/// A price is `uniform[0, base_max) + randint[mult_min, mult_max] * modifier`,
/// where `modifier` is drawn once per batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PriceRange {
    pub base_max: f64,
    pub mult_min: u32,
    pub mult_max: u32,
}

impl PriceRange {
    pub const fn new(base_max: f64, mult_min: u32, mult_max: u32) -> Self {
        Self {
            base_max,
            mult_min,
            mult_max,
        }
    }

    fn validate(&self, name: &str) -> Result<(), String> {
        if !self.base_max.is_finite() || self.base_max <= 0.0 {
            return Err(format!(
                "{name}.base_max must be a positive finite number (got {})",
                self.base_max
            ));
        }
        if self.mult_min > self.mult_max {
            return Err(format!(
                "{name}.mult_min ({}) must be <= {name}.mult_max ({})",
                self.mult_min, self.mult_max
            ));
        }
        Ok(())
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R, modifier: f64) -> f64 {
        let base = rng.gen_range(0.0..self.base_max);
        let mult = rng.gen_range(self.mult_min..=self.mult_max);
        base + f64::from(mult) * modifier
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    pub rows_per_batch: usize,
    pub symbols: Vec<String>,
    pub clients: Vec<String>,
    pub modifier_min: u32,
    pub modifier_max: u32,
    pub open: PriceRange,
    pub high: PriceRange,
    pub low: PriceRange,
    pub close: PriceRange,
    pub volume_min: u32,
    pub volume_max: u32,
    /// Record `i` of a batch is stamped `now + i * row_spacing_ms`. TDengine
    /// keeps one row per timestamp, so `0` collapses a batch to a single row.
    pub row_spacing_ms: u64,
    /// Spread record timestamps uniformly over `now ± jitter`.
    pub timestamp_jitter_ms: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            rows_per_batch: 250,
            symbols: DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect(),
            clients: DEFAULT_CLIENTS.iter().map(|s| s.to_string()).collect(),
            modifier_min: 1,
            modifier_max: 50,
            open: PriceRange::new(75.0, 0, 9),
            high: PriceRange::new(105.0, 1, 3),
            low: PriceRange::new(85.0, 1, 3),
            close: PriceRange::new(90.0, 1, 3),
            volume_min: 10_000,
            volume_max: 100_000,
            row_spacing_ms: 1,
            timestamp_jitter_ms: None,
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.rows_per_batch == 0 {
            return Err("rows_per_batch must be > 0".to_string());
        }
        if self.symbols.is_empty() {
            return Err("symbols must not be empty".to_string());
        }
        if self.clients.is_empty() {
            return Err("clients must not be empty".to_string());
        }
        validate_labels("symbols", &self.symbols)?;
        validate_labels("clients", &self.clients)?;
        if self.modifier_min > self.modifier_max {
            return Err(format!(
                "modifier_min ({}) must be <= modifier_max ({})",
                self.modifier_min, self.modifier_max
            ));
        }
        if self.volume_min > self.volume_max {
            return Err(format!(
                "volume_min ({}) must be <= volume_max ({})",
                self.volume_min, self.volume_max
            ));
        }
        if self.row_spacing_ms > MAX_ROW_SPACING_MS {
            return Err(format!(
                "row_spacing_ms ({}) must be <= {MAX_ROW_SPACING_MS}",
                self.row_spacing_ms
            ));
        }
        if let Some(jitter) = self.timestamp_jitter_ms {
            if jitter > MAX_TIMESTAMP_JITTER_MS {
                return Err(format!(
                    "timestamp_jitter_ms ({jitter}) must be <= {MAX_TIMESTAMP_JITTER_MS}"
                ));
            }
        }
        self.open.validate("open")?;
        self.high.validate("high")?;
        self.low.validate("low")?;
        self.close.validate("close")?;
        Ok(())
    }

    pub fn price_range(&self, field: PriceField) -> &PriceRange {
        match field {
            PriceField::Open => &self.open,
            PriceField::High => &self.high,
            PriceField::Low => &self.low,
            PriceField::Close => &self.close,
        }
    }
}

/// Stateless batch generator. Each call draws a fresh batch modifier.
#[derive(Debug, Clone)]
pub struct TickGenerator {
    config: GeneratorConfig,
}

impl TickGenerator {
    pub fn new(config: GeneratorConfig) -> Result<Self, String> {
        config
            .validate()
            .map_err(|err| format!("invalid generator config: {err}"))?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn rows_per_batch(&self) -> usize {
        self.config.rows_per_batch
    }

    /// Largest value `field` can take for any batch modifier.
    pub fn price_upper_bound(&self, field: PriceField) -> f64 {
        let range = self.config.price_range(field);
        range.base_max + f64::from(range.mult_max) * f64::from(self.config.modifier_max)
    }

    pub fn generate_batch(&self) -> Vec<TickRecord> {
        let mut rng = rand::thread_rng();
        self.generate_batch_with(&mut rng, Utc::now())
    }

    pub fn generate_batch_with<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Vec<TickRecord> {
        let cfg = &self.config;
        let modifier =
            rng.gen::<f64>() * f64::from(rng.gen_range(cfg.modifier_min..=cfg.modifier_max));

        let spacing = i64::try_from(cfg.row_spacing_ms).unwrap_or(i64::MAX);
        let mut batch = Vec::with_capacity(cfg.rows_per_batch);
        for row in 0..cfg.rows_per_batch {
            let offset = i64::try_from(row).unwrap_or(i64::MAX).saturating_mul(spacing);
            let stamped = now + Duration::milliseconds(offset);
            let timestamp = match cfg.timestamp_jitter_ms {
                Some(jitter) if jitter > 0 => {
                    let jitter = i64::try_from(jitter).unwrap_or(i64::MAX);
                    stamped + Duration::milliseconds(rng.gen_range(-jitter..=jitter))
                }
                _ => stamped,
            };
            batch.push(TickRecord {
                timestamp,
                ticker: pick(rng, &cfg.symbols),
                client: pick(rng, &cfg.clients),
                open: cfg.open.sample(rng, modifier),
                high: cfg.high.sample(rng, modifier),
                low: cfg.low.sample(rng, modifier),
                close: cfg.close.sample(rng, modifier),
                volume: rng.gen_range(cfg.volume_min..=cfg.volume_max),
                date: now.date_naive(),
            });
        }
        batch
    }
}

fn validate_labels(name: &str, values: &[String]) -> Result<(), String> {
    for value in values {
        if value.trim().is_empty() {
            return Err(format!("{name} must not contain blank entries"));
        }
        if value.chars().count() > MAX_LABEL_CHARS {
            return Err(format!(
                "{name} entry '{value}' exceeds {MAX_LABEL_CHARS} characters"
            ));
        }
    }
    Ok(())
}

fn pick<R: Rng + ?Sized>(rng: &mut R, values: &[String]) -> String {
    values.choose(rng).cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 14, 30, 0).unwrap()
    }

    #[test]
    fn default_config_is_valid() {
        assert!(GeneratorConfig::default().validate().is_ok());
    }

    #[test]
    fn batch_has_configured_row_count() {
        let generator = TickGenerator::new(GeneratorConfig {
            rows_per_batch: 17,
            ..GeneratorConfig::default()
        })
        .unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(generator.generate_batch_with(&mut rng, fixed_now()).len(), 17);
        assert_eq!(generator.generate_batch().len(), 17);
    }

    #[test]
    fn records_are_spaced_one_millisecond_apart_by_default() {
        let generator = TickGenerator::new(GeneratorConfig::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let now = fixed_now();
        let batch = generator.generate_batch_with(&mut rng, now);
        for (idx, record) in batch.iter().enumerate() {
            assert_eq!(record.timestamp, now + Duration::milliseconds(idx as i64));
            assert_eq!(record.date, now.date_naive());
        }
        let mut keys: Vec<i64> = batch.iter().map(|r| r.timestamp.timestamp_millis()).collect();
        keys.dedup();
        assert_eq!(keys.len(), batch.len());
    }

    #[test]
    fn zero_spacing_stamps_every_record_with_now() {
        let generator = TickGenerator::new(GeneratorConfig {
            row_spacing_ms: 0,
            ..GeneratorConfig::default()
        })
        .unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let now = fixed_now();
        for record in generator.generate_batch_with(&mut rng, now) {
            assert_eq!(record.timestamp, now);
        }
    }

    #[test]
    fn jitter_keeps_timestamps_within_window() {
        let generator = TickGenerator::new(GeneratorConfig {
            row_spacing_ms: 0,
            timestamp_jitter_ms: Some(5_000),
            ..GeneratorConfig::default()
        })
        .unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let now = fixed_now();
        let window = Duration::milliseconds(5_000);
        for record in generator.generate_batch_with(&mut rng, now) {
            assert!(record.timestamp >= now - window);
            assert!(record.timestamp <= now + window);
        }
    }

    #[test]
    fn upper_bound_accounts_for_multiplier_and_modifier() {
        let generator = TickGenerator::new(GeneratorConfig::default()).unwrap();
        assert_eq!(generator.price_upper_bound(PriceField::Open), 75.0 + 9.0 * 50.0);
        assert_eq!(generator.price_upper_bound(PriceField::High), 105.0 + 3.0 * 50.0);
    }

    #[test]
    fn new_rejects_invalid_ranges() {
        let err = TickGenerator::new(GeneratorConfig {
            rows_per_batch: 0,
            ..GeneratorConfig::default()
        })
        .unwrap_err();
        assert!(err.contains("rows_per_batch"));

        let err = TickGenerator::new(GeneratorConfig {
            symbols: Vec::new(),
            ..GeneratorConfig::default()
        })
        .unwrap_err();
        assert!(err.contains("symbols"));

        let err = TickGenerator::new(GeneratorConfig {
            volume_min: 10,
            volume_max: 5,
            ..GeneratorConfig::default()
        })
        .unwrap_err();
        assert!(err.contains("volume_min"));

        let err = TickGenerator::new(GeneratorConfig {
            close: PriceRange::new(0.0, 1, 3),
            ..GeneratorConfig::default()
        })
        .unwrap_err();
        assert!(err.contains("close.base_max"));
    }

    #[test]
    fn new_rejects_labels_wider_than_the_nchar_columns() {
        let err = TickGenerator::new(GeneratorConfig {
            symbols: vec!["AAPL.N".to_string(), "BERKSHIRE.HATHAWAY".to_string()],
            ..GeneratorConfig::default()
        })
        .unwrap_err();
        assert!(err.contains("BERKSHIRE.HATHAWAY"));

        let err = TickGenerator::new(GeneratorConfig {
            clients: vec![String::new()],
            ..GeneratorConfig::default()
        })
        .unwrap_err();
        assert!(err.contains("clients"));

        // Ten characters fit, counted as chars rather than bytes.
        assert!(TickGenerator::new(GeneratorConfig {
            clients: vec!["Krusty".to_string(), "Ñandú.Bolí".to_string()],
            ..GeneratorConfig::default()
        })
        .is_ok());
    }

    #[test]
    fn new_rejects_oversized_row_spacing() {
        let err = TickGenerator::new(GeneratorConfig {
            row_spacing_ms: MAX_ROW_SPACING_MS + 1,
            ..GeneratorConfig::default()
        })
        .unwrap_err();
        assert!(err.contains("row_spacing_ms"));
    }
}
