use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tickforge_domain::services::columns::TickColumns;
use tickforge_domain::services::generator::{GeneratorConfig, PriceField, TickGenerator};

const FIELDS: [PriceField; 4] = [
    PriceField::Open,
    PriceField::High,
    PriceField::Low,
    PriceField::Close,
];

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    #[test]
    fn generated_fields_stay_within_configured_ranges(seed in any::<u64>(), rows in 1usize..400) {
        let generator = TickGenerator::new(GeneratorConfig {
            rows_per_batch: rows,
            ..GeneratorConfig::default()
        }).expect("default ranges are valid");
        let cfg = generator.config().clone();
        let mut rng = StdRng::seed_from_u64(seed);
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 9, 30, 0).unwrap();

        let batch = generator.generate_batch_with(&mut rng, now);
        prop_assert_eq!(batch.len(), rows);

        for record in &batch {
            for (field, value) in FIELDS.iter().zip(record.prices()) {
                prop_assert!(value.is_finite());
                prop_assert!(value >= 0.0);
                prop_assert!(value <= generator.price_upper_bound(*field));
            }
            prop_assert!(record.volume >= cfg.volume_min && record.volume <= cfg.volume_max);
            prop_assert!(cfg.symbols.contains(&record.ticker));
            prop_assert!(cfg.clients.contains(&record.client));
        }
    }

    #[test]
    fn custom_enumerations_are_respected(
        seed in any::<u64>(),
        symbols in prop::collection::vec("[A-Z]{1,5}\\.N", 1..6),
        clients in prop::collection::vec("[a-z]{1,8}", 1..6),
    ) {
        let generator = TickGenerator::new(GeneratorConfig {
            rows_per_batch: 32,
            symbols: symbols.clone(),
            clients: clients.clone(),
            ..GeneratorConfig::default()
        }).expect("valid config");
        let mut rng = StdRng::seed_from_u64(seed);
        let batch = generator.generate_batch_with(&mut rng, Utc::now());
        for record in batch {
            prop_assert!(symbols.contains(&record.ticker));
            prop_assert!(clients.contains(&record.client));
        }
    }

    #[test]
    fn columns_match_batch_length(seed in any::<u64>(), rows in 1usize..300) {
        let generator = TickGenerator::new(GeneratorConfig {
            rows_per_batch: rows,
            ..GeneratorConfig::default()
        }).expect("valid config");
        let mut rng = StdRng::seed_from_u64(seed);
        let batch = generator.generate_batch_with(&mut rng, Utc::now());
        let cols = TickColumns::from_records(&batch);
        prop_assert_eq!(cols.len(), rows);
        prop_assert_eq!(cols.tickers.len(), rows);
        prop_assert_eq!(cols.dates_ms.len(), rows);
        prop_assert!(cols.opens.iter().chain(&cols.closes).all(|p| *p >= 0.0));
    }
}
