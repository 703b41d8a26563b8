//! Configuration loading tests

use latency_scalper::config::{Config, ConfigError};
use latency_scalper::latency::BandError;
use latency_scalper::telemetry::LogFormat;
use rust_decimal_macros::dec;
use std::io::Write;
use tokio_test::{assert_err, assert_ok};

const EXAMPLE: &str = include_str!("../../config.toml.example");

#[test]
fn test_example_config_matches_defaults() {
    let config: Config = toml::from_str(EXAMPLE).unwrap();
    let defaults = Config::default();

    assert_eq!(config.engine.symbols, defaults.engine.symbols);
    assert_eq!(config.engine.exit_move, defaults.engine.exit_move);
    assert_eq!(config.monitor.penalty_ms, defaults.monitor.penalty_ms);
    assert_eq!(config.momentum.epsilon_pct, defaults.momentum.epsilon_pct);
    assert_eq!(config.risk.max_daily_loss_usd, dec!(50));
    assert_eq!(config.risk.max_trades_per_day, 250);
    assert_eq!(config.telemetry.log_format, LogFormat::Pretty);
    assert_eq!(config.telemetry.delivery.max_attempts, 5);
    assert!(!config.telemetry.delivery.is_enabled());
    assert_eq!(config.bands, defaults.bands);
    assert_eq!(config.venues.len(), 2);
    assert_ok!(config.validate());
}

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
        [engine]
        symbols = ["ETHUSDT"]

        [telemetry.delivery]
        sink_url = "https://example.supabase.co"
        sink_api_key = "anon"
        "#
    )
    .unwrap();

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.engine.symbols, vec!["ETHUSDT".to_string()]);
    assert!(config.telemetry.delivery.is_enabled());
    // Untouched sections keep their defaults
    assert_eq!(config.monitor.history_len, 200);
    assert_eq!(config.bands.len(), 4);
}

#[test]
fn test_load_missing_file_fails() {
    assert_err!(Config::load("/nonexistent/latency-scalper.toml"));
}

#[test]
fn test_load_invalid_toml_fails() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[engine\nsymbols = 3").unwrap();
    assert_err!(Config::load(file.path()));
}

#[test]
fn test_invalid_band_table_rejected() {
    let config: Config = toml::from_str(
        r#"
        [[bands]]
        name = "slow"
        max_ms = 100.0
        min_spread_pct = 0.1
        size_usd = 100
        throttle = 0.5

        [[bands]]
        name = "fast"
        max_ms = 50.0
        min_spread_pct = 0.1
        size_usd = 100
        throttle = 0.5
        "#,
    )
    .unwrap();

    assert!(matches!(
        config.validate(),
        Err(ConfigError::Bands(BandError::NotAscending(_)))
    ));
}

#[test]
fn test_empty_symbols_rejected() {
    let config: Config = toml::from_str("[engine]\nsymbols = []").unwrap();
    assert!(matches!(config.validate(), Err(ConfigError::NoSymbols)));
}
