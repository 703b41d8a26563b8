//! Configuration types for latency-scalper

use crate::latency::{BandError, BandTable, LatencyBand};
use crate::telemetry::LogFormat;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Built-in configuration, identical to `config.toml.example`
const BUILTIN_CONFIG: &str = include_str!("../config.toml.example");

/// Environment variable overriding the telemetry sink URL
pub const SINK_URL_ENV: &str = "SCALPER_SINK_URL";
/// Environment variable overriding the telemetry sink API key
pub const SINK_API_KEY_ENV: &str = "SCALPER_SINK_API_KEY";

/// Startup configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no venues configured")]
    NoVenues,
    #[error("no symbols configured")]
    NoSymbols,
    #[error("duplicate venue name: {0}")]
    DuplicateVenue(String),
    #[error("invalid band table: {0}")]
    Bands(#[from] BandError),
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        field: &'static str,
        reason: &'static str,
    },
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid TOML in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    /// True when the configuration file does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, ConfigError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub momentum: MomentumConfig,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default = "default_venues")]
    pub venues: Vec<VenueConfig>,
    #[serde(default = "default_bands")]
    pub bands: Vec<LatencyBand>,
}

/// Decision sweep configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Symbols evaluated on every venue
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,

    /// Pause between decision sweeps (milliseconds)
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,

    /// Simulated holding period (seconds)
    #[serde(default = "default_hold_secs")]
    pub hold_secs: u64,

    /// Hard time stop for any position (seconds)
    #[serde(default = "default_time_stop_secs")]
    pub time_stop_secs: u64,

    /// Simulated exit move as a fraction of entry (0.002 = 0.2%)
    #[serde(default = "default_exit_move")]
    pub exit_move: Decimal,

    /// Quote fetch timeout (milliseconds)
    #[serde(default = "default_quote_timeout_ms")]
    pub quote_timeout_ms: u64,

    /// Number of completed trades kept for display
    #[serde(default = "default_recent_trades")]
    pub recent_trades: usize,

    /// Interval of the status report loop (seconds)
    #[serde(default = "default_status_interval_secs")]
    pub status_interval_secs: u64,
}

fn default_symbols() -> Vec<String> {
    ["BTCUSDT", "ETHUSDT", "SOLUSDT", "BNBUSDT"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_sweep_interval_ms() -> u64 {
    1000
}
fn default_hold_secs() -> u64 {
    2
}
fn default_time_stop_secs() -> u64 {
    180
}
fn default_exit_move() -> Decimal {
    Decimal::new(2, 3) // 0.002 = 0.2%
}
fn default_quote_timeout_ms() -> u64 {
    3000
}
fn default_recent_trades() -> usize {
    50
}
fn default_status_interval_secs() -> u64 {
    5
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            symbols: default_symbols(),
            sweep_interval_ms: default_sweep_interval_ms(),
            hold_secs: default_hold_secs(),
            time_stop_secs: default_time_stop_secs(),
            exit_move: default_exit_move(),
            quote_timeout_ms: default_quote_timeout_ms(),
            recent_trades: default_recent_trades(),
            status_interval_secs: default_status_interval_secs(),
        }
    }
}

impl EngineConfig {
    /// Holding period actually used by the paper fill, capped by the time stop
    pub fn hold_duration(&self) -> Duration {
        Duration::from_secs(self.hold_secs.min(self.time_stop_secs))
    }
}

/// Latency monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Pause between latency sweeps (milliseconds)
    #[serde(default = "default_monitor_interval_ms")]
    pub interval_ms: u64,

    /// Rolling history length per venue
    #[serde(default = "default_history_len")]
    pub history_len: usize,

    /// Latency recorded when a ping fails (milliseconds)
    #[serde(default = "default_penalty_ms")]
    pub penalty_ms: f64,

    /// Ping request timeout (milliseconds)
    #[serde(default = "default_ping_timeout_ms")]
    pub ping_timeout_ms: u64,
}

fn default_monitor_interval_ms() -> u64 {
    1000
}
fn default_history_len() -> usize {
    200
}
fn default_penalty_ms() -> f64 {
    999.0
}
fn default_ping_timeout_ms() -> u64 {
    3000
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_monitor_interval_ms(),
            history_len: default_history_len(),
            penalty_ms: default_penalty_ms(),
            ping_timeout_ms: default_ping_timeout_ms(),
        }
    }
}

/// Momentum detection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MomentumConfig {
    /// Mid-prices kept per (venue, symbol)
    #[serde(default = "default_buffer_len")]
    pub buffer_len: usize,

    /// Samples required before a signal can fire
    #[serde(default = "default_min_samples")]
    pub min_samples: usize,

    /// Minimum absolute move in percent (0.01 = 0.01%)
    #[serde(default = "default_epsilon_pct")]
    pub epsilon_pct: Decimal,
}

fn default_buffer_len() -> usize {
    10
}
fn default_min_samples() -> usize {
    5
}
fn default_epsilon_pct() -> Decimal {
    Decimal::new(1, 2) // 0.01%
}

impl Default for MomentumConfig {
    fn default() -> Self {
        Self {
            buffer_len: default_buffer_len(),
            min_samples: default_min_samples(),
            epsilon_pct: default_epsilon_pct(),
        }
    }
}

/// Daily risk limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Trading halts once daily loss reaches this amount (USD)
    #[serde(default = "default_max_daily_loss")]
    pub max_daily_loss_usd: Decimal,

    /// Trading halts once this many trades were made today
    #[serde(default = "default_max_trades")]
    pub max_trades_per_day: u32,

    /// Lowest throttle factor under drawdown
    #[serde(default = "default_throttle_floor")]
    pub throttle_floor: Decimal,

    /// How fast the throttle factor falls with drawdown
    #[serde(default = "default_drawdown_sensitivity")]
    pub drawdown_sensitivity: Decimal,
}

fn default_max_daily_loss() -> Decimal {
    Decimal::new(50, 0)
}
fn default_max_trades() -> u32 {
    250
}
fn default_throttle_floor() -> Decimal {
    Decimal::new(4, 1) // 0.4
}
fn default_drawdown_sensitivity() -> Decimal {
    Decimal::new(6, 1) // 0.6
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_daily_loss_usd: default_max_daily_loss(),
            max_trades_per_day: default_max_trades(),
            throttle_floor: default_throttle_floor(),
            drawdown_sensitivity: default_drawdown_sensitivity(),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
    /// Prometheus exporter port; disabled when absent
    #[serde(default)]
    pub metrics_port: Option<u16>,
    #[serde(default)]
    pub delivery: DeliveryConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::Pretty,
            metrics_port: None,
            delivery: DeliveryConfig::default(),
        }
    }
}

/// Remote telemetry delivery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Base URL of the telemetry store
    #[serde(default)]
    pub sink_url: Option<String>,

    /// API key of the telemetry store
    #[serde(default)]
    pub sink_api_key: Option<String>,

    /// Depth of each event queue
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Maximum rows per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Pause between drains (milliseconds)
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,

    /// Delivery attempts per batch before it is dropped
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// First retry delay (milliseconds)
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Retry delay ceiling (milliseconds)
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Timeout of a single POST (milliseconds)
    #[serde(default = "default_post_timeout_ms")]
    pub post_timeout_ms: u64,

    /// Upper bound on the final flush at shutdown (milliseconds)
    #[serde(default = "default_flush_timeout_ms")]
    pub flush_timeout_ms: u64,
}

fn default_queue_capacity() -> usize {
    1000
}
fn default_batch_size() -> usize {
    200
}
fn default_flush_interval_ms() -> u64 {
    1000
}
fn default_max_attempts() -> u32 {
    5
}
fn default_initial_backoff_ms() -> u64 {
    500
}
fn default_max_backoff_ms() -> u64 {
    5000
}
fn default_post_timeout_ms() -> u64 {
    10_000
}
fn default_flush_timeout_ms() -> u64 {
    5000
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            sink_url: None,
            sink_api_key: None,
            queue_capacity: default_queue_capacity(),
            batch_size: default_batch_size(),
            flush_interval_ms: default_flush_interval_ms(),
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            post_timeout_ms: default_post_timeout_ms(),
            flush_timeout_ms: default_flush_timeout_ms(),
        }
    }
}

impl DeliveryConfig {
    /// Delivery is enabled only when both URL and key are present and non-empty
    pub fn is_enabled(&self) -> bool {
        matches!(
            (&self.sink_url, &self.sink_api_key),
            (Some(url), Some(key)) if !url.trim().is_empty() && !key.trim().is_empty()
        )
    }
}

/// Quote API flavour of a venue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VenueKind {
    Binance,
    Okx,
}

/// A venue to monitor and trade on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueConfig {
    pub name: String,
    pub kind: VenueKind,
    /// Lightweight endpoint used for latency measurement
    pub ping_url: String,
    /// Override of the quote API base URL
    #[serde(default)]
    pub quote_base_url: Option<String>,
    #[serde(default)]
    pub maker_fee: Decimal,
    #[serde(default)]
    pub taker_fee: Decimal,
}

fn default_venues() -> Vec<VenueConfig> {
    vec![
        VenueConfig {
            name: "BINANCE".to_string(),
            kind: VenueKind::Binance,
            ping_url: "https://api.binance.com/api/v3/time".to_string(),
            quote_base_url: None,
            maker_fee: Decimal::new(-1, 4),
            taker_fee: Decimal::new(4, 4),
        },
        VenueConfig {
            name: "OKX".to_string(),
            kind: VenueKind::Okx,
            ping_url: "https://www.okx.com/api/v5/public/time".to_string(),
            quote_base_url: None,
            maker_fee: Decimal::new(-1, 4),
            taker_fee: Decimal::new(5, 4),
        },
    ]
}

fn default_bands() -> Vec<LatencyBand> {
    BandTable::default().into_bands()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            monitor: MonitorConfig::default(),
            momentum: MomentumConfig::default(),
            risk: RiskConfig::default(),
            telemetry: TelemetryConfig::default(),
            venues: default_venues(),
            bands: default_bands(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The configuration shipped as `config.toml.example`
    pub fn builtin() -> Result<Self, ConfigError> {
        toml::from_str(BUILTIN_CONFIG).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("config.toml.example"),
            source,
        })
    }

    /// Override sink credentials from the environment when set
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(SINK_URL_ENV) {
            self.telemetry.delivery.sink_url = Some(url.trim_end_matches('/').to_string());
        }
        if let Ok(key) = std::env::var(SINK_API_KEY_ENV) {
            self.telemetry.delivery.sink_api_key = Some(key);
        }
    }

    /// Build the validated band table
    pub fn band_table(&self) -> Result<BandTable, ConfigError> {
        Ok(BandTable::new(self.bands.clone())?)
    }

    /// Reject configurations the scheduler cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.venues.is_empty() {
            return Err(ConfigError::NoVenues);
        }
        if self.engine.symbols.is_empty() {
            return Err(ConfigError::NoSymbols);
        }

        let mut names = HashSet::new();
        for venue in &self.venues {
            if !names.insert(venue.name.as_str()) {
                return Err(ConfigError::DuplicateVenue(venue.name.clone()));
            }
        }

        self.band_table()?;

        if self.monitor.history_len == 0 {
            return Err(ConfigError::InvalidValue {
                field: "monitor.history_len",
                reason: "must be at least 1",
            });
        }
        if self.momentum.min_samples < 2 || self.momentum.buffer_len < self.momentum.min_samples {
            return Err(ConfigError::InvalidValue {
                field: "momentum.buffer_len",
                reason: "must hold at least min_samples (>= 2) prices",
            });
        }
        if self.risk.max_daily_loss_usd <= Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                field: "risk.max_daily_loss_usd",
                reason: "must be positive",
            });
        }
        if self.risk.throttle_floor <= Decimal::ZERO || self.risk.throttle_floor > Decimal::ONE {
            return Err(ConfigError::InvalidValue {
                field: "risk.throttle_floor",
                reason: "must be in (0, 1]",
            });
        }
        if self.risk.drawdown_sensitivity < Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                field: "risk.drawdown_sensitivity",
                reason: "must not be negative",
            });
        }

        let intervals = [
            ("engine.sweep_interval_ms", self.engine.sweep_interval_ms),
            ("engine.status_interval_secs", self.engine.status_interval_secs),
            ("monitor.interval_ms", self.monitor.interval_ms),
            ("telemetry.delivery.flush_interval_ms", self.telemetry.delivery.flush_interval_ms),
        ];
        for (field, value) in intervals {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "must be greater than zero",
                });
            }
        }
        let delivery = &self.telemetry.delivery;
        if delivery.queue_capacity == 0 || delivery.batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "telemetry.delivery",
                reason: "queue_capacity and batch_size must be at least 1",
            });
        }
        if delivery.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "telemetry.delivery.max_attempts",
                reason: "must be at least 1",
            });
        }

        Ok(())
    }
}
