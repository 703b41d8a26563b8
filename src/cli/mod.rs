//! CLI interface for latency-scalper
//!
//! Provides subcommands for:
//! - `run`: Start the scalper until Ctrl-C
//! - `probe`: Measure venue latency and show the selected bands
//! - `bands`: Show the latency band table
//! - `config`: Show the effective configuration

mod probe;
mod run;

pub use probe::ProbeArgs;
pub use run::RunArgs;

use crate::config::{Config, ConfigError};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Configuration file read when `--config` is not given
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Parser, Debug)]
#[command(name = "latency-scalper")]
#[command(about = "Latency-adaptive paper scalper with batched telemetry delivery")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file [default: config.toml]
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    pub fn load_config(&self) -> Result<Config, ConfigError> {
        load_config(self.config.as_deref(), Path::new(DEFAULT_CONFIG_PATH))
    }
}

/// Load the explicit path if given, else `default_path`
///
/// Only a missing default file falls back to the built-in configuration;
/// any other error is returned.
pub fn load_config(explicit: Option<&Path>, default_path: &Path) -> Result<Config, ConfigError> {
    if let Some(path) = explicit {
        return Config::load(path);
    }
    match Config::load(default_path) {
        Err(e) if e.is_not_found() => {
            eprintln!(
                "No config at {}, using the built-in configuration",
                default_path.display()
            );
            Config::builtin()
        }
        result => result,
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start paper trading
    Run(RunArgs),
    /// Measure venue latency and show the selected bands
    Probe(ProbeArgs),
    /// Show the latency band table
    Bands,
    /// Show the effective configuration
    Config,
}

/// Print the band table
pub fn print_bands(config: &Config) -> anyhow::Result<()> {
    let table = config.band_table()?;
    println!(
        "{:<12} {:>8} {:>10} {:>9} {:>9}",
        "Band", "MaxMs", "MinSpread%", "SizeUSD", "Throttle"
    );
    for band in table.bands() {
        let max_ms = band
            .max_ms
            .map_or_else(|| "-".to_string(), |ms| format!("{ms:.0}"));
        println!(
            "{:<12} {:>8} {:>10} {:>9} {:>9}",
            band.name, max_ms, band.min_spread_pct, band.size_usd, band.throttle
        );
    }
    Ok(())
}

/// Print the effective configuration as TOML, with the sink key masked
pub fn print_config(config: &Config) -> anyhow::Result<()> {
    let mut shown = config.clone();
    if shown.telemetry.delivery.sink_api_key.is_some() {
        shown.telemetry.delivery.sink_api_key = Some("********".to_string());
    }
    println!("{}", toml::to_string_pretty(&shown)?);
    Ok(())
}
