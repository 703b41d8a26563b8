//! Latency bands and band selection
//!
//! A band bundles the trading parameters allowed at a given venue
//! responsiveness. Faster venues trade larger size on thinner spreads.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Band table validation errors
#[derive(Debug, Error, PartialEq)]
pub enum BandError {
    #[error("band table is empty")]
    Empty,
    #[error("band {0} must set max_ms; only the last band is unbounded")]
    UnboundedBeforeLast(String),
    #[error("last band {0} must be unbounded (omit max_ms)")]
    BoundedLast(String),
    #[error("band {0} ceiling does not increase over the previous band")]
    NotAscending(String),
    #[error("band {0} throttle must be in (0, 1]")]
    InvalidThrottle(String),
    #[error("band {0} throttle increases with latency")]
    ThrottleIncreases(String),
    #[error("band {0} has a negative spread or size")]
    Negative(String),
}

/// One aggressiveness tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencyBand {
    pub name: String,
    /// Latency ceiling in milliseconds; `None` marks the catch-all band
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_ms: Option<f64>,
    /// Minimum bid/ask spread in percent required to trade
    pub min_spread_pct: Decimal,
    /// Trade size in quote currency
    pub size_usd: Decimal,
    /// Pacing and size multiplier in (0, 1]
    pub throttle: Decimal,
}

impl LatencyBand {
    pub fn new(
        name: impl Into<String>,
        max_ms: Option<f64>,
        min_spread_pct: Decimal,
        size_usd: Decimal,
        throttle: Decimal,
    ) -> Self {
        Self {
            name: name.into(),
            max_ms,
            min_spread_pct,
            size_usd,
            throttle,
        }
    }

    /// Ceiling used for selection
    pub fn ceiling(&self) -> f64 {
        self.max_ms.unwrap_or(f64::INFINITY)
    }

    /// Trade size after applying the band throttle
    pub fn throttled_size(&self) -> Decimal {
        self.size_usd * self.throttle
    }
}

/// Validated, ordered set of bands
#[derive(Debug, Clone, PartialEq)]
pub struct BandTable {
    bands: Vec<LatencyBand>,
}

impl BandTable {
    /// Validate and build a table
    ///
    /// Ceilings must be strictly ascending, the last band must be the
    /// unbounded catch-all and throttle must not increase with latency.
    pub fn new(bands: Vec<LatencyBand>) -> Result<Self, BandError> {
        let last_idx = bands.len().checked_sub(1).ok_or(BandError::Empty)?;

        let mut prev: Option<&LatencyBand> = None;
        for (idx, band) in bands.iter().enumerate() {
            match (idx == last_idx, band.max_ms) {
                (false, None) => return Err(BandError::UnboundedBeforeLast(band.name.clone())),
                (true, Some(_)) => return Err(BandError::BoundedLast(band.name.clone())),
                _ => {}
            }
            if band.throttle <= Decimal::ZERO || band.throttle > Decimal::ONE {
                return Err(BandError::InvalidThrottle(band.name.clone()));
            }
            if band.min_spread_pct < Decimal::ZERO || band.size_usd < Decimal::ZERO {
                return Err(BandError::Negative(band.name.clone()));
            }
            if let Some(prev) = prev {
                if band.ceiling() <= prev.ceiling() {
                    return Err(BandError::NotAscending(band.name.clone()));
                }
                if band.throttle > prev.throttle {
                    return Err(BandError::ThrottleIncreases(band.name.clone()));
                }
            }
            prev = Some(band);
        }

        Ok(Self { bands })
    }

    /// First band whose ceiling is at or above `avg_latency_ms`
    ///
    /// Falls back to the catch-all band, which also covers NaN input.
    pub fn select(&self, avg_latency_ms: f64) -> &LatencyBand {
        self.bands
            .iter()
            .find(|band| avg_latency_ms <= band.ceiling())
            .unwrap_or_else(|| self.catch_all())
    }

    /// The final, most defensive band
    pub fn catch_all(&self) -> &LatencyBand {
        // Construction guarantees at least one band
        &self.bands[self.bands.len() - 1]
    }

    pub fn bands(&self) -> &[LatencyBand] {
        &self.bands
    }

    pub fn into_bands(self) -> Vec<LatencyBand> {
        self.bands
    }
}

impl Default for BandTable {
    fn default() -> Self {
        Self {
            bands: vec![
                LatencyBand::new("aggressive", Some(40.0), dec!(0.03), dec!(600), dec!(1.0)),
                LatencyBand::new("normal", Some(70.0), dec!(0.05), dec!(550), dec!(0.9)),
                LatencyBand::new("cautious", Some(85.0), dec!(0.07), dec!(500), dec!(0.7)),
                LatencyBand::new("defensive", None, dec!(0.10), dec!(350), dec!(0.5)),
            ],
        }
    }
}
