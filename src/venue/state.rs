//! Shared per-venue state

use super::{QuoteSource, VenueSnapshot};
use crate::config::VenueConfig;
use crate::latency::{BandTable, LatencyBand, LatencyHistory};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Latency aggregate guarded as one unit
#[derive(Debug)]
struct LatencyState {
    history: LatencyHistory,
    band: LatencyBand,
}

/// A venue: immutable identity plus its rolling latency state
///
/// Latency history, derived statistics and band are only ever updated
/// together under one write lock, so readers never observe a band that
/// disagrees with the history it was derived from.
pub struct Venue {
    name: String,
    ping_url: String,
    maker_fee: Decimal,
    taker_fee: Decimal,
    quotes: Arc<dyn QuoteSource>,
    latency: RwLock<LatencyState>,
}

impl Venue {
    /// Create a venue that starts in the table's catch-all band
    pub fn new(
        config: &VenueConfig,
        quotes: Arc<dyn QuoteSource>,
        history_len: usize,
        bands: &BandTable,
    ) -> Self {
        Self {
            name: config.name.clone(),
            ping_url: config.ping_url.clone(),
            maker_fee: config.maker_fee,
            taker_fee: config.taker_fee,
            quotes,
            latency: RwLock::new(LatencyState {
                history: LatencyHistory::new(history_len),
                band: bands.catch_all().clone(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ping_url(&self) -> &str {
        &self.ping_url
    }

    pub fn quotes(&self) -> &dyn QuoteSource {
        self.quotes.as_ref()
    }

    /// Record a latency sample and reselect the band; returns the new average
    pub async fn record_latency(&self, latency_ms: f64, bands: &BandTable) -> f64 {
        let mut state = self.latency.write().await;
        state.history.push(latency_ms);
        let avg = state.history.average().unwrap_or(latency_ms);
        let band = bands.select(avg);
        if band.name != state.band.name {
            tracing::info!(
                venue = %self.name,
                from = %state.band.name,
                to = %band.name,
                avg_ms = avg,
                "Latency band changed"
            );
            state.band = band.clone();
        }
        avg
    }

    /// Current band
    pub async fn band(&self) -> LatencyBand {
        self.latency.read().await.band.clone()
    }

    pub async fn snapshot(&self) -> VenueSnapshot {
        let state = self.latency.read().await;
        VenueSnapshot {
            name: self.name.clone(),
            last_ms: state.history.last(),
            avg_ms: state.history.average(),
            max_ms: state.history.max(),
            samples: state.history.len(),
            band: state.band.clone(),
            maker_fee: self.maker_fee,
            taker_fee: self.taker_fee,
        }
    }
}

impl std::fmt::Debug for Venue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Venue")
            .field("name", &self.name)
            .field("ping_url", &self.ping_url)
            .finish_non_exhaustive()
    }
}
