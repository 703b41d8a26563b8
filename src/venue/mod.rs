//! Venue module
//!
//! Venue identity and latency state, per-venue quote sources and the
//! latency probe used by the monitor.

mod binance;
mod okx;
mod probe;
mod state;
mod types;

pub use binance::{BinanceQuotes, BINANCE_API_URL};
pub use okx::{OkxQuotes, OKX_API_URL};
pub use probe::{HttpProbe, LatencyProbe};
pub use state::Venue;
pub use types::{Quote, VenueError, VenueSnapshot};

use crate::config::{VenueConfig, VenueKind};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Trait for venue-specific best bid/ask sources
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Fetch the current best bid and ask for a symbol
    async fn best_bid_ask(&self, symbol: &str) -> Result<Quote, VenueError>;
}

/// Build the REST quote source matching a venue's kind
pub fn quote_source(config: &VenueConfig, client: Client, timeout: Duration) -> Arc<dyn QuoteSource> {
    let base_url = config.quote_base_url.clone();
    match config.kind {
        VenueKind::Binance => Arc::new(BinanceQuotes::new(client, base_url, timeout)),
        VenueKind::Okx => Arc::new(OkxQuotes::new(client, base_url, timeout)),
    }
}
