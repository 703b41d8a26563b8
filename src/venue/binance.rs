//! Binance REST quote source

use super::{Quote, QuoteSource, VenueError};
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

/// Binance REST base URL
pub const BINANCE_API_URL: &str = "https://api.binance.com";

/// Binance book ticker response
#[derive(Debug, Deserialize)]
struct BookTicker {
    #[serde(rename = "bidPrice")]
    bid_price: String,
    #[serde(rename = "askPrice")]
    ask_price: String,
}

/// Best bid/ask from `/api/v3/ticker/bookTicker`
pub struct BinanceQuotes {
    base_url: String,
    client: Client,
    timeout: Duration,
}

impl BinanceQuotes {
    pub fn new(client: Client, base_url: Option<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.unwrap_or_else(|| BINANCE_API_URL.to_string()),
            client,
            timeout,
        }
    }

    fn ticker_url(&self) -> String {
        format!("{}/api/v3/ticker/bookTicker", self.base_url.trim_end_matches('/'))
    }

    /// Parse a book ticker body into a quote
    fn parse_book_ticker(body: &str) -> Result<Quote, VenueError> {
        let ticker: BookTicker =
            serde_json::from_str(body).map_err(|e| VenueError::Malformed(e.to_string()))?;
        let bid = Decimal::from_str(&ticker.bid_price)
            .map_err(|e| VenueError::Malformed(format!("bidPrice: {e}")))?;
        let ask = Decimal::from_str(&ticker.ask_price)
            .map_err(|e| VenueError::Malformed(format!("askPrice: {e}")))?;
        Ok(Quote::new(bid, ask))
    }
}

#[async_trait]
impl QuoteSource for BinanceQuotes {
    async fn best_bid_ask(&self, symbol: &str) -> Result<Quote, VenueError> {
        let response = self
            .client
            .get(self.ticker_url())
            .query(&[("symbol", symbol)])
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(VenueError::Status(response.status().as_u16()));
        }

        let body = response.text().await?;
        Self::parse_book_ticker(&body)
    }
}
