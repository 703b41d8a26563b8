//! OKX REST quote source

use super::{Quote, QuoteSource, VenueError};
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

/// OKX REST base URL
pub const OKX_API_URL: &str = "https://www.okx.com";

/// Quote assets recognised when converting symbols to OKX instrument ids
const QUOTE_ASSETS: [&str; 3] = ["USDT", "USDC", "USD"];

#[derive(Debug, Deserialize)]
struct TickerResponse {
    #[serde(default)]
    data: Vec<TickerData>,
}

#[derive(Debug, Deserialize)]
struct TickerData {
    #[serde(rename = "bidPx")]
    bid_px: Option<String>,
    #[serde(rename = "askPx")]
    ask_px: Option<String>,
}

/// Best bid/ask from `/api/v5/market/ticker`
pub struct OkxQuotes {
    base_url: String,
    client: Client,
    timeout: Duration,
}

impl OkxQuotes {
    pub fn new(client: Client, base_url: Option<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.unwrap_or_else(|| OKX_API_URL.to_string()),
            client,
            timeout,
        }
    }

    fn ticker_url(&self) -> String {
        format!("{}/api/v5/market/ticker", self.base_url.trim_end_matches('/'))
    }

    /// Convert `BTCUSDT` into `BTC-USDT`
    fn instrument_id(symbol: &str) -> String {
        if symbol.contains('-') {
            return symbol.to_string();
        }
        QUOTE_ASSETS
            .iter()
            .find_map(|quote| {
                symbol
                    .strip_suffix(quote)
                    .filter(|base| !base.is_empty())
                    .map(|base| format!("{base}-{quote}"))
            })
            .unwrap_or_else(|| symbol.to_string())
    }

    fn parse_ticker(body: &str) -> Result<Quote, VenueError> {
        let response: TickerResponse =
            serde_json::from_str(body).map_err(|e| VenueError::Malformed(e.to_string()))?;
        let data = response
            .data
            .into_iter()
            .next()
            .ok_or_else(|| VenueError::Malformed("empty data array".to_string()))?;

        let parse = |field: &str, value: Option<String>| {
            let value = value.ok_or_else(|| VenueError::Malformed(format!("missing {field}")))?;
            Decimal::from_str(&value).map_err(|e| VenueError::Malformed(format!("{field}: {e}")))
        };

        let bid = parse("bidPx", data.bid_px)?;
        let ask = parse("askPx", data.ask_px)?;
        Ok(Quote::new(bid, ask))
    }
}

#[async_trait]
impl QuoteSource for OkxQuotes {
    async fn best_bid_ask(&self, symbol: &str) -> Result<Quote, VenueError> {
        let inst_id = Self::instrument_id(symbol);
        let response = self
            .client
            .get(self.ticker_url())
            .query(&[("instId", inst_id.as_str())])
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(VenueError::Status(response.status().as_u16()));
        }

        let body = response.text().await?;
        Self::parse_ticker(&body)
    }
}
