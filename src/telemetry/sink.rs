//! Remote telemetry sinks

use super::{DeliveryError, Table};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Append-only batched write endpoint
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    /// Write one batch of homogeneous rows (a JSON array) to `table`
    async fn post(&self, table: Table, rows: &serde_json::Value) -> Result<(), DeliveryError>;
}

/// REST sink: `POST {base_url}/rest/v1/{table}` with key headers
pub struct RestSink {
    base_url: String,
    api_key: String,
    client: Client,
    timeout: Duration,
}

impl RestSink {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client,
            timeout,
        }
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}/rest/v1/{}", self.base_url.trim_end_matches('/'), table)
    }
}

#[async_trait]
impl TelemetrySink for RestSink {
    async fn post(&self, table: Table, rows: &serde_json::Value) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(self.table_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=minimal")
            .timeout(self.timeout)
            .json(rows)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DeliveryError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}
