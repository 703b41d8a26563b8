//! Round-trip latency probes

use super::VenueError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};

/// Measures the round-trip time of one request to an endpoint
#[async_trait]
pub trait LatencyProbe: Send + Sync {
    /// Elapsed wall-clock time of a successful request
    async fn ping(&self, url: &str) -> Result<Duration, VenueError>;
}

/// HTTP GET probe; the response body is drained and ignored
pub struct HttpProbe {
    client: Client,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl LatencyProbe for HttpProbe {
    async fn ping(&self, url: &str) -> Result<Duration, VenueError> {
        let started = Instant::now();
        let response = self.client.get(url).timeout(self.timeout).send().await?;
        let status = response.status();
        response.bytes().await?;
        let elapsed = started.elapsed();

        if !status.is_success() {
            return Err(VenueError::Status(status.as_u16()));
        }
        Ok(elapsed)
    }
}
