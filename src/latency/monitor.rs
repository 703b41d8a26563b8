//! Venue latency monitor

use super::BandTable;
use crate::config::MonitorConfig;
use crate::shutdown::Shutdown;
use crate::telemetry::{record_venue_latency, LatencyEvent, TelemetryQueues};
use crate::venue::{LatencyProbe, Venue};
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;

/// Periodically pings every venue and keeps its latency band current
pub struct VenueLatencyMonitor {
    venues: Vec<Arc<Venue>>,
    bands: Arc<BandTable>,
    probe: Arc<dyn LatencyProbe>,
    telemetry: TelemetryQueues,
    penalty_ms: f64,
    interval: Duration,
}

impl VenueLatencyMonitor {
    pub fn new(
        venues: Vec<Arc<Venue>>,
        bands: Arc<BandTable>,
        probe: Arc<dyn LatencyProbe>,
        telemetry: TelemetryQueues,
        config: &MonitorConfig,
    ) -> Self {
        Self {
            venues,
            bands,
            probe,
            telemetry,
            penalty_ms: config.penalty_ms,
            interval: Duration::from_millis(config.interval_ms),
        }
    }

    pub fn venues(&self) -> &[Arc<Venue>] {
        &self.venues
    }

    /// Measure one venue and record the sample
    ///
    /// Any probe failure records the penalty latency instead. Never fails.
    pub async fn measure(&self, venue: &Venue) -> f64 {
        let latency_ms = match self.probe.ping(venue.ping_url()).await {
            Ok(elapsed) => elapsed.as_micros() as f64 / 1000.0,
            Err(e) => {
                tracing::warn!(
                    venue = %venue.name(),
                    error = %e,
                    penalty_ms = self.penalty_ms,
                    "Latency probe failed"
                );
                self.penalty_ms
            }
        };

        let avg_ms = venue.record_latency(latency_ms, &self.bands).await;
        record_venue_latency(venue.name(), latency_ms, avg_ms);
        self.telemetry
            .enqueue_latency(LatencyEvent::new(venue.name(), latency_ms));

        tracing::debug!(venue = %venue.name(), latency_ms, avg_ms, "Latency sample");
        latency_ms
    }

    /// Measure all venues concurrently
    pub async fn sweep(&self) -> Vec<(String, f64)> {
        let measurements = self.venues.iter().map(|venue| async move {
            let latency_ms = self.measure(venue).await;
            (venue.name().to_string(), latency_ms)
        });
        join_all(measurements).await
    }

    /// Sweep on a fixed interval until shutdown
    pub async fn run(&self, mut shutdown: Shutdown) {
        tracing::info!(
            venues = self.venues.len(),
            interval_ms = self.interval.as_millis() as u64,
            "Latency monitor started"
        );

        loop {
            tokio::select! {
                _ = self.sweep() => {}
                _ = shutdown.wait() => break,
            }
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = shutdown.wait() => break,
            }
        }

        tracing::info!("Latency monitor stopped");
    }
}
