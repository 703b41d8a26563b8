//! Probe command implementation

use crate::config::Config;
use crate::scheduler::Scheduler;
use clap::Args;
use std::time::Duration;

#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Number of latency sweeps
    #[arg(short, long, default_value_t = 3)]
    pub samples: u32,
}

impl ProbeArgs {
    pub async fn execute(&self, mut config: Config) -> anyhow::Result<()> {
        // Probing never delivers telemetry
        config.telemetry.delivery.sink_url = None;
        let scheduler = Scheduler::builder(config.clone()).build()?;
        let monitor = scheduler.monitor();
        let interval = Duration::from_millis(config.monitor.interval_ms);

        for sample in 1..=self.samples.max(1) {
            for (venue, latency_ms) in monitor.sweep().await {
                tracing::info!(sample, venue = %venue, latency_ms, "Probe");
            }
            if sample < self.samples {
                tokio::time::sleep(interval).await;
            }
        }

        println!(
            "{:<10} {:>8} {:>8} {:>8} {:<12} {:>10} {:>9}",
            "Venue", "Last", "Avg", "Max", "Band", "MinSpread%", "SizeUSD"
        );
        for venue in monitor.venues() {
            let snapshot = venue.snapshot().await;
            println!(
                "{:<10} {:>8.0} {:>8.0} {:>8.0} {:<12} {:>10} {:>9}",
                snapshot.name,
                snapshot.last_ms.unwrap_or_default(),
                snapshot.avg_ms.unwrap_or_default(),
                snapshot.max_ms.unwrap_or_default(),
                snapshot.band.name,
                snapshot.band.min_spread_pct,
                snapshot.band.throttled_size().round_dp(2),
            );
        }
        Ok(())
    }
}
