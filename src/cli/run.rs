//! Run command implementation

use crate::config::Config;
use crate::scheduler::Scheduler;
use clap::Args;
use std::time::Duration;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Stop after this many seconds instead of waiting for Ctrl-C
    #[arg(short, long)]
    pub duration_secs: Option<u64>,
}

impl RunArgs {
    pub async fn execute(&self, config: Config) -> anyhow::Result<()> {
        let scheduler = Scheduler::builder(config).build()?;
        let duration = self.duration_secs.map(Duration::from_secs);

        let signal = async move {
            match duration {
                Some(duration) => {
                    tokio::select! {
                        _ = tokio::time::sleep(duration) => {
                            tracing::info!(secs = duration.as_secs(), "Run duration elapsed");
                        }
                        _ = tokio::signal::ctrl_c() => {}
                    }
                }
                None => {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
                    }
                }
            }
        };

        let stats = scheduler.run(signal).await?;
        tracing::info!(
            batches_delivered = stats.batches_delivered,
            rows_delivered = stats.rows_delivered,
            batches_failed = stats.batches_failed,
            latency_dropped = stats.latency_dropped,
            trades_dropped = stats.trades_dropped,
            "Telemetry summary"
        );
        Ok(())
    }
}
