//! Scheduler module
//!
//! Composition root: builds every component from the configuration and runs
//! the monitor, decision, status and telemetry loops on one executor.
//!
//! Shutdown is two-staged. The producer loops stop first and are awaited;
//! only then is the telemetry pipeline told to flush, so every event a
//! producer managed to enqueue is offered to the final flush.

mod status;

pub use status::StatusReporter;

use crate::config::{Config, ConfigError};
use crate::engine::TradeDecisionEngine;
use crate::execution::{FillSimulator, PaperFillSimulator};
use crate::latency::VenueLatencyMonitor;
use crate::risk::RiskLimiter;
use crate::shutdown::shutdown_channel;
use crate::telemetry::{
    telemetry_channel, RestSink, TelemetryPipeline, TelemetrySink, TelemetryStats,
};
use crate::venue::{quote_source, HttpProbe, LatencyProbe, QuoteSource, Venue};
use reqwest::Client;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Builder for [`Scheduler`]; every external dependency can be replaced
pub struct SchedulerBuilder {
    config: Config,
    client: Option<Client>,
    probe: Option<Arc<dyn LatencyProbe>>,
    quote_sources: HashMap<String, Arc<dyn QuoteSource>>,
    sink: Option<Arc<dyn TelemetrySink>>,
    fill: Option<Arc<dyn FillSimulator>>,
}

impl SchedulerBuilder {
    /// Shared HTTP client for the default probe, quote sources and sink
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn probe(mut self, probe: Arc<dyn LatencyProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Quote source for the venue named `venue`
    pub fn quote_source(mut self, venue: impl Into<String>, source: Arc<dyn QuoteSource>) -> Self {
        self.quote_sources.insert(venue.into(), source);
        self
    }

    /// Telemetry sink; enables delivery regardless of configured credentials
    pub fn sink(mut self, sink: Arc<dyn TelemetrySink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn fill_simulator(mut self, fill: Arc<dyn FillSimulator>) -> Self {
        self.fill = Some(fill);
        self
    }

    /// Validate the configuration and wire every component
    pub fn build(mut self) -> Result<Scheduler, ConfigError> {
        self.config.validate()?;
        let config = self.config;
        let bands = Arc::new(config.band_table()?);
        let client = self.client.unwrap_or_default();

        let quote_timeout = Duration::from_millis(config.engine.quote_timeout_ms);
        let venues: Vec<Arc<Venue>> = config
            .venues
            .iter()
            .map(|venue| {
                let quotes = self
                    .quote_sources
                    .remove(&venue.name)
                    .unwrap_or_else(|| quote_source(venue, client.clone(), quote_timeout));
                Arc::new(Venue::new(venue, quotes, config.monitor.history_len, &bands))
            })
            .collect();

        let delivery = &config.telemetry.delivery;
        let sink = self.sink.or_else(|| rest_sink(&config, &client));
        let (queues, receivers) = telemetry_channel(delivery.queue_capacity, sink.is_some());
        let pipeline = TelemetryPipeline::new(receivers, sink, delivery);

        let probe = self.probe.unwrap_or_else(|| {
            let timeout = Duration::from_millis(config.monitor.ping_timeout_ms);
            Arc::new(HttpProbe::new(client.clone(), timeout))
        });
        let monitor = VenueLatencyMonitor::new(
            venues.clone(),
            bands.clone(),
            probe,
            queues.clone(),
            &config.monitor,
        );

        let fill = self.fill.unwrap_or_else(|| {
            Arc::new(PaperFillSimulator::new(
                config.engine.hold_duration(),
                config.engine.exit_move,
            ))
        });
        let engine = Arc::new(TradeDecisionEngine::new(
            venues,
            RiskLimiter::new(config.risk.clone()),
            fill,
            queues.clone(),
            &config.engine,
            &config.momentum,
        ));

        let status = StatusReporter::new(
            engine.clone(),
            queues,
            Duration::from_secs(config.engine.status_interval_secs),
        );

        Ok(Scheduler {
            monitor,
            engine,
            status,
            pipeline,
        })
    }
}

fn rest_sink(config: &Config, client: &Client) -> Option<Arc<dyn TelemetrySink>> {
    let delivery = &config.telemetry.delivery;
    if !delivery.is_enabled() {
        return None;
    }
    let url = delivery.sink_url.clone()?;
    let key = delivery.sink_api_key.clone()?;
    let timeout = Duration::from_millis(delivery.post_timeout_ms);
    Some(Arc::new(RestSink::new(client.clone(), url, key, timeout)))
}

/// All long-running loops of the scalper
pub struct Scheduler {
    monitor: VenueLatencyMonitor,
    engine: Arc<TradeDecisionEngine>,
    status: StatusReporter,
    pipeline: TelemetryPipeline,
}

impl Scheduler {
    pub fn builder(config: Config) -> SchedulerBuilder {
        SchedulerBuilder {
            config,
            client: None,
            probe: None,
            quote_sources: HashMap::new(),
            sink: None,
            fill: None,
        }
    }

    pub fn monitor(&self) -> &VenueLatencyMonitor {
        &self.monitor
    }

    pub fn engine(&self) -> &Arc<TradeDecisionEngine> {
        &self.engine
    }

    /// Run every loop until `signal` resolves, then shut down in order
    pub async fn run<F>(self, signal: F) -> anyhow::Result<TelemetryStats>
    where
        F: Future<Output = ()>,
    {
        let Scheduler {
            monitor,
            engine,
            status,
            pipeline,
        } = self;

        let (producer_trigger, producer_shutdown) = shutdown_channel();
        let (pipeline_trigger, pipeline_shutdown) = shutdown_channel();

        tracing::info!(
            venues = engine.venues().len(),
            symbols = engine.symbols().len(),
            telemetry = pipeline.is_enabled(),
            "Scheduler started"
        );

        let producers = async {
            tokio::join!(
                async {
                    signal.await;
                    tracing::info!("Shutdown requested, stopping producers");
                    producer_trigger.trigger();
                },
                monitor.run(producer_shutdown.clone()),
                engine.run(producer_shutdown.clone()),
                status.run(producer_shutdown.clone()),
            );
            tracing::info!("Producers stopped, flushing telemetry");
            pipeline_trigger.trigger();
        };

        let (_, stats) = tokio::join!(producers, pipeline.run(pipeline_shutdown));

        status.report().await;
        tracing::info!("Scheduler stopped");
        Ok(stats)
    }
}
