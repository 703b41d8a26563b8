//! latency-scalper: latency-adaptive paper scalper
//!
//! This library provides the core components for:
//! - Venue latency monitoring with rolling statistics
//! - Latency band selection (spread, size and pacing per band)
//! - Per-venue, per-symbol momentum detection
//! - Daily risk limits with drawdown throttling
//! - Paced paper trade attempts with a pluggable fill model
//! - Bounded, batched telemetry delivery to a REST table store
//! - Structured logging and Prometheus metrics

pub mod cli;
pub mod config;
pub mod engine;
pub mod execution;
pub mod latency;
pub mod momentum;
pub mod risk;
pub mod scheduler;
pub mod shutdown;
pub mod telemetry;
pub mod venue;
