//! Latency module
//!
//! Rolling latency history, band selection and the monitor loop that
//! keeps every venue's band current.

mod band;
mod history;
mod monitor;

pub use band::{BandError, BandTable, LatencyBand};
pub use history::LatencyHistory;
pub use monitor::VenueLatencyMonitor;
