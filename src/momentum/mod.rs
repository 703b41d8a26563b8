//! Momentum detection module
//!
//! Short rolling mid-price buffers per (venue, symbol) and a directional
//! conviction test over them.

mod detector;
mod types;

pub use detector::{MomentumBuffer, MomentumDetector};
pub use types::{MomentumDirection, MomentumReading};
