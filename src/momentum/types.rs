//! Momentum detection types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction of detected momentum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MomentumDirection {
    /// Mid-price drifting up
    Up,
    /// Mid-price drifting down
    Down,
}

/// Result of evaluating a momentum buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MomentumReading {
    /// Whether the move cleared the threshold
    pub fired: bool,
    /// Move from oldest to newest price, in percent (0.15 = 0.15%)
    pub pct_move: Decimal,
}

impl MomentumReading {
    /// A reading that never fires
    pub fn none() -> Self {
        Self {
            fired: false,
            pct_move: Decimal::ZERO,
        }
    }

    /// Direction of a fired signal
    pub fn direction(&self) -> Option<MomentumDirection> {
        if !self.fired {
            return None;
        }
        if self.pct_move > Decimal::ZERO {
            Some(MomentumDirection::Up)
        } else if self.pct_move < Decimal::ZERO {
            Some(MomentumDirection::Down)
        } else {
            None
        }
    }
}
