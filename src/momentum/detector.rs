//! Momentum detection over short mid-price buffers
//!
//! Each (venue, symbol) pair keeps the last few mid-prices. A signal fires
//! when the drift from the oldest to the newest price clears a threshold.

use rust_decimal::Decimal;
use std::collections::{HashMap, VecDeque};

use super::types::MomentumReading;
use crate::config::MomentumConfig;

/// Fixed-capacity mid-price buffer, oldest first
#[derive(Debug, Clone)]
pub struct MomentumBuffer {
    prices: VecDeque<Decimal>,
    capacity: usize,
}

impl MomentumBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            prices: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a mid-price, evicting the oldest beyond capacity
    pub fn observe(&mut self, mid_price: Decimal) {
        if self.prices.len() == self.capacity {
            self.prices.pop_front();
        }
        self.prices.push_back(mid_price);
    }

    /// Evaluate the drift across the buffer
    ///
    /// Returns no signal below `min_samples`. The move is
    /// `(newest - oldest) / oldest * 100`, zero when the oldest price is zero.
    pub fn evaluate(&self, min_samples: usize, epsilon_pct: Decimal) -> MomentumReading {
        if self.prices.len() < min_samples.max(1) {
            return MomentumReading::none();
        }
        let (Some(&oldest), Some(&newest)) = (self.prices.front(), self.prices.back()) else {
            return MomentumReading::none();
        };

        let pct_move = if oldest.is_zero() {
            Decimal::ZERO
        } else {
            (newest - oldest) / oldest * Decimal::ONE_HUNDRED
        };

        MomentumReading {
            fired: pct_move.abs() >= epsilon_pct,
            pct_move,
        }
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Momentum detector holding one buffer per (venue, symbol)
///
/// Buffers are created lazily on first observation and never removed.
#[derive(Debug)]
pub struct MomentumDetector {
    buffers: HashMap<(String, String), MomentumBuffer>,
    buffer_len: usize,
    min_samples: usize,
}

impl MomentumDetector {
    pub fn new(config: &MomentumConfig) -> Self {
        Self {
            buffers: HashMap::new(),
            buffer_len: config.buffer_len,
            min_samples: config.min_samples,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(&MomentumConfig::default())
    }

    /// Record a mid-price for a venue and symbol
    pub fn observe(&mut self, venue: &str, symbol: &str, mid_price: Decimal) {
        let buffer_len = self.buffer_len;
        self.buffers
            .entry((venue.to_string(), symbol.to_string()))
            .or_insert_with(|| MomentumBuffer::new(buffer_len))
            .observe(mid_price);
    }

    /// Evaluate the buffer of a venue and symbol against `epsilon_pct`
    pub fn evaluate(&self, venue: &str, symbol: &str, epsilon_pct: Decimal) -> MomentumReading {
        self.buffers
            .get(&(venue.to_string(), symbol.to_string()))
            .map(|buffer| buffer.evaluate(self.min_samples, epsilon_pct))
            .unwrap_or_else(MomentumReading::none)
    }

    /// Number of samples buffered for a venue and symbol
    pub fn sample_count(&self, venue: &str, symbol: &str) -> usize {
        self.buffers
            .get(&(venue.to_string(), symbol.to_string()))
            .map_or(0, MomentumBuffer::len)
    }

    /// Number of (venue, symbol) buffers created so far
    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }
}
