//! Per-pair attempt pacing
//!
//! Every sweep tick each (venue, symbol) pair earns credit equal to its pace;
//! an attempt is due once a full unit has accrued. Long-run attempt frequency
//! is therefore proportional to the pace.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;

/// Lowest pace; a pair is attempted at least once every ten ticks
pub const MIN_PACE: Decimal = dec!(0.1);

/// Combine band and drawdown throttles into a pace in `[MIN_PACE, 1]`
pub fn pace(band_throttle: Decimal, risk_throttle: Decimal) -> Decimal {
    (band_throttle * risk_throttle).clamp(MIN_PACE, Decimal::ONE)
}

/// Credit scheduler keyed by (venue, symbol)
#[derive(Debug, Default)]
pub struct AttemptPacer {
    credits: HashMap<(String, String), Decimal>,
}

impl AttemptPacer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accrue one tick of credit; true when an attempt is due
    pub fn tick(&mut self, venue: &str, symbol: &str, pace: Decimal) -> bool {
        let pace = pace.clamp(MIN_PACE, Decimal::ONE);
        let credit = self
            .credits
            .entry((venue.to_string(), symbol.to_string()))
            .or_insert(Decimal::ZERO);

        *credit += pace;
        if *credit >= Decimal::ONE {
            *credit -= Decimal::ONE;
            true
        } else {
            false
        }
    }

    /// Credit currently held by a pair
    pub fn credit(&self, venue: &str, symbol: &str) -> Decimal {
        self.credits
            .get(&(venue.to_string(), symbol.to_string()))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fired(pace: Decimal, ticks: usize) -> Vec<bool> {
        let mut pacer = AttemptPacer::new();
        (0..ticks).map(|_| pacer.tick("OKX", "BTCUSDT", pace)).collect()
    }

    #[test]
    fn test_full_pace_fires_every_tick() {
        assert!(fired(dec!(1.0), 10).into_iter().all(|f| f));
    }

    #[test]
    fn test_half_pace_fires_every_other_tick() {
        assert_eq!(
            fired(dec!(0.5), 6),
            vec![false, true, false, true, false, true]
        );
    }

    #[test]
    fn test_frequency_proportional_to_pace() {
        let count = fired(dec!(0.7), 10).into_iter().filter(|f| *f).count();
        assert_eq!(count, 7);
    }

    #[test]
    fn test_tiny_pace_clamped_to_floor() {
        let count = fired(dec!(0.01), 10).into_iter().filter(|f| *f).count();
        assert_eq!(count, 1);
        assert_eq!(pace(dec!(0.5), dec!(0.1)), MIN_PACE);
    }

    #[test]
    fn test_pace_combines_throttles() {
        // cautious band at -40 USD drawdown
        assert_eq!(pace(dec!(0.7), dec!(0.52)), dec!(0.364));
        assert_eq!(pace(dec!(1.0), dec!(1.0)), Decimal::ONE);
    }

    #[test]
    fn test_pairs_are_independent() {
        let mut pacer = AttemptPacer::new();
        assert!(!pacer.tick("OKX", "BTCUSDT", dec!(0.5)));
        assert!(pacer.tick("OKX", "ETHUSDT", dec!(1.0)));
        assert_eq!(pacer.credit("OKX", "BTCUSDT"), dec!(0.5));
        assert_eq!(pacer.credit("OKX", "ETHUSDT"), Decimal::ZERO);
    }
}
