//! Confidence-tier sampling from a fixed categorical distribution.

use rand::Rng;

use crate::domain::{ConfidenceTier, StrategyStats, TierTable};

/// Draws the confidence tier of the next trade.
///
/// One uniform draw `u` in [0, 1) per trade: `u < p_H` → HIGH,
/// `p_H <= u < p_H + p_M` → MEDIUM, otherwise LOW.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceSampler {
    distribution: TierTable<f64>,
}

impl ConfidenceSampler {
    pub fn new(distribution: TierTable<f64>) -> Self {
        Self { distribution }
    }

    pub fn from_stats(stats: &StrategyStats) -> Self {
        Self::new(stats.distribution)
    }

    pub fn distribution(&self) -> &TierTable<f64> {
        &self.distribution
    }

    /// Map a uniform value to a tier.
    pub fn tier_for(&self, u: f64) -> ConfidenceTier {
        if u < self.distribution.high {
            ConfidenceTier::High
        } else if u < self.distribution.high + self.distribution.medium {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> ConfidenceTier {
        let u: f64 = rng.gen();
        self.tier_for(u)
    }
}
