//! Kelly position sizing for a single open position.

use crate::config::SimulationConfig;
use crate::domain::{ConfidenceTier, TierTable};

/// Converts a capital base and confidence tier into the capital put at risk.
///
/// `size = min(base × kelly[tier] × risk_multiplier, base × max_position_pct)`.
///
/// Total exposure across concurrent positions is not checked here; the
/// trajectory loop never holds more than one position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionSizer {
    kelly_fractions: TierTable<f64>,
    max_position_pct: f64,
}

impl PositionSizer {
    pub fn new(kelly_fractions: TierTable<f64>, max_position_pct: f64) -> Self {
        Self {
            kelly_fractions,
            max_position_pct,
        }
    }

    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(config.kelly_fractions, config.max_position_pct)
    }

    pub fn kelly_fraction(&self, tier: ConfidenceTier) -> f64 {
        *self.kelly_fractions.get(tier)
    }

    pub fn max_position_pct(&self) -> f64 {
        self.max_position_pct
    }

    /// Size with the default risk multiplier of 1.0.
    pub fn size(&self, capital: f64, tier: ConfidenceTier) -> f64 {
        self.size_with_risk(capital, tier, 1.0)
    }

    pub fn size_with_risk(&self, capital: f64, tier: ConfidenceTier, risk_multiplier: f64) -> f64 {
        let base = capital * self.kelly_fraction(tier) * risk_multiplier;
        let cap = capital * self.max_position_pct;
        base.min(cap)
    }
}
