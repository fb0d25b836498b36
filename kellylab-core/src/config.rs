//! Simulation configuration and the fatal configuration-error taxonomy.
//!
//! Everything here is checked once, before the first trajectory runs. Inside
//! the engine the inputs are treated as valid and sampling is total.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{ConfidenceTier, StrategyStats, TierTable};
use crate::outcome::default_win_probabilities;

/// Tolerance for the tier distribution summing to 1.
pub const DISTRIBUTION_TOLERANCE: f64 = 1e-6;

/// Malformed configuration. Always surfaced before simulation starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("initial capital must be > 0, got {0}")]
    NonPositiveCapital(f64),
    #[error("tier probabilities sum to {sum}, expected 1 within 1e-6")]
    DistributionSum { sum: f64 },
    #[error("{field} for {tier} must be a probability in [0, 1], got {value}")]
    InvalidProbability {
        field: &'static str,
        tier: ConfidenceTier,
        value: f64,
    },
    #[error("{field} for {tier} must be > 0, got {value}")]
    NonPositiveMagnitude {
        field: &'static str,
        tier: ConfidenceTier,
        value: f64,
    },
    #[error("{field} must be a finite, non-negative fraction, got {value}")]
    InvalidFraction { field: &'static str, value: f64 },
    #[error("trajectory count must be at least 1")]
    NoTrajectories,
    #[error("cannot build magnitude distribution for {tier}: {reason}")]
    Distribution { tier: ConfidenceTier, reason: String },
}

/// Immutable parameters of one Monte Carlo analysis pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Trajectory count M.
    pub num_simulations: usize,
    /// Trades per trajectory N.
    pub num_trades: usize,
    /// Starting capital C₀.
    pub initial_capital: f64,
    /// Size from current capital (true) or always from C₀ (false).
    pub use_compounding: bool,
    /// Fractional-Kelly allocation per tier.
    pub kelly_fractions: TierTable<f64>,
    /// Per-trade position cap as a fraction of the sizing base.
    pub max_position_pct: f64,
    /// Total-exposure cap across concurrent positions. Enforced by the
    /// standalone sizing calculator; the trajectory loop holds one position
    /// at a time.
    pub max_total_exposure: f64,
    /// Size reduction for correlated positions (sizing calculator only).
    pub correlation_reduction: f64,
    /// Slippage as a fraction of trade magnitude.
    pub slippage_pct: f64,
    /// Commission per side as a fraction of trade magnitude.
    pub commission_pct: f64,
    /// Win probability the outcome model draws from, per tier. Deliberately
    /// separate from the historical win rates in `StrategyStats`.
    pub tier_win_probabilities: TierTable<f64>,
    /// Master seed for the per-trajectory random streams.
    pub master_seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_simulations: 10_000,
            num_trades: 1_000,
            initial_capital: 1_000.0,
            use_compounding: true,
            kelly_fractions: TierTable::new(0.146, 0.110, 0.055),
            max_position_pct: 0.20,
            max_total_exposure: 1.50,
            correlation_reduction: 0.30,
            slippage_pct: 0.005,
            commission_pct: 0.001,
            tier_win_probabilities: default_win_probabilities(),
            master_seed: 42,
        }
    }
}

impl SimulationConfig {
    /// Round-trip cost rate applied to every trade's magnitude.
    pub fn round_trip_cost_rate(&self) -> f64 {
        self.slippage_pct + 2.0 * self.commission_pct
    }

    /// Distribution-weighted win probability the outcome model will realize.
    pub fn expected_model_win_rate(&self, distribution: &TierTable<f64>) -> f64 {
        self.tier_win_probabilities.weighted_by(distribution)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(ConfigError::NonPositiveCapital(self.initial_capital));
        }
        if self.num_simulations == 0 {
            return Err(ConfigError::NoTrajectories);
        }

        for (tier, k) in self.kelly_fractions.iter() {
            if !k.is_finite() || *k < 0.0 {
                return Err(ConfigError::InvalidFraction {
                    field: kelly_field(tier),
                    value: *k,
                });
            }
        }
        for (tier, p) in self.tier_win_probabilities.iter() {
            if !p.is_finite() || !(0.0..=1.0).contains(p) {
                return Err(ConfigError::InvalidProbability {
                    field: "tier_win_probabilities",
                    tier,
                    value: *p,
                });
            }
        }

        let fractions = [
            ("max_position_pct", self.max_position_pct),
            ("max_total_exposure", self.max_total_exposure),
            ("correlation_reduction", self.correlation_reduction),
            ("slippage_pct", self.slippage_pct),
            ("commission_pct", self.commission_pct),
        ];
        for (field, value) in fractions {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidFraction { field, value });
            }
        }
        Ok(())
    }
}

fn kelly_field(tier: ConfidenceTier) -> &'static str {
    match tier {
        ConfidenceTier::High => "kelly_fractions.high",
        ConfidenceTier::Medium => "kelly_fractions.medium",
        ConfidenceTier::Low => "kelly_fractions.low",
    }
}

/// Validate both inputs of an analysis pass.
pub fn validate_inputs(stats: &StrategyStats, config: &SimulationConfig) -> Result<(), ConfigError> {
    stats.validate()?;
    config.validate()
}
