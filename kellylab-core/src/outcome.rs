//! Per-trade outcome model: win/loss flag, magnitude, transaction costs.
//!
//! The model consumes two independent inputs per tier:
//! - a win probability table (`SimulationConfig::tier_win_probabilities`),
//! - magnitude statistics (`StrategyStats` avg win / avg loss).
//!
//! The win probabilities are not derived from the historical win rates in
//! `StrategyStats`. Callers that want them unified must set both.

use rand::Rng;
use rand_distr::{Distribution, LogNormal};

use crate::config::{ConfigError, SimulationConfig};
use crate::domain::{ConfidenceTier, StrategyStats, TierTable};

/// Log-space volatility of winning magnitudes.
pub const WIN_SIGMA: f64 = 0.5;
/// Log-space volatility of losing magnitudes.
pub const LOSS_SIGMA: f64 = 0.4;

/// Default per-tier win probabilities used by the outcome model.
pub fn default_win_probabilities() -> TierTable<f64> {
    TierTable::new(0.625, 0.500, 0.450)
}

/// Signed per-unit PnL of one trade plus its win flag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeDraw {
    pub pnl_per_unit: f64,
    pub is_winner: bool,
}

/// Samples a single trade outcome for a tier.
///
/// Implementations must be total: every call returns a draw.
pub trait OutcomeModel: Send + Sync {
    fn draw<R: Rng + ?Sized>(&self, tier: ConfidenceTier, rng: &mut R) -> TradeDraw;
}

/// Proportional transaction costs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransactionCosts {
    pub slippage_pct: f64,
    /// Per side; charged twice per round trip.
    pub commission_pct: f64,
}

impl TransactionCosts {
    pub fn new(slippage_pct: f64, commission_pct: f64) -> Self {
        Self {
            slippage_pct,
            commission_pct,
        }
    }

    pub fn frictionless() -> Self {
        Self::new(0.0, 0.0)
    }

    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(config.slippage_pct, config.commission_pct)
    }

    /// Costs always reduce PnL, whatever the sign of the raw magnitude.
    pub fn apply(&self, raw_pnl: f64) -> f64 {
        let magnitude = raw_pnl.abs();
        let slippage = magnitude * self.slippage_pct;
        let commission = magnitude * self.commission_pct * 2.0;
        raw_pnl - slippage - commission
    }
}

/// Log-normal magnitudes around each tier's average win / loss.
#[derive(Debug, Clone)]
pub struct LogNormalOutcome {
    win_probabilities: TierTable<f64>,
    wins: TierTable<LogNormal<f64>>,
    losses: TierTable<LogNormal<f64>>,
    costs: TransactionCosts,
}

impl LogNormalOutcome {
    /// Build from validated stats and config.
    pub fn new(stats: &StrategyStats, config: &SimulationConfig) -> Result<Self, ConfigError> {
        Self::with_parts(
            stats,
            config.tier_win_probabilities,
            TransactionCosts::from_config(config),
        )
    }

    pub fn with_parts(
        stats: &StrategyStats,
        win_probabilities: TierTable<f64>,
        costs: TransactionCosts,
    ) -> Result<Self, ConfigError> {
        let wins = stats
            .tiers
            .try_map(|tier, row| log_normal(tier, "avg_win", row.avg_win, WIN_SIGMA))?;
        let losses = stats
            .tiers
            .try_map(|tier, row| log_normal(tier, "avg_loss", row.avg_loss, LOSS_SIGMA))?;
        Ok(Self {
            win_probabilities,
            wins,
            losses,
            costs,
        })
    }

    pub fn win_probabilities(&self) -> &TierTable<f64> {
        &self.win_probabilities
    }

    pub fn costs(&self) -> TransactionCosts {
        self.costs
    }
}

fn log_normal(
    tier: ConfidenceTier,
    field: &'static str,
    mean_magnitude: f64,
    sigma: f64,
) -> Result<LogNormal<f64>, ConfigError> {
    if !mean_magnitude.is_finite() || mean_magnitude <= 0.0 {
        return Err(ConfigError::NonPositiveMagnitude {
            field,
            tier,
            value: mean_magnitude,
        });
    }
    LogNormal::new(mean_magnitude.ln(), sigma).map_err(|e| ConfigError::Distribution {
        tier,
        reason: e.to_string(),
    })
}

impl OutcomeModel for LogNormalOutcome {
    fn draw<R: Rng + ?Sized>(&self, tier: ConfidenceTier, rng: &mut R) -> TradeDraw {
        let is_winner = rng.gen::<f64>() < *self.win_probabilities.get(tier);
        let raw = if is_winner {
            self.wins.get(tier).sample(rng)
        } else {
            -self.losses.get(tier).sample(rng)
        };
        TradeDraw {
            pnl_per_unit: self.costs.apply(raw),
            is_winner,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn costs_reduce_wins_and_deepen_losses() {
        let costs = TransactionCosts::new(0.005, 0.001);
        assert!((costs.apply(10.0) - (10.0 - 0.05 - 0.02)).abs() < 1e-12);
        assert!((costs.apply(-10.0) - (-10.0 - 0.05 - 0.02)).abs() < 1e-12);
    }

    #[test]
    fn frictionless_costs_are_identity() {
        let costs = TransactionCosts::frictionless();
        assert_eq!(costs.apply(3.5), 3.5);
        assert_eq!(costs.apply(-1.25), -1.25);
    }

    #[test]
    fn certain_win_is_always_positive() {
        let stats = StrategyStats::default();
        let model = LogNormalOutcome::with_parts(
            &stats,
            TierTable::splat(1.0),
            TransactionCosts::new(0.005, 0.001),
        )
        .unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        for tier in ConfidenceTier::ALL {
            for _ in 0..200 {
                let draw = model.draw(tier, &mut rng);
                assert!(draw.is_winner);
                assert!(draw.pnl_per_unit > 0.0);
            }
        }
    }

    #[test]
    fn certain_loss_is_always_negative() {
        let stats = StrategyStats::default();
        let model = LogNormalOutcome::with_parts(
            &stats,
            TierTable::splat(0.0),
            TransactionCosts::frictionless(),
        )
        .unwrap();
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..200 {
            let draw = model.draw(ConfidenceTier::Medium, &mut rng);
            assert!(!draw.is_winner);
            assert!(draw.pnl_per_unit < 0.0);
        }
    }

    #[test]
    fn win_magnitude_median_near_avg_win() {
        // Median of a log-normal is exp(mu) = avg_win.
        let stats = StrategyStats::default();
        let model = LogNormalOutcome::with_parts(
            &stats,
            TierTable::splat(1.0),
            TransactionCosts::frictionless(),
        )
        .unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let mut draws: Vec<f64> = (0..20_001)
            .map(|_| model.draw(ConfidenceTier::High, &mut rng).pnl_per_unit)
            .collect();
        draws.sort_by(|a, b| a.total_cmp(b));
        let median = draws[draws.len() / 2];
        assert!((median - 6.88).abs() < 0.2, "median {median}");
    }

    #[test]
    fn non_positive_magnitude_rejected_at_construction() {
        let mut stats = StrategyStats::default();
        stats.tiers.high.avg_win = -1.0;
        let err = LogNormalOutcome::new(&stats, &SimulationConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::NonPositiveMagnitude {
                field: "avg_win",
                tier: ConfidenceTier::High,
                ..
            }
        ));
    }
}
