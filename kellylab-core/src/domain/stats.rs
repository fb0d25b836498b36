//! Historical strategy statistics: the empirical inputs to the outcome model.

use serde::{Deserialize, Serialize};

use super::tier::{ConfidenceTier, TierTable};
use crate::config::{ConfigError, DISTRIBUTION_TOLERANCE};

/// Observed performance of one confidence tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierStats {
    /// Historical win rate for trades in this tier.
    pub win_rate: f64,
    /// Mean winning-trade magnitude (per-unit PnL, > 0).
    pub avg_win: f64,
    /// Mean losing-trade magnitude (per-unit PnL, positive number, > 0).
    pub avg_loss: f64,
    /// Number of historical trades the row was estimated from.
    #[serde(default)]
    pub trades: usize,
    /// Realized PnL of those trades.
    #[serde(default)]
    pub pnl: f64,
}

/// Immutable strategy statistics shared by every trajectory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyStats {
    pub tiers: TierTable<TierStats>,
    /// Categorical distribution over tiers; must sum to 1.
    pub distribution: TierTable<f64>,
}

impl Default for StrategyStats {
    fn default() -> Self {
        let row = |trades, pnl| TierStats {
            win_rate: 0.543,
            avg_win: 6.88,
            avg_loss: 1.57,
            trades,
            pnl,
        };
        Self {
            tiers: TierTable::new(row(24, 93.90), row(10, 11.16), row(1, 0.50)),
            distribution: TierTable::new(0.67, 0.31, 0.02),
        }
    }
}

impl StrategyStats {
    /// Stats with one win rate and one magnitude pair shared by every tier.
    pub fn uniform(win_rate: f64, avg_win: f64, avg_loss: f64, distribution: TierTable<f64>) -> Self {
        Self {
            tiers: TierTable::splat(TierStats {
                win_rate,
                avg_win,
                avg_loss,
                trades: 0,
                pnl: 0.0,
            }),
            distribution,
        }
    }

    pub fn tier(&self, tier: ConfidenceTier) -> &TierStats {
        self.tiers.get(tier)
    }

    /// Tier win rates as a table.
    pub fn win_rates(&self) -> TierTable<f64> {
        self.tiers.map(|t| t.win_rate)
    }

    /// Distribution-weighted historical win rate.
    pub fn expected_win_rate(&self) -> f64 {
        self.win_rates().weighted_by(&self.distribution)
    }

    /// Total historical trades across tiers.
    pub fn total_trades(&self) -> usize {
        self.tiers.iter().map(|(_, t)| t.trades).sum()
    }

    /// Copy with every tier's historical win rate replaced.
    pub fn with_win_rate(&self, win_rate: f64) -> Self {
        let mut stats = self.clone();
        for tier in ConfidenceTier::ALL {
            stats.tiers.get_mut(tier).win_rate = win_rate;
        }
        stats
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (tier, p) in self.distribution.iter() {
            if !p.is_finite() || !(0.0..=1.0).contains(p) {
                return Err(ConfigError::InvalidProbability {
                    field: "distribution",
                    tier,
                    value: *p,
                });
            }
        }
        let sum = self.distribution.sum();
        if (sum - 1.0).abs() > DISTRIBUTION_TOLERANCE {
            return Err(ConfigError::DistributionSum { sum });
        }

        for (tier, row) in self.tiers.iter() {
            if !row.win_rate.is_finite() || !(0.0..=1.0).contains(&row.win_rate) {
                return Err(ConfigError::InvalidProbability {
                    field: "win_rate",
                    tier,
                    value: row.win_rate,
                });
            }
            if !row.avg_win.is_finite() || row.avg_win <= 0.0 {
                return Err(ConfigError::NonPositiveMagnitude {
                    field: "avg_win",
                    tier,
                    value: row.avg_win,
                });
            }
            if !row.avg_loss.is_finite() || row.avg_loss <= 0.0 {
                return Err(ConfigError::NonPositiveMagnitude {
                    field: "avg_loss",
                    tier,
                    value: row.avg_loss,
                });
            }
        }
        Ok(())
    }
}
