//! Cross-trajectory aggregation: distributional statistics and risk proportions.
//!
//! Percentiles use linear interpolation between closest ranks
//! (rank = p/100 × (n−1)); standard deviation is the population form.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use kellylab_core::statistics::{mean, median_sorted, percentile_sorted, population_std, sorted};
use kellylab_core::TrajectoryResult;

/// Percentile ranks reported for every distributional metric.
pub const PERCENTILE_RANKS: [f64; 9] = [1.0, 5.0, 10.0, 25.0, 50.0, 75.0, 90.0, 95.0, 99.0];

/// Final capital below this fraction of C₀ counts toward probability of ruin.
pub const RUIN_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AggregateError {
    #[error("cannot aggregate an empty result set")]
    Empty,
    #[error("initial capital must be positive, got {0}")]
    NonPositiveCapital(f64),
}

/// Value at each rank of [`PERCENTILE_RANKS`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    pub p1: f64,
    pub p5: f64,
    pub p10: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
}

impl Percentiles {
    fn from_sorted(sorted: &[f64]) -> Self {
        let at = |p: f64| percentile_sorted(sorted, p);
        Self {
            p1: at(1.0),
            p5: at(5.0),
            p10: at(10.0),
            p25: at(25.0),
            p50: at(50.0),
            p75: at(75.0),
            p90: at(90.0),
            p95: at(95.0),
            p99: at(99.0),
        }
    }

    /// `(rank, value)` pairs in ascending rank order.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> {
        let values = [
            self.p1, self.p5, self.p10, self.p25, self.p50, self.p75, self.p90, self.p95,
            self.p99,
        ];
        PERCENTILE_RANKS.into_iter().zip(values)
    }
}

/// Full distributional summary of one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub percentiles: Percentiles,
}

impl MetricSummary {
    /// Summarize a non-empty sample. Returns `None` for an empty one.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let ordered = sorted(values);
        Some(Self {
            mean: mean(values),
            median: median_sorted(&ordered),
            std: population_std(values),
            min: ordered[0],
            max: ordered[ordered.len() - 1],
            percentiles: Percentiles::from_sorted(&ordered),
        })
    }
}

/// Mean and median only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CentralSummary {
    pub mean: f64,
    pub median: f64,
}

impl CentralSummary {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        Some(Self {
            mean: mean(values),
            median: median_sorted(&sorted(values)),
        })
    }
}

/// Profit factor over trajectories with a finite value.
///
/// `mean`/`median` are `None` when every trajectory had zero gross loss.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfitFactorSummary {
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub finite_count: usize,
    pub infinite_count: usize,
}

/// Aggregate over a full batch of trajectories.
///
/// Field names are the stable contract consumed by export and reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateAnalysis {
    pub num_trajectories: usize,
    pub final_capital: MetricSummary,
    pub total_pnl: MetricSummary,
    pub max_drawdown_pct: MetricSummary,
    pub longest_loss_streak: MetricSummary,
    pub win_rate: CentralSummary,
    pub sharpe_ratio: CentralSummary,
    pub profit_factor: ProfitFactorSummary,
    /// Percentage of trajectories with positive total PnL.
    pub probability_of_profit: f64,
    /// Percentage of trajectories ending below half of initial capital.
    pub probability_of_ruin: f64,
    /// Trajectories that reached zero capital and stopped early.
    pub ruined_count: usize,
}

/// Computes an [`AggregateAnalysis`] from a complete result set.
#[derive(Debug, Clone, Copy)]
pub struct AggregationEngine {
    initial_capital: f64,
}

impl AggregationEngine {
    pub fn new(initial_capital: f64) -> Result<Self, AggregateError> {
        if !initial_capital.is_finite() || initial_capital <= 0.0 {
            return Err(AggregateError::NonPositiveCapital(initial_capital));
        }
        Ok(Self { initial_capital })
    }

    pub fn initial_capital(&self) -> f64 {
        self.initial_capital
    }

    /// Aggregate all results. Order-independent.
    pub fn analyze(&self, results: &[TrajectoryResult]) -> Result<AggregateAnalysis, AggregateError> {
        let n = results.len();
        if n == 0 {
            return Err(AggregateError::Empty);
        }

        let column = |f: fn(&TrajectoryResult) -> f64| -> Vec<f64> { results.iter().map(f).collect() };
        let final_capitals = column(|r| r.final_capital);
        let total_pnls = column(|r| r.total_pnl);
        let drawdowns = column(|r| r.max_drawdown_pct);
        let loss_streaks = column(|r| r.longest_loss_streak as f64);
        let win_rates = column(|r| r.actual_win_rate);
        let sharpes = column(|r| r.sharpe_ratio);

        let finite_pfs: Vec<f64> = results
            .iter()
            .map(|r| r.profit_factor)
            .filter(|pf| pf.is_finite())
            .collect();
        let profit_factor = match CentralSummary::from_values(&finite_pfs) {
            Some(central) => ProfitFactorSummary {
                mean: Some(central.mean),
                median: Some(central.median),
                finite_count: finite_pfs.len(),
                infinite_count: n - finite_pfs.len(),
            },
            None => ProfitFactorSummary {
                mean: None,
                median: None,
                finite_count: 0,
                infinite_count: n,
            },
        };

        let ruin_line = self.initial_capital * RUIN_THRESHOLD;
        let profitable = total_pnls.iter().filter(|&&pnl| pnl > 0.0).count();
        let below_ruin_line = final_capitals.iter().filter(|&&c| c < ruin_line).count();

        let summary = |values: &[f64]| MetricSummary::from_values(values).ok_or(AggregateError::Empty);
        let central = |values: &[f64]| CentralSummary::from_values(values).ok_or(AggregateError::Empty);

        Ok(AggregateAnalysis {
            num_trajectories: n,
            final_capital: summary(&final_capitals)?,
            total_pnl: summary(&total_pnls)?,
            max_drawdown_pct: summary(&drawdowns)?,
            longest_loss_streak: summary(&loss_streaks)?,
            win_rate: central(&win_rates)?,
            sharpe_ratio: central(&sharpes)?,
            profit_factor,
            probability_of_profit: profitable as f64 / n as f64 * 100.0,
            probability_of_ruin: below_ruin_line as f64 / n as f64 * 100.0,
            ruined_count: results.iter().filter(|r| r.is_ruined()).count(),
        })
    }
}
