//! One-shot analysis: sizing, the Monte Carlo batch, stress scenarios, and a
//! graded recommendation from the median outcome.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use kellylab_core::{ConfidenceTier, ConfigError, TierTable};

use crate::batch::{run_batch, BatchError, BatchOptions, BatchOutcome};
use crate::settings::AnalysisSettings;
use crate::sizing::{
    standard_examples, ExampleResult, PortfolioConfig, PortfolioDistribution,
    PositionSizingCalculator,
};
use crate::stress::{run_stress_tests, standard_scenarios, StressOutcome, STRESS_SIMULATIONS};

/// Trades in the expected-distribution projection of the sizing section.
pub const ANALYSIS_PROJECTION_TRADES: usize = 100;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("invalid portfolio configuration: {0}")]
    Portfolio(#[from] ConfigError),
    #[error(transparent)]
    Batch(#[from] BatchError),
}

/// Grade of the median return on capital.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoiOutlook {
    /// Above 200 %.
    Excellent,
    /// Above 100 %.
    VeryGood,
    /// Above 50 %.
    Good,
    /// Above 0 %.
    Modest,
    Negative,
}

impl RoiOutlook {
    pub fn from_roi_pct(roi: f64) -> Self {
        if roi > 200.0 {
            RoiOutlook::Excellent
        } else if roi > 100.0 {
            RoiOutlook::VeryGood
        } else if roi > 50.0 {
            RoiOutlook::Good
        } else if roi > 0.0 {
            RoiOutlook::Modest
        } else {
            RoiOutlook::Negative
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RoiOutlook::Excellent => "EXCELLENT",
            RoiOutlook::VeryGood => "VERY GOOD",
            RoiOutlook::Good => "GOOD",
            RoiOutlook::Modest => "MODEST",
            RoiOutlook::Negative => "NEGATIVE",
        }
    }
}

/// Grade of the median maximum drawdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawdownRisk {
    /// Below 15 %.
    Low,
    /// Below 30 %.
    Moderate,
    High,
}

impl DrawdownRisk {
    pub fn from_drawdown_pct(dd: f64) -> Self {
        if dd < 15.0 {
            DrawdownRisk::Low
        } else if dd < 30.0 {
            DrawdownRisk::Moderate
        } else {
            DrawdownRisk::High
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DrawdownRisk::Low => "LOW RISK",
            DrawdownRisk::Moderate => "MODERATE RISK",
            DrawdownRisk::High => "HIGH RISK",
        }
    }
}

/// Median-case summary and grades.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub starting_capital: f64,
    pub median_final_capital: f64,
    pub median_pnl: f64,
    /// Median PnL over starting capital, percent.
    pub roi_pct: f64,
    pub median_max_drawdown_pct: f64,
    pub p95_max_drawdown_pct: f64,
    pub probability_of_profit: f64,
    pub avg_longest_loss_streak: f64,
    pub base_positions: TierTable<f64>,
    pub outlook: RoiOutlook,
    pub risk: DrawdownRisk,
}

impl Recommendation {
    pub fn from_batch(
        starting_capital: f64,
        outcome: &BatchOutcome,
        calculator: &PositionSizingCalculator,
    ) -> Self {
        let analysis = &outcome.analysis;
        let median_pnl = analysis.total_pnl.median;
        let roi_pct = median_pnl / starting_capital * 100.0;
        let median_max_drawdown_pct = analysis.max_drawdown_pct.median;
        Self {
            starting_capital,
            median_final_capital: analysis.final_capital.median,
            median_pnl,
            roi_pct,
            median_max_drawdown_pct,
            p95_max_drawdown_pct: analysis.max_drawdown_pct.percentiles.p95,
            probability_of_profit: analysis.probability_of_profit,
            avg_longest_loss_streak: analysis.longest_loss_streak.mean,
            base_positions: TierTable::new(
                calculator.base_position_size(ConfidenceTier::High),
                calculator.base_position_size(ConfidenceTier::Medium),
                calculator.base_position_size(ConfidenceTier::Low),
            ),
            outlook: RoiOutlook::from_roi_pct(roi_pct),
            risk: DrawdownRisk::from_drawdown_pct(median_max_drawdown_pct),
        }
    }
}

/// Everything one full analysis produces.
#[derive(Debug, Clone)]
pub struct FullAnalysis {
    pub calculator: PositionSizingCalculator,
    pub distribution: PortfolioDistribution,
    pub examples: Vec<ExampleResult>,
    pub simulation: BatchOutcome,
    pub stress: Vec<StressOutcome>,
    pub recommendation: Recommendation,
}

/// Run sizing, the baseline batch and the stress scenarios on one settings file.
///
/// The portfolio is sized at the simulation's starting capital. Stress
/// scenarios use at most [`STRESS_SIMULATIONS`] trajectories each.
pub fn run_full_analysis(
    settings: &AnalysisSettings,
    options: &BatchOptions<'_>,
) -> Result<FullAnalysis, AnalysisError> {
    let capital = settings.simulation.initial_capital;
    let calculator = PositionSizingCalculator::new(PortfolioConfig {
        total_capital: capital,
        ..settings.portfolio.clone()
    })?;
    let distribution = calculator.expected_distribution(ANALYSIS_PROJECTION_TRADES);
    let examples = calculator.worked_examples(&standard_examples());

    info!(capital, "running baseline simulation");
    let simulation = run_batch(&settings.stats, &settings.simulation, options)?;

    let stress_simulations = settings.simulation.num_simulations.min(STRESS_SIMULATIONS);
    let scenarios = standard_scenarios(&settings.stats, &settings.simulation, stress_simulations);
    // Progress is reported for the baseline only.
    let mut stress_options = BatchOptions::default().with_threads(options.threads);
    stress_options.cancel = options.cancel;
    let stress = run_stress_tests(&scenarios, &stress_options)?;

    let recommendation = Recommendation::from_batch(capital, &simulation, &calculator);
    info!(
        roi_pct = recommendation.roi_pct,
        median_max_drawdown_pct = recommendation.median_max_drawdown_pct,
        "analysis complete"
    );

    Ok(FullAnalysis {
        calculator,
        distribution,
        examples,
        simulation,
        stress,
        recommendation,
    })
}
