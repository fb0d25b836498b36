//! Stress scenarios: fixed perturbations of the baseline run through the batch runner.

use serde::{Deserialize, Serialize};
use tracing::info;

use kellylab_core::{SimulationConfig, StrategyStats, TierTable};

use crate::batch::{run_batch, BatchError, BatchOptions};

/// Trajectory count used for each scenario unless overridden.
pub const STRESS_SIMULATIONS: usize = 5_000;

/// Win probability applied everywhere by the lower-win-rate scenario.
pub const STRESSED_WIN_RATE: f64 = 0.50;

/// Slippage applied by the higher-slippage scenario.
pub const STRESSED_SLIPPAGE: f64 = 0.01;

pub const HALF_KELLY: TierTable<f64> = TierTable::new(0.073, 0.055, 0.0275);
pub const FULL_KELLY: TierTable<f64> = TierTable::new(0.439, 0.330, 0.165);

/// A named pair of inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct StressScenario {
    pub name: &'static str,
    pub stats: StrategyStats,
    pub config: SimulationConfig,
}

/// Headline numbers for one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressOutcome {
    pub name: String,
    pub median_final_capital: f64,
    pub median_pnl: f64,
    pub median_max_drawdown_pct: f64,
    pub probability_of_profit: f64,
    pub probability_of_ruin: f64,
}

/// Baseline plus the five standard perturbations, each with `num_simulations`
/// trajectories.
pub fn standard_scenarios(
    stats: &StrategyStats,
    base: &SimulationConfig,
    num_simulations: usize,
) -> Vec<StressScenario> {
    let base = SimulationConfig {
        num_simulations,
        ..base.clone()
    };
    let scenario = |name, stats: StrategyStats, config: SimulationConfig| StressScenario {
        name,
        stats,
        config,
    };

    vec![
        scenario("Baseline", stats.clone(), base.clone()),
        scenario(
            "Conservative (No Compounding)",
            stats.clone(),
            SimulationConfig {
                use_compounding: false,
                ..base.clone()
            },
        ),
        scenario(
            "Lower Win Rate (50%)",
            stats.with_win_rate(STRESSED_WIN_RATE),
            SimulationConfig {
                tier_win_probabilities: TierTable::splat(STRESSED_WIN_RATE),
                ..base.clone()
            },
        ),
        scenario(
            "Higher Slippage (1%)",
            stats.clone(),
            SimulationConfig {
                slippage_pct: STRESSED_SLIPPAGE,
                ..base.clone()
            },
        ),
        scenario(
            "Half Kelly (More Conservative)",
            stats.clone(),
            SimulationConfig {
                kelly_fractions: HALF_KELLY,
                ..base.clone()
            },
        ),
        scenario(
            "Full Kelly (Aggressive)",
            stats.clone(),
            SimulationConfig {
                kelly_fractions: FULL_KELLY,
                ..base
            },
        ),
    ]
}

/// Run every scenario in order. Stops at the first failure.
pub fn run_stress_tests(
    scenarios: &[StressScenario],
    options: &BatchOptions<'_>,
) -> Result<Vec<StressOutcome>, BatchError> {
    scenarios
        .iter()
        .map(|scenario| {
            info!(scenario = scenario.name, "running stress scenario");
            let outcome = run_batch(&scenario.stats, &scenario.config, options)?;
            let analysis = outcome.analysis;
            Ok(StressOutcome {
                name: scenario.name.to_string(),
                median_final_capital: analysis.final_capital.median,
                median_pnl: analysis.total_pnl.median,
                median_max_drawdown_pct: analysis.max_drawdown_pct.median,
                probability_of_profit: analysis.probability_of_profit,
                probability_of_ruin: analysis.probability_of_ruin,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_scenarios_perturb_one_thing_each() {
        let stats = StrategyStats::default();
        let base = SimulationConfig::default();
        let scenarios = standard_scenarios(&stats, &base, STRESS_SIMULATIONS);
        assert_eq!(scenarios.len(), 6);
        assert!(scenarios
            .iter()
            .all(|s| s.config.num_simulations == STRESS_SIMULATIONS));

        assert_eq!(scenarios[0].config.kelly_fractions, base.kelly_fractions);
        assert!(!scenarios[1].config.use_compounding);
        assert_eq!(scenarios[2].stats.expected_win_rate(), 0.5);
        assert_eq!(scenarios[2].config.tier_win_probabilities, TierTable::splat(0.5));
        assert_eq!(scenarios[3].config.slippage_pct, 0.01);
        assert_eq!(scenarios[4].config.kelly_fractions, HALF_KELLY);
        assert_eq!(scenarios[5].config.kelly_fractions, FULL_KELLY);
        assert_eq!(scenarios[5].config.master_seed, base.master_seed);
    }

    #[test]
    fn small_stress_run_reports_every_scenario() {
        let base = SimulationConfig {
            num_trades: 40,
            ..Default::default()
        };
        let scenarios = standard_scenarios(&StrategyStats::default(), &base, 64);
        let outcomes = run_stress_tests(&scenarios, &BatchOptions::default()).unwrap();
        assert_eq!(outcomes.len(), 6);
        for outcome in &outcomes {
            assert!((0.0..=100.0).contains(&outcome.probability_of_profit));
            assert!((0.0..=100.0).contains(&outcome.probability_of_ruin));
            assert!(outcome.median_final_capital >= 0.0);
        }
    }
}
