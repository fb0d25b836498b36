//! Trajectory simulator: one full path of N sequential trades.
//!
//! Per trade:
//! 1. draw the confidence tier,
//! 2. size the position from current capital (compounding) or from C₀,
//! 3. draw the per-unit PnL and win flag,
//! 4. scale: trade PnL = per-unit PnL × (position / C₀),
//! 5. fold the trade into `TrajectoryState`; stop on ruin.
//!
//! The trade sequence is inherently serial. Parallelism lives one level up,
//! across independent trajectories.

use rand::Rng;

use crate::config::SimulationConfig;
use crate::domain::StrategyStats;
use crate::outcome::OutcomeModel;
use crate::rng::RngHierarchy;
use crate::sampler::ConfidenceSampler;
use crate::sizing::PositionSizer;

use super::state::{TrajectoryResult, TrajectoryState, TrajectoryStatus};

/// Composes sampler, sizer and outcome model into a single path.
///
/// Holds only shared, read-only inputs; every call to `run` owns its own
/// state and random stream.
#[derive(Debug, Clone)]
pub struct TrajectorySimulator<'a, O: OutcomeModel> {
    config: &'a SimulationConfig,
    sampler: ConfidenceSampler,
    sizer: PositionSizer,
    outcome: &'a O,
}

impl<'a, O: OutcomeModel> TrajectorySimulator<'a, O> {
    pub fn new(stats: &StrategyStats, config: &'a SimulationConfig, outcome: &'a O) -> Self {
        Self {
            config,
            sampler: ConfidenceSampler::from_stats(stats),
            sizer: PositionSizer::from_config(config),
            outcome,
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        self.config
    }

    /// Simulate one trajectory with the given random stream.
    pub fn run<R: Rng + ?Sized>(&self, rng: &mut R) -> TrajectoryResult {
        let initial_capital = self.config.initial_capital;
        let mut state = TrajectoryState::new(initial_capital, self.config.num_trades);

        for _ in 0..self.config.num_trades {
            let tier = self.sampler.sample(rng);

            let sizing_base = if self.config.use_compounding {
                state.capital()
            } else {
                initial_capital
            };
            let position_size = self.sizer.size(sizing_base, tier);

            let draw = self.outcome.draw(tier, rng);
            let trade_pnl = draw.pnl_per_unit * (position_size / initial_capital);

            if state.apply_trade(trade_pnl, draw.is_winner) == TrajectoryStatus::Ruined {
                break;
            }
        }

        state.finish()
    }

    /// Simulate trajectory `index` on its own stream derived from the hierarchy.
    pub fn run_indexed(&self, hierarchy: &RngHierarchy, index: usize) -> TrajectoryResult {
        let mut rng = hierarchy.trajectory_rng(index);
        self.run(&mut rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConfidenceTier, TierTable};
    use crate::outcome::{LogNormalOutcome, TradeDraw};

    struct Fixed(TradeDraw);

    impl OutcomeModel for Fixed {
        fn draw<R: Rng + ?Sized>(&self, _tier: ConfidenceTier, _rng: &mut R) -> TradeDraw {
            self.0
        }
    }

    fn small_config(num_trades: usize) -> SimulationConfig {
        SimulationConfig {
            num_simulations: 1,
            num_trades,
            ..Default::default()
        }
    }

    #[test]
    fn equity_curve_has_one_entry_per_trade() {
        let stats = StrategyStats::default();
        let config = small_config(50);
        let model = LogNormalOutcome::new(&stats, &config).unwrap();
        let sim = TrajectorySimulator::new(&stats, &config, &model);
        let result = sim.run_indexed(&RngHierarchy::new(1), 0);

        assert_eq!(result.equity_curve.len(), result.trades_executed() + 1);
        assert_eq!(result.drawdown_curve.len(), result.equity_curve.len());
        assert_eq!(result.equity_curve[0], 1000.0);
        assert_eq!(*result.equity_curve.last().unwrap(), result.final_capital);
    }

    #[test]
    fn compounding_grows_position_with_capital() {
        let stats = StrategyStats::uniform(0.5, 1.0, 1.0, TierTable::new(1.0, 0.0, 0.0));
        let mut config = small_config(2);
        config.kelly_fractions = TierTable::splat(0.1);
        config.max_position_pct = 1.0;
        let model = Fixed(TradeDraw {
            pnl_per_unit: 1000.0,
            is_winner: true,
        });

        // Trade 1: 1000 × 0.1 = 100 → pnl 1000 × 0.1 = 100 → 1100.
        // Trade 2 (compounding): 1100 × 0.1 = 110 → pnl 1000 × 0.11 = 110 → 1210.
        let compounding = TrajectorySimulator::new(&stats, &config, &model)
            .run_indexed(&RngHierarchy::new(0), 0);
        assert!((compounding.final_capital - 1210.0).abs() < 1e-9);

        config.use_compounding = false;
        let flat = TrajectorySimulator::new(&stats, &config, &model)
            .run_indexed(&RngHierarchy::new(0), 0);
        assert!((flat.final_capital - 1200.0).abs() < 1e-9);
    }

    #[test]
    fn same_index_replays_identically() {
        let stats = StrategyStats::default();
        let config = small_config(200);
        let model = LogNormalOutcome::new(&stats, &config).unwrap();
        let sim = TrajectorySimulator::new(&stats, &config, &model);
        let hierarchy = RngHierarchy::new(99);
        assert_eq!(sim.run_indexed(&hierarchy, 5), sim.run_indexed(&hierarchy, 5));
        assert_ne!(
            sim.run_indexed(&hierarchy, 5).equity_curve,
            sim.run_indexed(&hierarchy, 6).equity_curve
        );
    }
}
