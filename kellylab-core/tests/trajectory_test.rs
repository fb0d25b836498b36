//! Integration tests for the trajectory engine.
//!
//! Tests:
//! 1. Single forced win with compounding: exact final capital
//! 2. Forced catastrophic loss: ruin after the first trade
//!    (overshooting below zero and landing exactly on zero)
//! 3. Position cap binds before the Kelly fraction
//! 4. Costs flow through the default outcome model

use kellylab_core::domain::{ConfidenceTier, StrategyStats, TierTable};
use kellylab_core::engine::{TrajectorySimulator, TrajectoryStatus};
use kellylab_core::outcome::{LogNormalOutcome, OutcomeModel, TradeDraw, TransactionCosts};
use kellylab_core::rng::RngHierarchy;
use kellylab_core::SimulationConfig;
use rand::Rng;

/// Outcome model that always returns the same draw.
struct ForcedOutcome {
    pnl_per_unit: f64,
    is_winner: bool,
}

impl OutcomeModel for ForcedOutcome {
    fn draw<R: Rng + ?Sized>(&self, _tier: ConfidenceTier, _rng: &mut R) -> TradeDraw {
        TradeDraw {
            pnl_per_unit: self.pnl_per_unit,
            is_winner: self.is_winner,
        }
    }
}

fn high_only_stats() -> StrategyStats {
    StrategyStats::uniform(0.5, 10.0, 5.0, TierTable::new(1.0, 0.0, 0.0))
}

fn config(num_trades: usize, kelly: f64, cap: f64) -> SimulationConfig {
    SimulationConfig {
        num_simulations: 1,
        num_trades,
        initial_capital: 1000.0,
        use_compounding: true,
        kelly_fractions: TierTable::splat(kelly),
        max_position_pct: cap,
        ..Default::default()
    }
}

#[test]
fn single_forced_win_scales_by_position_over_capital() {
    let stats = high_only_stats();
    let config = config(1, 0.1, 0.2);
    let model = ForcedOutcome {
        pnl_per_unit: 10.0,
        is_winner: true,
    };
    let result = TrajectorySimulator::new(&stats, &config, &model)
        .run_indexed(&RngHierarchy::new(7), 0);

    // Position 1000 × 0.1 = 100; trade PnL = 10 × (100 / 1000) = 1.
    assert!((result.final_capital - 1001.0).abs() < 1e-9);
    assert_eq!(result.equity_curve.len(), 2);
    assert_eq!(result.total_wins, 1);
    assert_eq!(result.total_losses, 0);
    assert_eq!(result.longest_win_streak, 1);
    assert!(result.profit_factor.is_infinite());
    assert_eq!(result.status, TrajectoryStatus::Completed);
}

#[test]
fn forced_catastrophic_loss_ruins_on_first_trade() {
    let stats = high_only_stats();
    let config = config(100, 0.5, 1.0);
    let model = ForcedOutcome {
        pnl_per_unit: -2000.0,
        is_winner: false,
    };
    let result = TrajectorySimulator::new(&stats, &config, &model)
        .run_indexed(&RngHierarchy::new(7), 0);

    assert_eq!(result.equity_curve, vec![1000.0, 0.0]);
    assert_eq!(result.final_capital, 0.0);
    assert_eq!(result.status, TrajectoryStatus::Ruined);
    assert_eq!(result.trades_executed(), 1);
    assert_eq!(result.longest_loss_streak, 1);
    assert!((result.max_drawdown - 1000.0).abs() < 1e-9);
    assert!((result.max_drawdown_pct - 100.0).abs() < 1e-9);
    assert_eq!(result.profit_factor, 0.0);
}

#[test]
fn loss_landing_exactly_on_zero_is_ruin() {
    let stats = high_only_stats();
    let config = config(50, 1.0, 1.0);
    let model = ForcedOutcome {
        pnl_per_unit: -1000.0,
        is_winner: false,
    };
    let result = TrajectorySimulator::new(&stats, &config, &model)
        .run_indexed(&RngHierarchy::new(7), 0);

    // Position 1000 × 1.0 = 1000; trade PnL = -1000 × (1000 / 1000) = -1000.
    assert_eq!(result.equity_curve, vec![1000.0, 0.0]);
    assert_eq!(result.final_capital, 0.0);
    assert_eq!(result.status, TrajectoryStatus::Ruined);
    assert_eq!(result.trades_executed(), 1);
}

#[test]
fn position_cap_binds_before_kelly_fraction() {
    let stats = high_only_stats();
    let config = config(1, 0.5, 0.2);
    let model = ForcedOutcome {
        pnl_per_unit: 100.0,
        is_winner: true,
    };
    let result = TrajectorySimulator::new(&stats, &config, &model)
        .run_indexed(&RngHierarchy::new(1), 0);

    // min(1000 × 0.5, 1000 × 0.2) = 200 → PnL 100 × 0.2 = 20.
    assert!((result.final_capital - 1020.0).abs() < 1e-9);
}

#[test]
fn frictionless_wins_are_never_negative() {
    let stats = high_only_stats();
    let config = config(300, 0.1, 0.2);
    let model = LogNormalOutcome::with_parts(
        &stats,
        TierTable::new(1.0, 1.0, 1.0),
        TransactionCosts::frictionless(),
    )
    .unwrap();
    let result = TrajectorySimulator::new(&stats, &config, &model)
        .run_indexed(&RngHierarchy::new(3), 0);

    assert_eq!(result.total_losses, 0);
    assert!(result.final_capital > config.initial_capital);
    assert!(result
        .equity_curve
        .windows(2)
        .all(|pair| pair[1] >= pair[0]));
    assert_eq!(result.max_drawdown, 0.0);
}

#[test]
fn costs_turn_certain_wins_into_smaller_gains() {
    let stats = high_only_stats();
    let config = config(200, 0.1, 0.2);
    let hierarchy = RngHierarchy::new(11);
    let certain = TierTable::new(1.0, 1.0, 1.0);

    let free = LogNormalOutcome::with_parts(&stats, certain, TransactionCosts::frictionless())
        .unwrap();
    let costly = LogNormalOutcome::with_parts(&stats, certain, TransactionCosts::new(0.01, 0.002))
        .unwrap();

    let free_result = TrajectorySimulator::new(&stats, &config, &free).run_indexed(&hierarchy, 0);
    let costly_result =
        TrajectorySimulator::new(&stats, &config, &costly).run_indexed(&hierarchy, 0);

    assert!(costly_result.final_capital < free_result.final_capital);
}
