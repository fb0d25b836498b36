//! Property tests for aggregation invariants.
//!
//! 1. Percentiles are non-decreasing in rank and bounded by min/max
//! 2. Probabilities are percentages in [0, 100]
//! 3. Aggregation is independent of result order

use proptest::prelude::*;
use kellylab_core::{TrajectoryResult, TrajectoryState};
use kellylab_runner::aggregation::{AggregationEngine, MetricSummary};

fn arb_values() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-1.0e6..1.0e6_f64, 1..200)
}

fn arb_trades() -> impl Strategy<Value = Vec<(f64, bool)>> {
    prop::collection::vec((-300.0..300.0_f64, any::<bool>()), 0..30)
}

fn build(trades: &[(f64, bool)]) -> TrajectoryResult {
    let mut state = TrajectoryState::new(1000.0, trades.len());
    for &(pnl, won) in trades {
        state.apply_trade(pnl, won);
    }
    state.finish()
}

proptest! {
    #[test]
    fn percentiles_are_monotone_and_bounded(values in arb_values()) {
        let summary = MetricSummary::from_values(&values).unwrap();
        let points: Vec<f64> = summary.percentiles.iter().map(|(_, v)| v).collect();
        for pair in points.windows(2) {
            prop_assert!(pair[0] <= pair[1]);
        }
        prop_assert!(summary.min <= points[0]);
        prop_assert!(points[points.len() - 1] <= summary.max);
        prop_assert!(summary.min <= summary.median && summary.median <= summary.max);
        prop_assert!(summary.std >= 0.0);
    }

    #[test]
    fn probabilities_are_percentages(paths in prop::collection::vec(arb_trades(), 1..40)) {
        let results: Vec<_> = paths.iter().map(|t| build(t)).collect();
        let analysis = AggregationEngine::new(1000.0).unwrap().analyze(&results).unwrap();
        prop_assert!((0.0..=100.0).contains(&analysis.probability_of_profit));
        prop_assert!((0.0..=100.0).contains(&analysis.probability_of_ruin));
        prop_assert_eq!(
            analysis.profit_factor.finite_count + analysis.profit_factor.infinite_count,
            results.len()
        );
    }

    #[test]
    fn aggregation_ignores_result_order(paths in prop::collection::vec(arb_trades(), 1..40)) {
        let results: Vec<_> = paths.iter().map(|t| build(t)).collect();
        let mut reversed = results.clone();
        reversed.reverse();
        let engine = AggregationEngine::new(1000.0).unwrap();
        let forward = engine.analyze(&results).unwrap();
        let backward = engine.analyze(&reversed).unwrap();
        prop_assert_eq!(forward.final_capital.median, backward.final_capital.median);
        prop_assert_eq!(forward.final_capital.percentiles, backward.final_capital.percentiles);
        prop_assert_eq!(forward.probability_of_ruin, backward.probability_of_ruin);
        prop_assert_eq!(forward.ruined_count, backward.ruined_count);
    }
}
