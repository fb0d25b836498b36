//! Criterion benchmarks for KellyLab hot paths.
//!
//! Benchmarks:
//! 1. Single trajectory (1000 trades, default inputs)
//! 2. Trajectory length scaling
//! 3. Outcome draws per tier

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use kellylab_core::domain::{ConfidenceTier, StrategyStats};
use kellylab_core::engine::TrajectorySimulator;
use kellylab_core::outcome::{LogNormalOutcome, OutcomeModel};
use kellylab_core::rng::RngHierarchy;
use kellylab_core::SimulationConfig;

fn bench_single_trajectory(c: &mut Criterion) {
    let stats = StrategyStats::default();
    let config = SimulationConfig::default();
    let model = LogNormalOutcome::new(&stats, &config).unwrap();
    let sim = TrajectorySimulator::new(&stats, &config, &model);
    let hierarchy = RngHierarchy::new(config.master_seed);

    c.bench_function("trajectory_1000_trades", |b| {
        let mut index = 0usize;
        b.iter(|| {
            index += 1;
            black_box(sim.run_indexed(&hierarchy, black_box(index)))
        })
    });
}

fn bench_trajectory_length(c: &mut Criterion) {
    let stats = StrategyStats::default();
    let mut group = c.benchmark_group("trajectory_length");
    for &num_trades in &[100usize, 1_000, 10_000] {
        let config = SimulationConfig {
            num_trades,
            ..Default::default()
        };
        let model = LogNormalOutcome::new(&stats, &config).unwrap();
        let sim = TrajectorySimulator::new(&stats, &config, &model);
        let hierarchy = RngHierarchy::new(config.master_seed);
        group.bench_with_input(BenchmarkId::from_parameter(num_trades), &num_trades, |b, _| {
            b.iter(|| black_box(sim.run_indexed(&hierarchy, 0)))
        });
    }
    group.finish();
}

fn bench_outcome_draws(c: &mut Criterion) {
    let stats = StrategyStats::default();
    let config = SimulationConfig::default();
    let model = LogNormalOutcome::new(&stats, &config).unwrap();
    let mut rng = RngHierarchy::new(1).trajectory_rng(0);

    let mut group = c.benchmark_group("outcome_draw");
    for tier in ConfidenceTier::ALL {
        group.bench_with_input(BenchmarkId::from_parameter(tier), &tier, |b, &tier| {
            b.iter(|| black_box(model.draw(black_box(tier), &mut rng)))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_single_trajectory,
    bench_trajectory_length,
    bench_outcome_draws
);
criterion_main!(benches);
