//! Parallel batch runner: M independent trajectories, one barrier, one aggregate.
//!
//! Each trajectory draws from its own stream derived from
//! `(master_seed, "trajectory", index)`, so results are bit-identical for a
//! given seed whatever the thread count or scheduling order. Rayon's ordered
//! `collect` keeps results indexed by submission order, which is what sample
//! trajectory selection relies on.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use kellylab_core::{
    validate_inputs, ConfigError, LogNormalOutcome, RngHierarchy, SimulationConfig, StrategyStats,
    TrajectoryResult, TrajectorySimulator,
};

use crate::aggregation::{AggregateAnalysis, AggregateError, AggregationEngine};

/// Divergence (absolute, in win-probability units) above which a warning is logged.
pub const WIN_RATE_DIVERGENCE_WARN: f64 = 0.01;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
    #[error("batch cancelled after {completed} of {total} trajectories")]
    Cancelled { completed: usize, total: usize },
    #[error("batch incomplete: expected {expected} trajectories, collected {collected}")]
    Incomplete { expected: usize, collected: usize },
    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}

/// Progress snapshot passed to the callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    pub completed: usize,
    pub total: usize,
}

/// Execution knobs that do not affect results.
#[derive(Default)]
pub struct BatchOptions<'a> {
    /// Worker count. `None` uses rayon's global pool.
    pub threads: Option<usize>,
    /// Cooperative cancellation; checked before each trajectory starts.
    pub cancel: Option<&'a AtomicBool>,
    /// Called from worker threads roughly every 1% of the batch and at the end.
    pub progress: Option<&'a (dyn Fn(BatchProgress) + Sync)>,
}

impl<'a> BatchOptions<'a> {
    pub fn with_threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_cancel(mut self, cancel: &'a AtomicBool) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn with_progress(mut self, progress: &'a (dyn Fn(BatchProgress) + Sync)) -> Self {
        self.progress = Some(progress);
        self
    }
}

/// Expected win probability under the stats table vs. the outcome model table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WinRateDiagnostics {
    pub stats_expected_win_rate: f64,
    pub model_expected_win_rate: f64,
    /// model − stats.
    pub win_rate_divergence: f64,
}

impl WinRateDiagnostics {
    pub fn compute(stats: &StrategyStats, config: &SimulationConfig) -> Self {
        let stats_expected_win_rate = stats.expected_win_rate();
        let model_expected_win_rate = config.expected_model_win_rate(&stats.distribution);
        Self {
            stats_expected_win_rate,
            model_expected_win_rate,
            win_rate_divergence: model_expected_win_rate - stats_expected_win_rate,
        }
    }

    pub fn is_material(&self) -> bool {
        self.win_rate_divergence.abs() > WIN_RATE_DIVERGENCE_WARN
    }
}

/// One full trajectory kept for charting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleTrajectory {
    pub index: usize,
    pub final_capital: f64,
    pub equity_curve: Vec<f64>,
    pub drawdown_curve: Vec<f64>,
}

impl SampleTrajectory {
    fn from_result(index: usize, result: &TrajectoryResult) -> Self {
        Self {
            index,
            final_capital: result.final_capital,
            equity_curve: result.equity_curve.clone(),
            drawdown_curve: result.drawdown_curve.clone(),
        }
    }
}

/// Everything one batch produces.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub analysis: AggregateAnalysis,
    pub samples: Vec<SampleTrajectory>,
    pub diagnostics: WinRateDiagnostics,
    pub elapsed: Duration,
}

/// Indices 0, M/4, M/2, 3M/4, M−1, ascending and deduplicated.
pub fn sample_indices(total: usize) -> Vec<usize> {
    if total == 0 {
        return Vec::new();
    }
    let mut indices = vec![0, total / 4, total / 2, 3 * total / 4, total - 1];
    indices.sort_unstable();
    indices.dedup();
    indices
}

/// Completed-count interval between progress callbacks: every 1% of the batch.
pub fn progress_stride(total: usize) -> usize {
    (total / 100).max(1)
}

/// Validate inputs, simulate `config.num_simulations` trajectories in parallel,
/// and aggregate once every trajectory has finished.
pub fn run_batch(
    stats: &StrategyStats,
    config: &SimulationConfig,
    options: &BatchOptions<'_>,
) -> Result<BatchOutcome, BatchError> {
    validate_inputs(stats, config)?;

    let diagnostics = WinRateDiagnostics::compute(stats, config);
    if diagnostics.is_material() {
        warn!(
            stats = diagnostics.stats_expected_win_rate,
            model = diagnostics.model_expected_win_rate,
            "tier win probabilities diverge from historical win rates"
        );
    }

    info!(
        simulations = config.num_simulations,
        trades = config.num_trades,
        capital = config.initial_capital,
        compounding = config.use_compounding,
        seed = config.master_seed,
        "starting batch"
    );
    let start = Instant::now();

    let results = match options.threads {
        Some(threads) if threads > 0 => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|e| BatchError::ThreadPool(e.to_string()))?;
            pool.install(|| simulate_all(stats, config, options))?
        }
        _ => simulate_all(stats, config, options)?,
    };

    // Barrier: aggregation needs the complete set.
    if results.len() != config.num_simulations {
        return Err(BatchError::Incomplete {
            expected: config.num_simulations,
            collected: results.len(),
        });
    }

    let analysis = AggregationEngine::new(config.initial_capital)?.analyze(&results)?;
    let samples = sample_indices(results.len())
        .into_iter()
        .map(|i| SampleTrajectory::from_result(i, &results[i]))
        .collect();

    let elapsed = start.elapsed();
    info!(
        elapsed_ms = elapsed.as_millis() as u64,
        median_final_capital = analysis.final_capital.median,
        probability_of_profit = analysis.probability_of_profit,
        probability_of_ruin = analysis.probability_of_ruin,
        "batch complete"
    );

    Ok(BatchOutcome {
        analysis,
        samples,
        diagnostics,
        elapsed,
    })
}

fn simulate_all(
    stats: &StrategyStats,
    config: &SimulationConfig,
    options: &BatchOptions<'_>,
) -> Result<Vec<TrajectoryResult>, BatchError> {
    let outcome = LogNormalOutcome::new(stats, config)?;
    let simulator = TrajectorySimulator::new(stats, config, &outcome);
    let hierarchy = RngHierarchy::new(config.master_seed);

    let total = config.num_simulations;
    let stride = progress_stride(total);
    let keep_curves = sample_indices(total);
    let completed = AtomicUsize::new(0);
    let cancelled = || options.cancel.is_some_and(|flag| flag.load(Ordering::Relaxed));

    debug!(threads = rayon::current_num_threads(), "dispatching trajectories");

    let results: Option<Vec<TrajectoryResult>> = (0..total)
        .into_par_iter()
        .map(|index| {
            if cancelled() {
                return None;
            }
            let mut result = simulator.run_indexed(&hierarchy, index);
            // Only sample trajectories need their curves after the barrier.
            if keep_curves.binary_search(&index).is_err() {
                result.discard_curves();
            }
            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(progress) = options.progress {
                if done % stride == 0 || done == total {
                    progress(BatchProgress {
                        completed: done,
                        total,
                    });
                }
            }
            Some(result)
        })
        .collect();

    match results {
        Some(results) => Ok(results),
        None => {
            let completed = completed.load(Ordering::Relaxed);
            info!(completed, total, "batch cancelled");
            Err(BatchError::Cancelled { completed, total })
        }
    }
}
