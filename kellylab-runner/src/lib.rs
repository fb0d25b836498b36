//! KellyLab Runner: batch orchestration, aggregation, stress tests, sizing, export.
//!
//! This crate builds on `kellylab-core` to provide:
//! - Cross-trajectory aggregation (percentiles, ruin and profit probabilities)
//! - Parallel batch runner with cancellation, progress and sample trajectories
//! - Stress scenarios over the baseline configuration
//! - Standalone portfolio position-sizing calculator with worked trade examples
//! - Fixed-horizon trading plan with outcome projection
//! - One-shot full analysis with graded recommendations
//! - TOML analysis settings
//! - JSON/CSV export and plain-text reports

pub mod aggregation;
pub mod analysis;
pub mod batch;
pub mod export;
pub mod plan;
pub mod report;
pub mod settings;
pub mod sizing;
pub mod stress;

pub use aggregation::{
    AggregateAnalysis, AggregateError, AggregationEngine, CentralSummary, MetricSummary,
    Percentiles, ProfitFactorSummary, PERCENTILE_RANKS,
};
pub use analysis::{
    run_full_analysis, AnalysisError, DrawdownRisk, FullAnalysis, Recommendation, RoiOutlook,
};
pub use batch::{
    progress_stride, run_batch, sample_indices, BatchError, BatchOptions, BatchOutcome, BatchProgress,
    SampleTrajectory, WinRateDiagnostics,
};
pub use export::{SimulationExport, SizingExport, SCHEMA_VERSION};
pub use plan::{PlanConfig, PlanError, PlanGenerator, TradingPlan};
pub use settings::{AnalysisSettings, SettingsError};
pub use sizing::{
    standard_examples, ExampleResult, PortfolioConfig, PortfolioDistribution, PositionDecision,
    PositionPlan, PositionRequest, PositionSizingCalculator, RejectReason, TradeExample,
};
pub use stress::{run_stress_tests, standard_scenarios, StressOutcome, StressScenario};
