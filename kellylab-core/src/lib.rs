//! KellyLab Core: tier-aware Kelly sizing and single-trajectory Monte Carlo.
//!
//! This crate contains the per-path simulation machinery:
//! - Domain types (confidence tiers, per-tier tables, strategy statistics)
//! - Simulation configuration and input validation
//! - Deterministic RNG hierarchy (one independent stream per trajectory)
//! - Confidence sampler, position sizer, log-normal outcome model
//! - Trajectory engine (state machine + simulator)
//! - Descriptive statistics shared with the aggregation layer

pub mod config;
pub mod domain;
pub mod engine;
pub mod outcome;
pub mod rng;
pub mod sampler;
pub mod sizing;
pub mod statistics;

pub use config::{validate_inputs, ConfigError, SimulationConfig};
pub use domain::{ConfidenceTier, StrategyStats, TierStats, TierTable};
pub use engine::{TrajectoryResult, TrajectorySimulator, TrajectoryState, TrajectoryStatus};
pub use outcome::{LogNormalOutcome, OutcomeModel, TradeDraw, TransactionCosts};
pub use rng::RngHierarchy;
pub use sampler::ConfidenceSampler;
pub use sizing::PositionSizer;
