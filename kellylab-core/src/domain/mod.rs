//! Domain types: confidence tiers and the strategy statistics that drive sampling.

pub mod stats;
pub mod tier;

pub use stats::{StrategyStats, TierStats};
pub use tier::{ConfidenceTier, TierTable};
