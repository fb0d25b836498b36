//! Trajectory engine: per-path state machine and the simulator that drives it.
//!
//! States: RUNNING → {RUNNING, RUINED, COMPLETED}. A trajectory starts with
//! capital C₀ and an equity curve of `[C₀]`, applies up to N trades, and
//! terminates early the first time capital reaches zero.

pub mod state;
pub mod trajectory;

pub use state::{TrajectoryResult, TrajectoryState, TrajectoryStatus};
pub use trajectory::TrajectorySimulator;
