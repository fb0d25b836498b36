//! Per-trajectory random streams derived from one master seed.
//!
//! Trajectory `k` seeds its own `StdRng` from BLAKE3(master, stream, k), so no
//! generator is ever shared between workers and a batch replays exactly
//! whatever the worker count or completion order.

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Stream label for per-trajectory generators.
pub const TRAJECTORY_STREAM: &str = "trajectory";

/// Master seed plus the hash-based derivation of every sub-stream.
#[derive(Debug, Clone)]
pub struct RngHierarchy {
    master_seed: u64,
}

impl RngHierarchy {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// First 8 bytes (little-endian) of BLAKE3(master ‖ stream ‖ index).
    pub fn sub_seed(&self, stream: &str, index: u64) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.master_seed.to_le_bytes());
        hasher.update(stream.as_bytes());
        hasher.update(&index.to_le_bytes());
        let hash = hasher.finalize();
        let mut seed = [0u8; 8];
        seed.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(seed)
    }

    pub fn rng_for(&self, stream: &str, index: u64) -> StdRng {
        StdRng::seed_from_u64(self.sub_seed(stream, index))
    }

    /// Private generator for trajectory `index`.
    pub fn trajectory_rng(&self, index: usize) -> StdRng {
        self.rng_for(TRAJECTORY_STREAM, index as u64)
    }
}
