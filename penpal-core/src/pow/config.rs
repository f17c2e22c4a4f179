//! Configuration for proof-of-work mining

use std::time::Duration;

/// Highest meaningful difficulty: the width of a SHA-256 digest.
pub const MAX_HASH_BITS: u32 = 256;

/// Configuration for the mining context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiningConfig {
    /// Hash attempts between cancellation/deadline checkpoints
    pub check_interval: u64,

    /// Hard ceiling on a single job's wall-clock time
    pub timeout: Duration,

    /// Lowest difficulty accepted by the supervisor
    pub min_difficulty: u32,

    /// Highest difficulty accepted by the supervisor
    pub max_difficulty: u32,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            check_interval: 1024,
            timeout: Duration::from_secs(60),
            min_difficulty: 1,
            max_difficulty: 64,
        }
    }
}

impl MiningConfig {
    /// Set the checkpoint interval (at least 1)
    pub fn with_check_interval(mut self, check_interval: u64) -> Self {
        self.check_interval = check_interval.max(1);
        self
    }

    /// Set the safety timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the accepted difficulty range
    ///
    /// Bounds are reordered if given backwards and capped at the hash width.
    pub fn with_difficulty_range(mut self, min: u32, max: u32) -> Self {
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        self.min_difficulty = lo.min(MAX_HASH_BITS);
        self.max_difficulty = hi.min(MAX_HASH_BITS);
        self
    }

    /// Clamp a user-chosen difficulty into the accepted range
    pub fn clamp_difficulty(&self, difficulty: u32) -> u32 {
        difficulty
            .max(self.min_difficulty)
            .min(self.max_difficulty)
    }
}
