//! Retry policy with exponential backoff and jitter.
//!
//! The delay computation is a pure function of the policy, the attempt
//! number and an explicit jitter factor; randomness is sampled only in
//! [`RetryPolicy::jittered_delay`], keeping the rest of the engine
//! deterministic and testable.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Maximum fraction by which jitter stretches or shrinks a delay.
pub const JITTER_FRACTION: f64 = 0.2;

/// Per-strategy retry budget and backoff timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Attempts allowed per strategy before falling back.
    pub max_attempts: u32,

    /// Backoff base delay in milliseconds.
    pub base_delay_ms: u64,

    /// Backoff ceiling in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 2_000,
            max_delay_ms: 60_000,
        }
    }
}

impl RetryPolicy {
    /// Backoff delay before re-running attempt `attempt + 1`, given a
    /// jitter factor in `[-JITTER_FRACTION, +JITTER_FRACTION]`.
    ///
    /// The uncapped delay is `base * 2^(attempt - 1)` for the 1-based
    /// attempt that just failed, clamped to `max_delay_ms` before jitter
    /// is applied.
    pub fn delay_for(&self, attempt: u32, jitter: f64) -> Duration {
        let exponent = attempt.saturating_sub(1).min(32);
        let uncapped = self.base_delay_ms.saturating_mul(1u64 << exponent);
        let capped = uncapped.min(self.max_delay_ms) as f64;

        let jitter = jitter.clamp(-JITTER_FRACTION, JITTER_FRACTION);
        Duration::from_millis((capped * (1.0 + jitter)).round() as u64)
    }

    /// Backoff delay with jitter sampled uniformly at random.
    pub fn jittered_delay(&self, attempt: u32) -> Duration {
        let jitter = rand::thread_rng().gen_range(-JITTER_FRACTION..=JITTER_FRACTION);
        self.delay_for(attempt, jitter)
    }
}
