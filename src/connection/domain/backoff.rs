//! Capped exponential backoff between connect tries.

use std::time::Duration;

/// Delay schedule between failed connect tries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    initial: Duration,
    max: Duration,
}

impl BackoffPolicy {
    /// Creates a policy starting at `initial` and capped at `max`.
    #[must_use]
    pub const fn new(initial: Duration, max: Duration) -> Self {
        Self { initial, max }
    }

    /// Returns the delay after the failed try numbered `attempt` (zero-based).
    ///
    /// The delay is `min(initial * 2^attempt, max)` and saturates instead of
    /// overflowing for large attempt numbers.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2_u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.initial
            .checked_mul(factor)
            .map_or(self.max, |delay| delay.min(self.max))
    }

    /// Returns the initial delay.
    #[must_use]
    pub const fn initial(&self) -> Duration {
        self.initial
    }

    /// Returns the delay cap.
    #[must_use]
    pub const fn max(&self) -> Duration {
        self.max
    }
}
