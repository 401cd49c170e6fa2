use std::time::Duration;

use crate::config::{MAX_RETRY_ATTEMPTS, RETRY_DELAY_MS};

/// Bounded retry with linear backoff: the delay after attempt `n` is
/// `base_delay * (n + 1)`. No jitter and no cap, so `max_retries` and
/// `base_delay` bound the worst case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// `attempt` is 0-based; attempt 0 is the first send.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }

    pub fn backoff_duration(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt.saturating_add(1))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(MAX_RETRY_ATTEMPTS, Duration::from_millis(RETRY_DELAY_MS))
    }
}
