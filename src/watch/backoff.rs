use std::time::Duration;

use crate::BackoffPolicy;

/// Retry delay state of one watch.
///
/// The k-th consecutive failure waits `min(base * multiplier^(k-1), max)`.
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: BackoffPolicy,
    current: Duration,
    consecutive_failures: u32,
}

impl Backoff {
    pub fn new(policy: BackoffPolicy) -> Self {
        Self {
            policy,
            current: policy.base_delay(),
            consecutive_failures: 0,
        }
    }

    /// Delay the next failure will wait.
    pub fn current_delay(&self) -> Duration {
        self.current
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Records a failure and returns how long to wait before retrying.
    pub fn on_failure(&mut self) -> Duration {
        let delay = self.current;
        let max = self.policy.max_delay();

        self.current = self
            .current
            .checked_mul(self.policy.multiplier)
            .unwrap_or(max)
            .min(max);
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);

        delay
    }

    pub fn reset(&mut self) {
        self.current = self.policy.base_delay();
        self.consecutive_failures = 0;
    }
}
