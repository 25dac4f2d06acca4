//! Linear backoff with a ceiling.

use std::time::Duration;

/// Delay before the `attempt`-th reconnect: `min(attempt * step, cap)`.
///
/// Attempt 0 means nothing has failed yet and maps to no delay.
pub fn calculate_backoff(attempt: u32, step_ms: u64, cap_ms: u64) -> Duration {
    let delay_ms = u64::from(attempt).saturating_mul(step_ms);
    Duration::from_millis(delay_ms.min(cap_ms))
}

/// Reconnect schedule used by the cache supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub step: Duration,
    pub cap: Duration,
}

impl ReconnectPolicy {
    pub fn new(step: Duration, cap: Duration) -> Self {
        Self { step, cap }
    }

    /// Delay to wait after `failures` consecutive failed attempts.
    pub fn delay_for(&self, failures: u32) -> Duration {
        calculate_backoff(
            failures,
            self.step.as_millis() as u64,
            self.cap.as_millis() as u64,
        )
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            step: Duration::from_millis(50),
            cap: Duration::from_millis(2000),
        }
    }
}
