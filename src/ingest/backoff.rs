// Reconnect backoff schedule.
//
// Delay after the n-th consecutive failure is BASE^n seconds, capped at
// MAX_BACKOFF: 1, 2, 4, 8, 16, 32, 64, 120, 120 and so on. The loop
// retries forever; only the delay is bounded. No jitter.

use std::time::Duration;

/// Base of the exponential schedule, in seconds.
pub const BASE: u32 = 2;

/// Maximum backoff delay to cap exponential growth.
pub const MAX_BACKOFF: Duration = Duration::from_secs(120);

/// Smallest cap `with_max_delay` accepts.
pub const MIN_MAX_BACKOFF: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Must be at least 1; 1 gives a constant one-second retry.
    pub base: u32,
    pub max_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: BASE,
            max_delay: MAX_BACKOFF,
        }
    }
}

impl BackoffPolicy {
    pub fn with_max_delay(max_delay: Duration) -> Self {
        Self {
            max_delay: max_delay.max(MIN_MAX_BACKOFF),
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (0-based count of prior failures).
    pub fn delay(&self, attempt: u32) -> Duration {
        let secs = u64::from(self.base.max(1))
            .checked_pow(attempt)
            .unwrap_or(u64::MAX);
        Duration::from_secs(secs).min(self.max_delay)
    }

    /// Like `delay`, but never shorter than the source's own retry hint
    /// (the hint itself is still capped at `max_delay`).
    pub fn delay_with_hint(&self, attempt: u32, hint: Option<Duration>) -> Duration {
        let computed = self.delay(attempt);
        match hint {
            Some(hint) => computed.max(hint.min(self.max_delay)),
            None => computed,
        }
    }
}
