//! Backoff policy for background loops that hit transient errors
//!
//! Provides an exponential, capped delay schedule and an upper bound on
//! consecutive failures after which a loop should give up and report.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Exponential backoff policy
///
/// Attempt `n` (1-based) waits `delay * multiplier^(n-1)`, never more than
/// `max_delay`. A loop gives up after `max_attempts` consecutive failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    #[serde(with = "duration_ms")]
    pub delay: Duration,
    #[serde(with = "duration_ms")]
    pub max_delay: Duration,
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 8,
            delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            multiplier: 2,
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after the `attempt`-th consecutive failure (1-based)
    ///
    /// # Examples
    /// ```rust
    /// use tereus_std::core::retry::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy::default();
    /// assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(100));
    /// assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(400));
    /// ```
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        let exponent = attempt.saturating_sub(1).min(u32::MAX as usize) as u32;
        let factor = self.multiplier.max(1).saturating_pow(exponent);
        self.delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Whether `failures` consecutive failures exhaust this policy
    pub fn is_exhausted(&self, failures: usize) -> bool {
        failures >= self.max_attempts.max(1)
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis().min(u64::MAX as u128) as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}
