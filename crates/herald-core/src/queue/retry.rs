//! Retry policy: decides backoff delays.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Exponential backoff for failed deliveries.
///
/// A pure function of the retry count; no timers are held anywhere. The
/// rescheduled `send_at` is `now + delay_for(retry_count)` where
/// `retry_count` is the count *after* the failed attempt was recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Delay unit; the n-th retry waits `base_delay * multiplier^n`.
    #[serde(rename = "base_delay_secs", with = "secs")]
    pub base_delay: Duration,

    pub multiplier: f64,

    /// Upper bound for a single delay.
    #[serde(rename = "max_delay_secs", with = "secs")]
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    /// One minute doubling: 2m, 4m, 8m, ... capped at one day.
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(60),
            multiplier: 2.0,
            max_delay: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl RetryPolicy {
    /// Delay before the next attempt, given the retry count already recorded.
    ///
    /// With the default policy:
    /// - retry_count 1: 2 minutes
    /// - retry_count 2: 4 minutes
    /// - retry_count 3: 8 minutes
    pub fn delay_for(&self, retry_count: u32) -> Duration {
        let exponent = i32::try_from(retry_count).unwrap_or(i32::MAX);
        let secs = self.base_delay.as_secs_f64() * self.multiplier.powi(exponent);
        if !secs.is_finite() || secs >= self.max_delay.as_secs_f64() {
            return self.max_delay;
        }
        Duration::from_secs_f64(secs.max(0.0))
    }
}

mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
