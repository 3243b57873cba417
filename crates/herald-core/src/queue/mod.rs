//! Queue policy: how long a failed job waits before its next attempt.

mod retry;

pub use retry::RetryPolicy;
