//! Decision model: what happens to a job after a delivery attempt.
//!
//! The decider is a pure function of the job's retry bookkeeping and the
//! attempt result. Applying the decision (store writes) is somebody else's
//! job.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::attempt::AttemptResult;
use super::job::JobRecord;
use crate::queue::RetryPolicy;

/// Verdict for one processed job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    /// Delivered; job becomes `SENT`.
    Sent { provider_message_id: Option<String> },

    /// Delivery failed with budget left; job goes back to `QUEUED`.
    Retry {
        #[serde(with = "millis")]
        delay: Duration,
        reason: String,
    },

    /// Delivery failed and the retry budget is spent.
    Fail { reason: String },

    /// Internal error while processing; fail fast without retrying.
    Abort { reason: String },
}

/// Turns an attempt result into a [`Decision`].
pub trait Decider: Send + Sync {
    fn decide(&self, job: &JobRecord, result: &AttemptResult) -> Decision;
}

/// Retry while `retry_count + 1 < max_retries`, then give up.
#[derive(Debug, Clone, Default)]
pub struct DefaultDecider {
    retry_policy: RetryPolicy,
}

impl DefaultDecider {
    pub fn new(retry_policy: RetryPolicy) -> Self {
        Self { retry_policy }
    }
}

impl Decider for DefaultDecider {
    fn decide(&self, job: &JobRecord, result: &AttemptResult) -> Decision {
        match result {
            AttemptResult::Delivered {
                provider_message_id,
            } => Decision::Sent {
                provider_message_id: provider_message_id.clone(),
            },
            AttemptResult::Failed { reason } => {
                let next = job.retry_count + 1;
                if next >= job.max_retries {
                    Decision::Fail {
                        reason: reason.clone(),
                    }
                } else {
                    Decision::Retry {
                        delay: self.retry_policy.delay_for(next),
                        reason: reason.clone(),
                    }
                }
            }
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{JobDefaults, JobId, NewJob};
    use chrono::Utc;
    use rstest::rstest;
    use ulid::Ulid;

    fn job(retry_count: u32, max_retries: u32) -> JobRecord {
        let mut job = JobRecord::new(
            JobId::from_ulid(Ulid::new()),
            NewJob::new("manual", serde_json::json!({})).max_retries(max_retries),
            &JobDefaults::default(),
            Utc::now(),
        );
        job.retry_count = retry_count;
        job
    }

    #[test]
    fn delivered_becomes_sent() {
        let decider = DefaultDecider::default();
        let decision = decider.decide(&job(0, 3), &AttemptResult::delivered(Some("re_1".into())));
        assert_eq!(
            decision,
            Decision::Sent {
                provider_message_id: Some("re_1".into())
            }
        );
    }

    #[rstest]
    #[case(0, 3, Some(120))]
    #[case(1, 3, Some(240))]
    #[case(2, 3, None)]
    #[case(0, 1, None)]
    fn failure_retries_until_budget_spent(
        #[case] retry_count: u32,
        #[case] max_retries: u32,
        #[case] expected_delay_secs: Option<u64>,
    ) {
        let decider = DefaultDecider::default();
        let decision = decider.decide(&job(retry_count, max_retries), &AttemptResult::failed("503"));
        match (decision, expected_delay_secs) {
            (Decision::Retry { delay, reason }, Some(secs)) => {
                assert_eq!(delay, Duration::from_secs(secs));
                assert_eq!(reason, "503");
            }
            (Decision::Fail { reason }, None) => assert_eq!(reason, "503"),
            (other, _) => panic!("unexpected decision: {other:?}"),
        }
    }
}
