//! Delivery attempt log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::decision::Decision;
use super::ids::{AttemptId, JobId};

/// What the delivery step produced, before any retry policy is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptResult {
    Delivered { provider_message_id: Option<String> },
    Failed { reason: String },
}

impl AttemptResult {
    pub fn delivered(provider_message_id: Option<String>) -> Self {
        Self::Delivered {
            provider_message_id,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }
}

/// Outcome of one attempt as recorded in the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttemptOutcome {
    Sent,
    RetryScheduled,
    Failed,
}

impl From<&Decision> for AttemptOutcome {
    fn from(decision: &Decision) -> Self {
        match decision {
            Decision::Sent { .. } => AttemptOutcome::Sent,
            Decision::Retry { .. } => AttemptOutcome::RetryScheduled,
            Decision::Fail { .. } | Decision::Abort { .. } => AttemptOutcome::Failed,
        }
    }
}

/// One processed attempt of a job.
///
/// Written in the same store operation as the job/history update it
/// caused, so the log never disagrees with the job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub id: AttemptId,
    pub job_id: JobId,

    /// 1-based attempt number.
    pub attempt: u32,

    pub outcome: AttemptOutcome,
    pub provider_message_id: Option<String>,
    pub error: Option<String>,
    pub attempted_at: DateTime<Utc>,
}

impl AttemptRecord {
    pub fn new(
        id: AttemptId,
        job_id: JobId,
        attempt: u32,
        decision: &Decision,
        attempted_at: DateTime<Utc>,
    ) -> Self {
        let (provider_message_id, error) = match decision {
            Decision::Sent {
                provider_message_id,
            } => (provider_message_id.clone(), None),
            Decision::Retry { reason, .. }
            | Decision::Fail { reason }
            | Decision::Abort { reason } => (None, Some(reason.clone())),
        };
        Self {
            id,
            job_id,
            attempt,
            outcome: decision.into(),
            provider_message_id,
            error,
            attempted_at,
        }
    }
}
