//! Job record and status transitions.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use super::decision::Decision;
use super::ids::JobId;
use super::kind::JobKind;
use super::state::JobStatus;

/// Priority assigned when a producer does not give one (1 = most urgent).
pub const DEFAULT_PRIORITY: i32 = 5;

/// Retry budget assigned when a producer does not give one.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// The queue record: one unit of email-sending work.
///
/// Single source of truth for the job's lifecycle. Status changes go
/// through the transition methods below, which refuse to move a job out
/// of a terminal state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: JobId,
    pub kind: JobKind,
    pub payload: serde_json::Value,
    pub status: JobStatus,

    /// Earliest time the job may be dispatched.
    pub send_at: DateTime<Utc>,

    /// Lower value = more urgent.
    pub priority: i32,

    pub retry_count: u32,
    pub max_retries: u32,

    /// Last failure reason; cleared on success.
    pub error: Option<String>,

    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// A status change that the state machine does not allow.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("job {job_id} is {status}; expected {expected}")]
    UnexpectedStatus {
        job_id: JobId,
        status: JobStatus,
        expected: JobStatus,
    },

    #[error("job {job_id} is already terminal ({status})")]
    Terminal { job_id: JobId, status: JobStatus },
}

impl JobRecord {
    /// Build a freshly queued job from an enqueue request.
    pub fn new(id: JobId, request: NewJob, defaults: &JobDefaults, now: DateTime<Utc>) -> Self {
        Self {
            id,
            kind: request.kind,
            payload: request.payload,
            status: JobStatus::Queued,
            send_at: request.send_at.unwrap_or(now),
            priority: request.priority.unwrap_or(defaults.priority),
            retry_count: 0,
            max_retries: request.max_retries.unwrap_or(defaults.max_retries),
            error: None,
            created_at: now,
            sent_at: None,
            updated_at: now,
        }
    }

    /// Queued and its `send_at` has passed.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status.is_claimable() && self.send_at <= now
    }

    /// Summary without the payload, for operator tooling.
    pub fn summary(&self) -> JobSummary {
        JobSummary {
            id: self.id,
            kind: self.kind.clone(),
            status: self.status,
            priority: self.priority,
            send_at: self.send_at,
            sent_at: self.sent_at,
            error: self.error.clone(),
            retry_count: self.retry_count,
            max_retries: self.max_retries,
            created_at: self.created_at,
        }
    }

    /// Queued -> Processing.
    pub fn claim(&mut self, now: DateTime<Utc>) -> Result<(), TransitionError> {
        self.expect(JobStatus::Queued)?;
        self.status = JobStatus::Processing;
        self.updated_at = now;
        Ok(())
    }

    /// Apply the verdict of one delivery attempt.
    pub fn apply(&mut self, decision: &Decision, now: DateTime<Utc>) -> Result<(), TransitionError> {
        match decision {
            Decision::Sent { .. } => self.mark_sent(now),
            Decision::Retry { delay, reason } => self.schedule_retry(now, *delay, reason),
            Decision::Fail { reason } => self.mark_failed(now, reason),
            Decision::Abort { reason } => self.abort(now, reason),
        }
    }

    /// Processing -> Sent.
    pub fn mark_sent(&mut self, now: DateTime<Utc>) -> Result<(), TransitionError> {
        self.expect(JobStatus::Processing)?;
        self.status = JobStatus::Sent;
        self.sent_at = Some(now);
        self.error = None;
        self.updated_at = now;
        Ok(())
    }

    /// Processing -> Queued with `send_at = now + delay`.
    pub fn schedule_retry(
        &mut self,
        now: DateTime<Utc>,
        delay: Duration,
        reason: &str,
    ) -> Result<(), TransitionError> {
        self.expect(JobStatus::Processing)?;
        self.retry_count = (self.retry_count + 1).min(self.max_retries);
        self.status = JobStatus::Queued;
        self.error = Some(reason.to_string());
        self.send_at = offset(now, delay);
        self.updated_at = now;
        Ok(())
    }

    /// Processing -> Failed, consuming one retry.
    pub fn mark_failed(&mut self, now: DateTime<Utc>, reason: &str) -> Result<(), TransitionError> {
        self.expect(JobStatus::Processing)?;
        self.retry_count = (self.retry_count + 1).min(self.max_retries);
        self.status = JobStatus::Failed;
        self.error = Some(reason.to_string());
        self.updated_at = now;
        Ok(())
    }

    /// Any non-terminal status -> Failed with the retry budget pinned.
    pub fn abort(&mut self, now: DateTime<Utc>, reason: &str) -> Result<(), TransitionError> {
        if self.status.is_terminal() {
            return Err(TransitionError::Terminal {
                job_id: self.id,
                status: self.status,
            });
        }
        self.retry_count = self.max_retries;
        self.status = JobStatus::Failed;
        self.error = Some(reason.to_string());
        self.updated_at = now;
        Ok(())
    }

    fn expect(&self, expected: JobStatus) -> Result<(), TransitionError> {
        if self.status.is_terminal() {
            return Err(TransitionError::Terminal {
                job_id: self.id,
                status: self.status,
            });
        }
        if self.status != expected {
            return Err(TransitionError::UnexpectedStatus {
                job_id: self.id,
                status: self.status,
                expected,
            });
        }
        Ok(())
    }
}

fn offset(now: DateTime<Utc>, delay: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(delay)
        .ok()
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Producer-side enqueue request.
///
/// Unset fields take the store's [`JobDefaults`]; `send_at` defaults to
/// the enqueue time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewJob {
    pub kind: JobKind,
    #[serde(default)]
    pub payload: serde_json::Value,
    #[serde(default)]
    pub priority: Option<i32>,
    #[serde(default)]
    pub send_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub max_retries: Option<u32>,

    /// Whether to create the paired history record.
    #[serde(default = "yes")]
    pub with_history: bool,
}

fn yes() -> bool {
    true
}

impl NewJob {
    pub fn new(kind: impl Into<JobKind>, payload: serde_json::Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
            priority: None,
            send_at: None,
            max_retries: None,
            with_history: true,
        }
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn send_at(mut self, send_at: DateTime<Utc>) -> Self {
        self.send_at = Some(send_at);
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    pub fn without_history(mut self) -> Self {
        self.with_history = false;
        self
    }
}

/// Values applied to enqueue requests that leave a field unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobDefaults {
    pub priority: i32,
    pub max_retries: u32,
}

impl Default for JobDefaults {
    fn default() -> Self {
        Self {
            priority: DEFAULT_PRIORITY,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

/// Routing/status metadata of a job. Never carries the payload, which may
/// hold personal data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSummary {
    pub id: JobId,
    pub kind: JobKind,
    pub status: JobStatus,
    pub priority: i32,
    pub send_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub retry_count: u32,
    pub max_retries: u32,
    pub created_at: DateTime<Utc>,
}
