//! JobStore port: the persisted queue and its history.
//!
//! The store is the source of truth for job state. Every operation that
//! changes a job's status also updates the paired history record and the
//! attempt log in the same atomic unit; callers never write the three
//! separately.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::{
    AttemptRecord, Decision, HistoryRecord, JobId, JobRecord, JobStatus, JobSummary, NewJob,
    TransitionError,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("job {0} not found")]
    NotFound(JobId),

    #[error("invalid job: {0}")]
    InvalidJob(String),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("store i/o error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("store snapshot is not valid json: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// The outcome of one processed job, applied atomically by
/// [`JobStore::complete`].
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub job_id: JobId,
    pub decision: Decision,

    /// Subject of the rendered message, recorded on the history entry.
    pub subject: Option<String>,

    pub at: DateTime<Utc>,
}

impl Completion {
    pub fn new(job_id: JobId, decision: Decision, at: DateTime<Utc>) -> Self {
        Self {
            job_id,
            decision,
            subject: None,
            at,
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }
}

#[async_trait]
pub trait JobStore: Send + Sync {
    /// Persist a new `QUEUED` job (and its history record unless the
    /// request opts out).
    async fn enqueue(&self, job: NewJob) -> Result<JobRecord, StoreError>;

    /// Atomically select up to `limit` due jobs, ordered by
    /// `priority ASC, created_at ASC`, and flip them to `PROCESSING`.
    ///
    /// Only jobs this call transitioned are returned, so two concurrent
    /// callers never receive the same job.
    async fn claim_due(&self, now: DateTime<Utc>, limit: usize)
    -> Result<Vec<JobRecord>, StoreError>;

    /// Apply a decision to the job, its history record and the attempt log
    /// as one unit. On error nothing is written.
    async fn complete(&self, completion: Completion) -> Result<JobRecord, StoreError>;

    /// Job counts for every status, zero-filled.
    async fn counts_by_status(&self) -> Result<BTreeMap<JobStatus, usize>, StoreError>;

    /// Most recently created jobs first.
    async fn recent_jobs(&self, limit: usize) -> Result<Vec<JobSummary>, StoreError>;

    async fn job(&self, id: JobId) -> Result<Option<JobRecord>, StoreError>;

    async fn history(&self, id: JobId) -> Result<Option<HistoryRecord>, StoreError>;

    /// Attempt log of one job, oldest first.
    async fn attempts(&self, id: JobId) -> Result<Vec<AttemptRecord>, StoreError>;
}
