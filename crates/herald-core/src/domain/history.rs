//! History record: the operator-facing audit trail of a job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{HistoryId, JobId};
use super::job::JobRecord;
use super::kind::JobKind;
use super::state::JobStatus;

/// Audit entry paired 1:1 with a job.
///
/// Mirrors the job's `status`, `sent_at` and `error` so the trail survives
/// a purge of the queue table. The mirror is only ever refreshed inside
/// the store operation that changed the job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: HistoryId,
    pub job_id: JobId,
    pub kind: JobKind,
    pub recipients: Vec<String>,

    /// Subject of the last rendered message, once one was rendered.
    pub subject: Option<String>,

    pub status: JobStatus,
    pub sent_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub provider_message_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl HistoryRecord {
    pub fn new(id: HistoryId, job: &JobRecord, recipients: Vec<String>) -> Self {
        Self {
            id,
            job_id: job.id,
            kind: job.kind.clone(),
            recipients,
            subject: None,
            status: job.status,
            sent_at: job.sent_at,
            error: job.error.clone(),
            provider_message_id: None,
            created_at: job.created_at,
            updated_at: job.created_at,
        }
    }

    /// Copy the mirrored lifecycle fields from the job.
    pub fn sync_from(&mut self, job: &JobRecord) {
        self.status = job.status;
        self.sent_at = job.sent_at;
        self.error = job.error.clone();
        self.updated_at = job.updated_at;
    }

    /// Whether the mirrored fields agree with the job.
    pub fn is_in_sync_with(&self, job: &JobRecord) -> bool {
        self.job_id == job.id
            && self.status == job.status
            && self.sent_at == job.sent_at
            && self.error == job.error
    }
}
