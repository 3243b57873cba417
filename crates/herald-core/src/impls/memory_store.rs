//! In-memory job store.
//!
//! [`QueueState`] holds the queue table, the history records and the
//! attempt log behind one lock, so each store operation (claim, complete)
//! is a single critical section. The file-backed store reuses the same
//! state and only adds persistence around it.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::{
    AttemptId, AttemptRecord, Decision, HistoryRecord, JobDefaults, JobId, JobRecord, JobStatus,
    JobSummary, NewJob, NotificationPayload,
};
use crate::ports::{Clock, Completion, IdGenerator, JobStore, StoreError};

/// A job with everything stored alongside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct StoredJob {
    /// Insertion order; breaks ties between jobs created in the same instant.
    pub seq: u64,
    pub job: JobRecord,
    pub history: Option<HistoryRecord>,
    pub attempts: Vec<AttemptRecord>,
}

/// Serialized form of [`QueueState`].
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct Snapshot {
    pub next_seq: u64,
    pub jobs: Vec<StoredJob>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct QueueState {
    next_seq: u64,
    jobs: HashMap<JobId, StoredJob>,
}

impl QueueState {
    pub(crate) fn from_snapshot(snapshot: Snapshot) -> Self {
        let next_seq = snapshot
            .jobs
            .iter()
            .map(|s| s.seq + 1)
            .max()
            .unwrap_or(0)
            .max(snapshot.next_seq);
        Self {
            next_seq,
            jobs: snapshot.jobs.into_iter().map(|s| (s.job.id, s)).collect(),
        }
    }

    pub(crate) fn to_snapshot(&self) -> Snapshot {
        let mut jobs: Vec<StoredJob> = self.jobs.values().cloned().collect();
        jobs.sort_by_key(|s| s.seq);
        Snapshot {
            next_seq: self.next_seq,
            jobs,
        }
    }

    pub(crate) fn insert(&mut self, job: JobRecord, history: Option<HistoryRecord>) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.jobs.insert(
            job.id,
            StoredJob {
                seq,
                job,
                history,
                attempts: Vec::new(),
            },
        );
    }

    /// Select due jobs in dispatch order and flip them to `PROCESSING`.
    pub(crate) fn claim_due(&mut self, now: DateTime<Utc>, limit: usize) -> Vec<JobRecord> {
        let mut due: Vec<(i32, DateTime<Utc>, u64, JobId)> = self
            .jobs
            .values()
            .filter(|s| s.job.is_due(now))
            .map(|s| (s.job.priority, s.job.created_at, s.seq, s.job.id))
            .collect();
        due.sort_by_key(|&(priority, created_at, seq, _)| (priority, created_at, seq));
        due.truncate(limit);

        let mut claimed = Vec::with_capacity(due.len());
        for (_, _, _, id) in due {
            if let Some(entry) = self.jobs.get_mut(&id)
                && entry.job.claim(now).is_ok()
            {
                claimed.push(entry.job.clone());
            }
        }
        claimed
    }

    /// Apply a completion to job, history and attempt log together.
    ///
    /// The transition is validated on a copy first, so a rejected
    /// completion leaves the entry untouched.
    pub(crate) fn complete(
        &mut self,
        completion: Completion,
        attempt_id: AttemptId,
    ) -> Result<JobRecord, StoreError> {
        let entry = self
            .jobs
            .get_mut(&completion.job_id)
            .ok_or(StoreError::NotFound(completion.job_id))?;

        let mut job = entry.job.clone();
        let attempt_no = job.retry_count + 1;
        job.apply(&completion.decision, completion.at)?;

        if let Some(history) = entry.history.as_mut() {
            history.sync_from(&job);
            if let Some(subject) = completion.subject {
                history.subject = Some(subject);
            }
            if let Decision::Sent {
                provider_message_id,
            } = &completion.decision
            {
                history.provider_message_id = provider_message_id.clone();
            }
        }
        entry.attempts.push(AttemptRecord::new(
            attempt_id,
            job.id,
            attempt_no,
            &completion.decision,
            completion.at,
        ));
        entry.job = job.clone();
        Ok(job)
    }

    pub(crate) fn counts_by_status(&self) -> BTreeMap<JobStatus, usize> {
        let mut counts: BTreeMap<JobStatus, usize> =
            JobStatus::ALL.iter().map(|&s| (s, 0)).collect();
        for entry in self.jobs.values() {
            *counts.entry(entry.job.status).or_default() += 1;
        }
        counts
    }

    pub(crate) fn recent_jobs(&self, limit: usize) -> Vec<JobSummary> {
        let mut entries: Vec<&StoredJob> = self.jobs.values().collect();
        entries.sort_by(|a, b| {
            b.job
                .created_at
                .cmp(&a.job.created_at)
                .then(b.seq.cmp(&a.seq))
        });
        entries
            .into_iter()
            .take(limit)
            .map(|s| s.job.summary())
            .collect()
    }

    pub(crate) fn get(&self, id: JobId) -> Option<&StoredJob> {
        self.jobs.get(&id)
    }
}

/// What both store implementations need to admit a new job.
#[derive(Clone)]
pub(crate) struct Admission {
    pub ids: Arc<dyn IdGenerator>,
    pub clock: Arc<dyn Clock>,
    pub defaults: JobDefaults,
}

impl Admission {
    /// Validate an enqueue request and build the records to insert.
    pub(crate) fn admit(
        &self,
        request: NewJob,
    ) -> Result<(JobRecord, Option<HistoryRecord>), StoreError> {
        if request.kind.as_str().trim().is_empty() {
            return Err(StoreError::InvalidJob("kind must not be empty".into()));
        }
        let max_retries = request.max_retries.unwrap_or(self.defaults.max_retries);
        if max_retries == 0 {
            return Err(StoreError::InvalidJob(
                "max_retries must be at least 1".into(),
            ));
        }

        let with_history = request.with_history;
        let job = JobRecord::new(
            self.ids.generate_job_id(),
            request,
            &self.defaults,
            self.clock.now(),
        );
        let history = with_history.then(|| {
            // Recipients are best-effort here; a payload that does not
            // decode fails later, at render time.
            let recipients = NotificationPayload::decode(&job.kind, &job.payload)
                .map(|p| p.recipients())
                .unwrap_or_default();
            HistoryRecord::new(self.ids.generate_history_id(), &job, recipients)
        });
        Ok((job, history))
    }
}

/// Store kept entirely in process memory. Lost on exit.
pub struct InMemoryJobStore {
    state: Mutex<QueueState>,
    admission: Admission,
}

impl InMemoryJobStore {
    pub fn new(ids: Arc<dyn IdGenerator>, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            admission: Admission {
                ids,
                clock,
                defaults: JobDefaults::default(),
            },
        }
    }

    pub fn with_defaults(mut self, defaults: JobDefaults) -> Self {
        self.admission.defaults = defaults;
        self
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn enqueue(&self, request: NewJob) -> Result<JobRecord, StoreError> {
        let (job, history) = self.admission.admit(request)?;
        self.state.lock().await.insert(job.clone(), history);
        debug!(job_id = %job.id, kind = %job.kind, priority = job.priority, "job enqueued");
        Ok(job)
    }

    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<JobRecord>, StoreError> {
        Ok(self.state.lock().await.claim_due(now, limit))
    }

    async fn complete(&self, completion: Completion) -> Result<JobRecord, StoreError> {
        let attempt_id = self.admission.ids.generate_attempt_id();
        self.state.lock().await.complete(completion, attempt_id)
    }

    async fn counts_by_status(&self) -> Result<BTreeMap<JobStatus, usize>, StoreError> {
        Ok(self.state.lock().await.counts_by_status())
    }

    async fn recent_jobs(&self, limit: usize) -> Result<Vec<JobSummary>, StoreError> {
        Ok(self.state.lock().await.recent_jobs(limit))
    }

    async fn job(&self, id: JobId) -> Result<Option<JobRecord>, StoreError> {
        Ok(self.state.lock().await.get(id).map(|s| s.job.clone()))
    }

    async fn history(&self, id: JobId) -> Result<Option<HistoryRecord>, StoreError> {
        Ok(self
            .state
            .lock()
            .await
            .get(id)
            .and_then(|s| s.history.clone()))
    }

    async fn attempts(&self, id: JobId) -> Result<Vec<AttemptRecord>, StoreError> {
        Ok(self
            .state
            .lock()
            .await
            .get(id)
            .map(|s| s.attempts.clone())
            .unwrap_or_default())
    }
}
