//! JSON-file backed job store.
//!
//! The whole queue is kept in memory and written back as one JSON snapshot
//! after every mutation (temp file + rename). A mutation is committed to
//! memory only after its snapshot hit the disk, so a failed write leaves
//! the store exactly as it was. One process at a time.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::memory_store::{Admission, QueueState, Snapshot};
use crate::domain::{
    AttemptRecord, HistoryRecord, JobDefaults, JobId, JobRecord, JobStatus, JobSummary, NewJob,
};
use crate::ports::{Clock, Completion, IdGenerator, JobStore, StoreError};

pub struct FileJobStore {
    path: PathBuf,
    state: Mutex<QueueState>,
    admission: Admission,
}

impl FileJobStore {
    /// Open the store at `path`, starting empty if the file does not exist.
    pub async fn open(
        path: impl Into<PathBuf>,
        ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, StoreError> {
        let path = path.into();
        let state = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let snapshot: Snapshot = serde_json::from_slice(&bytes)?;
                info!(path = %path.display(), jobs = snapshot.jobs.len(), "job store loaded");
                QueueState::from_snapshot(snapshot)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "job store not found, starting empty");
                QueueState::default()
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        Ok(Self {
            path,
            state: Mutex::new(state),
            admission: Admission {
                ids,
                clock,
                defaults: JobDefaults::default(),
            },
        })
    }

    pub fn with_defaults(mut self, defaults: JobDefaults) -> Self {
        self.admission.defaults = defaults;
        self
    }

    /// Run `f` on a copy of the state, persist the copy, then commit it.
    async fn mutate<R>(
        &self,
        f: impl FnOnce(&mut QueueState) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        let mut guard = self.state.lock().await;
        let mut next = guard.clone();
        let out = f(&mut next)?;
        self.persist(&next).await?;
        *guard = next;
        Ok(out)
    }

    async fn persist(&self, state: &QueueState) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(&state.to_snapshot())?;
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, &bytes).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(io_err)?;
        debug!(path = %self.path.display(), bytes = bytes.len(), "job store persisted");
        Ok(())
    }
}

#[async_trait]
impl JobStore for FileJobStore {
    async fn enqueue(&self, request: NewJob) -> Result<JobRecord, StoreError> {
        let (job, history) = self.admission.admit(request)?;
        let stored = job.clone();
        self.mutate(move |state| {
            state.insert(stored, history);
            Ok(())
        })
        .await?;
        debug!(job_id = %job.id, kind = %job.kind, priority = job.priority, "job enqueued");
        Ok(job)
    }

    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<JobRecord>, StoreError> {
        self.mutate(|state| Ok(state.claim_due(now, limit))).await
    }

    async fn complete(&self, completion: Completion) -> Result<JobRecord, StoreError> {
        let attempt_id = self.admission.ids.generate_attempt_id();
        self.mutate(|state| state.complete(completion, attempt_id))
            .await
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Decision;
    use std::path::Path;
    use crate::ports::{FixedClock, UlidGenerator};
    use chrono::TimeZone;
    use serde_json::json;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("herald-test-{}", ulid::Ulid::new()))
            .join(name)
    }

    async fn open(path: &Path, clock: &FixedClock) -> FileJobStore {
        FileJobStore::open(
            path,
            Arc::new(UlidGenerator::new(clock.clone())),
            Arc::new(clock.clone()),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn state_survives_reopen() {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap());
        let path = temp_path("queue.json");

        let store = open(&path, &clock).await;
        let job = store
            .enqueue(NewJob::new("manual", json!({"recipients": ["a@example.com"]})))
            .await
            .unwrap();
        store.claim_due(clock.now(), 10).await.unwrap();
        store
            .complete(Completion::new(
                job.id,
                Decision::Fail {
                    reason: "bounced".into(),
                },
                clock.now(),
            ))
            .await
            .unwrap();
        drop(store);

        let reopened = open(&path, &clock).await;
        let loaded = reopened.job(job.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, JobStatus::Failed);
        assert_eq!(loaded.error.as_deref(), Some("bounced"));
        assert_eq!(reopened.attempts(job.id).await.unwrap().len(), 1);
        assert_eq!(
            reopened.history(job.id).await.unwrap().unwrap().status,
            JobStatus::Failed
        );

        // New jobs keep sorting after the loaded ones.
        let next = reopened.enqueue(NewJob::new("manual", json!({}))).await.unwrap();
        let recent = reopened.recent_jobs(10).await.unwrap();
        assert_eq!(recent[0].id, next.id);

        let _ = tokio::fs::remove_dir_all(path.parent().unwrap()).await;
    }

    #[tokio::test]
    async fn missing_file_starts_empty() {
        let clock = FixedClock::new(Utc::now());
        let store = open(&temp_path("absent.json"), &clock).await;
        assert!(store.recent_jobs(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn corrupt_file_is_a_serialization_error() {
        let path = temp_path("corrupt.json");
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, b"{not json").await.unwrap();

        let clock = FixedClock::new(Utc::now());
        let result = FileJobStore::open(
            &path,
            Arc::new(UlidGenerator::new(clock.clone())),
            Arc::new(clock),
        )
        .await;
        assert!(matches!(result, Err(StoreError::Serialization(_))));

        let _ = tokio::fs::remove_dir_all(path.parent().unwrap()).await;
    }
}
