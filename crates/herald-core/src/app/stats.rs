//! Read-only queue inspection for operators.
//!
//! Nothing here exposes job payloads; they may carry personal data.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::domain::{AttemptRecord, HistoryRecord, JobId, JobStatus, JobSummary};
use crate::ports::{JobStore, StoreError};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueStats {
    /// Every status is present, zero-filled.
    pub counts_by_status: BTreeMap<JobStatus, usize>,
    pub total: usize,

    /// Newest first.
    pub recent_jobs: Vec<JobSummary>,
}

/// Everything known about one job, minus its payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobDetail {
    pub job: JobSummary,
    pub history: Option<HistoryRecord>,
    pub attempts: Vec<AttemptRecord>,
}

pub struct StatsReporter {
    store: Arc<dyn JobStore>,
    recent_limit: usize,
}

impl StatsReporter {
    pub fn new(store: Arc<dyn JobStore>, recent_limit: usize) -> Self {
        Self {
            store,
            recent_limit,
        }
    }

    pub async fn stats(&self) -> Result<QueueStats, StoreError> {
        let mut counts_by_status = self.store.counts_by_status().await?;
        for status in JobStatus::ALL {
            counts_by_status.entry(status).or_insert(0);
        }
        let total = counts_by_status.values().sum();
        let recent_jobs = self.store.recent_jobs(self.recent_limit).await?;
        Ok(QueueStats {
            counts_by_status,
            total,
            recent_jobs,
        })
    }

    /// `Ok(None)` when no such job exists.
    pub async fn job(&self, id: JobId) -> Result<Option<JobDetail>, StoreError> {
        let Some(job) = self.store.job(id).await? else {
            return Ok(None);
        };
        Ok(Some(JobDetail {
            job: job.summary(),
            history: self.store.history(id).await?,
            attempts: self.store.attempts(id).await?,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NewJob;
    use crate::impls::InMemoryJobStore;
    use crate::ports::{FixedClock, IdGenerator, UlidGenerator};
    use chrono::Utc;
    use serde_json::json;
    use std::time::Duration;

    fn setup() -> (Arc<InMemoryJobStore>, FixedClock) {
        let clock = FixedClock::new(Utc::now());
        let ids = Arc::new(UlidGenerator::new(clock.clone()));
        (
            Arc::new(InMemoryJobStore::new(ids, Arc::new(clock.clone()))),
            clock,
        )
    }

    #[tokio::test]
    async fn empty_queue_reports_all_statuses() {
        let (store, _) = setup();
        let stats = StatsReporter::new(store, 20).stats().await.unwrap();
        assert_eq!(stats.total, 0);
        assert_eq!(
            stats.counts_by_status.keys().copied().collect::<Vec<_>>(),
            JobStatus::ALL.to_vec()
        );
        assert!(stats.recent_jobs.is_empty());
    }

    #[tokio::test]
    async fn recent_jobs_are_limited_and_payload_free() {
        let (store, clock) = setup();
        for n in 0..5 {
            store
                .enqueue(NewJob::new("manual", json!({"content": format!("secret {n}")})))
                .await
                .unwrap();
            clock.advance(Duration::from_secs(1));
        }
        let stats = StatsReporter::new(store, 3).stats().await.unwrap();
        assert_eq!(stats.total, 5);
        assert_eq!(stats.counts_by_status[&JobStatus::Queued], 5);
        assert_eq!(stats.recent_jobs.len(), 3);
        assert!(stats.recent_jobs[0].created_at > stats.recent_jobs[2].created_at);

        let rendered = serde_json::to_string(&stats).unwrap();
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("\"QUEUED\":5"));
    }

    #[tokio::test]
    async fn job_detail_includes_history() {
        let (store, clock) = setup();
        let job = store
            .enqueue(NewJob::new("manual", json!({"recipients": ["a@example.com"]})))
            .await
            .unwrap();
        let reporter = StatsReporter::new(store, 20);

        let detail = reporter.job(job.id).await.unwrap().unwrap();
        assert_eq!(detail.job.id, job.id);
        assert_eq!(detail.history.unwrap().recipients, vec!["a@example.com".to_string()]);
        assert!(detail.attempts.is_empty());

        let unknown = UlidGenerator::new(clock).generate_job_id();
        assert!(reporter.job(unknown).await.unwrap().is_none());
    }
}
