//! Queue processor: claim -> render -> validate -> deliver -> record.
//!
//! One call to [`QueueProcessor::process_batch`] handles one bounded batch
//! to completion, one job at a time. A failure of a single job never
//! aborts the batch; only a failing claim does.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::domain::{AttemptResult, Decider, Decision, JobId, JobKind, JobRecord};
use crate::error::HeraldError;
use crate::ports::{
    Clock, Completion, DeliveryClient, DeliveryError, EmailTag, JobStore, OutboundEmail,
};
use crate::render::{self, RenderedEmail};

/// Prefix of every error recorded for an internal (non-delivery) failure.
pub const INTERNAL_ERROR_PREFIX: &str = "internal error: ";

/// Failure reason recorded for a job without usable recipients.
pub const NO_RECIPIENTS: &str = "no recipients";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorConfig {
    /// Jobs claimed when `process_batch` is called without a limit.
    pub batch_size: usize,

    /// Upper bound for one delivery call; exceeding it is a delivery failure.
    pub send_timeout: Duration,

    /// Value of the `source` tag on outbound email.
    pub source_tag: String,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            send_timeout: Duration::from_secs(30),
            source_tag: "herald".to_string(),
        }
    }
}

/// Summary of one processor run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub processed: usize,
    pub succeeded: usize,
    pub retried: usize,
    pub failed: usize,

    /// Jobs that ended terminally `FAILED` in this run.
    pub errors: Vec<JobError>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobError {
    pub job_id: JobId,
    pub kind: JobKind,
    pub error: String,
}

enum JobOutcome {
    Sent,
    Retried,
    Failed(String),
}

pub struct QueueProcessor {
    store: Arc<dyn JobStore>,
    delivery: Arc<dyn DeliveryClient>,
    decider: Arc<dyn Decider>,
    clock: Arc<dyn Clock>,
    config: ProcessorConfig,
}

impl QueueProcessor {
    pub fn new(
        store: Arc<dyn JobStore>,
        delivery: Arc<dyn DeliveryClient>,
        decider: Arc<dyn Decider>,
        clock: Arc<dyn Clock>,
        config: ProcessorConfig,
    ) -> Self {
        Self {
            store,
            delivery,
            decider,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Process up to `limit` due jobs (default: the configured batch size).
    ///
    /// Jobs are claimed one at a time, each right before it is attempted, so
    /// a crash mid-batch leaves at most one job in `PROCESSING`. Due-ness is
    /// judged against the time the batch started.
    pub async fn process_batch(&self, limit: Option<usize>) -> Result<BatchReport, HeraldError> {
        let limit = limit.unwrap_or(self.config.batch_size);
        let started = self.clock.now();

        let mut report = BatchReport::default();
        while report.processed < limit {
            let Some(job) = self.store.claim_due(started, 1).await?.pop() else {
                break;
            };
            debug!(job_id = %job.id, kind = %job.kind, "claimed job");
            report.processed += 1;
            match self.process_job(&job).await {
                JobOutcome::Sent => report.succeeded += 1,
                JobOutcome::Retried => report.retried += 1,
                JobOutcome::Failed(error) => {
                    report.failed += 1;
                    report.errors.push(JobError {
                        job_id: job.id,
                        kind: job.kind.clone(),
                        error,
                    });
                }
            }
        }

        if report.processed > 0 {
            info!(
                processed = report.processed,
                succeeded = report.succeeded,
                retried = report.retried,
                failed = report.failed,
                "batch finished"
            );
        }
        Ok(report)
    }

    async fn process_job(&self, job: &JobRecord) -> JobOutcome {
        let payload = match render::decode(&job.kind, &job.payload) {
            Ok(payload) => payload,
            Err(err) => {
                return self
                    .abort(job, format!("{INTERNAL_ERROR_PREFIX}{err}"), None)
                    .await;
            }
        };
        let rendered = payload.render();
        let recipients = payload.recipients();

        let result = if recipients.is_empty() {
            AttemptResult::failed(NO_RECIPIENTS)
        } else {
            self.deliver(job, recipients, &rendered).await
        };
        let decision = self.decider.decide(job, &result);

        let completion = Completion::new(job.id, decision.clone(), self.clock.now())
            .with_subject(rendered.subject.as_str());
        match self.store.complete(completion).await {
            Ok(updated) => self.log_outcome(&updated, &decision),
            Err(e) => {
                let reason = match result {
                    AttemptResult::Delivered { .. } => format!(
                        "{INTERNAL_ERROR_PREFIX}delivery succeeded but recording it failed \
                         (the email may already have been sent): {e}"
                    ),
                    AttemptResult::Failed { .. } => {
                        format!("{INTERNAL_ERROR_PREFIX}failed to record attempt: {e}")
                    }
                };
                self.abort(job, reason, Some(rendered.subject)).await
            }
        }
    }

    async fn deliver(
        &self,
        job: &JobRecord,
        recipients: Vec<String>,
        rendered: &RenderedEmail,
    ) -> AttemptResult {
        let email = OutboundEmail {
            recipients,
            subject: rendered.subject.clone(),
            html: rendered.html.clone(),
            text: rendered.text.clone(),
            tags: vec![
                EmailTag::new("kind", job.kind.as_str()),
                EmailTag::new("source", self.config.source_tag.as_str()),
            ],
            idempotency_key: job.id.to_string(),
        };

        match tokio::time::timeout(self.config.send_timeout, self.delivery.send(&email)).await {
            Err(_) => AttemptResult::failed(DeliveryError::Timeout(self.config.send_timeout).to_string()),
            Ok(Err(e)) => AttemptResult::failed(e.to_string()),
            Ok(Ok(receipt)) if receipt.success => {
                AttemptResult::delivered(receipt.provider_message_id)
            }
            Ok(Ok(receipt)) => AttemptResult::failed(
                receipt
                    .error
                    .unwrap_or_else(|| "provider rejected the email".to_string()),
            ),
        }
    }

    /// Force the job to `FAILED` with its retry budget pinned.
    async fn abort(&self, job: &JobRecord, reason: String, subject: Option<String>) -> JobOutcome {
        error!(job_id = %job.id, kind = %job.kind, error = %reason, "job failed internally");

        let mut completion = Completion::new(
            job.id,
            Decision::Abort {
                reason: reason.clone(),
            },
            self.clock.now(),
        );
        completion.subject = subject;
        if let Err(e) = self.store.complete(completion).await {
            error!(job_id = %job.id, error = %e, "could not record internal failure; job left in PROCESSING");
        }
        JobOutcome::Failed(reason)
    }

    fn log_outcome(&self, job: &JobRecord, decision: &Decision) -> JobOutcome {
        match decision {
            Decision::Sent {
                provider_message_id,
            } => {
                info!(job_id = %job.id, kind = %job.kind, provider_message_id = ?provider_message_id, "email sent");
                JobOutcome::Sent
            }
            Decision::Retry { delay, reason } => {
                warn!(
                    job_id = %job.id,
                    kind = %job.kind,
                    retry_count = job.retry_count,
                    max_retries = job.max_retries,
                    delay_secs = delay.as_secs(),
                    send_at = %job.send_at,
                    error = %reason,
                    "delivery failed, retry scheduled"
                );
                JobOutcome::Retried
            }
            Decision::Fail { reason } | Decision::Abort { reason } => {
                error!(
                    job_id = %job.id,
                    kind = %job.kind,
                    retry_count = job.retry_count,
                    error = %reason,
                    "delivery failed, retries exhausted"
                );
                JobOutcome::Failed(reason.clone())
            }
        }
    }
}
