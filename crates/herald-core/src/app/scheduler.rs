//! Periodic trigger for the processor, with graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use super::processor::QueueProcessor;

/// Periodic processor trigger.
/// - the first batch runs immediately, then one per `interval`
/// - shutdown stops future ticks; a batch already running finishes
pub struct ProcessorSchedule {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl ProcessorSchedule {
    pub fn spawn(processor: Arc<QueueProcessor>, interval: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let join = tokio::spawn(schedule_loop(processor, interval, shutdown_rx));
        Self { shutdown_tx, join }
    }

    pub fn request_shutdown(&self) {
        // receiver may already be gone
        let _ = self.shutdown_tx.send(true);
    }

    /// Shutdown and wait for the loop (and any in-flight batch) to finish.
    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        if let Err(e) = self.join.await {
            error!(error = %e, "processor schedule task panicked");
        }
    }
}

async fn schedule_loop(
    processor: Arc<QueueProcessor>,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(interval_secs = interval.as_secs_f64(), "processor schedule started");

    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                continue;
            }
            _ = ticker.tick() => {}
        }

        match processor.process_batch(None).await {
            Ok(report) => debug!(processed = report.processed, "scheduled batch done"),
            Err(e) => error!(error = %e, "scheduled batch failed"),
        }
    }

    info!("processor schedule stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ProcessorConfig;
    use crate::domain::{DefaultDecider, JobStatus, NewJob};
    use crate::impls::{InMemoryJobStore, LogDeliveryClient};
    use crate::ports::{JobStore, SystemClock, UlidGenerator};
    use serde_json::json;

    #[tokio::test]
    async fn drains_queue_until_shutdown() {
        let clock = Arc::new(SystemClock);
        let store = Arc::new(InMemoryJobStore::new(
            Arc::new(UlidGenerator::new(SystemClock)),
            clock.clone(),
        ));
        let processor = Arc::new(QueueProcessor::new(
            store.clone(),
            Arc::new(LogDeliveryClient),
            Arc::new(DefaultDecider::default()),
            clock,
            ProcessorConfig::default(),
        ));
        let job = store
            .enqueue(NewJob::new("manual", json!({"recipients": ["a@example.com"]})))
            .await
            .unwrap();

        let schedule = ProcessorSchedule::spawn(processor, Duration::from_millis(10));
        let sent = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let status = store.job(job.id).await.unwrap().unwrap().status;
                if status == JobStatus::Sent {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        assert!(sent.is_ok());

        tokio::time::timeout(Duration::from_secs(5), schedule.shutdown_and_join())
            .await
            .unwrap();
    }
}
