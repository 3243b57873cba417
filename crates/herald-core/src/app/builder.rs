//! AppBuilder: wiring with start-up validation.

use std::sync::Arc;

use crate::app::processor::QueueProcessor;
use crate::app::scheduler::ProcessorSchedule;
use crate::app::stats::StatsReporter;
use crate::config::{ConfigError, HeraldConfig};
use crate::domain::{Decider, DefaultDecider, JobRecord, NewJob};
use crate::error::HeraldError;
use crate::impls::InMemoryJobStore;
use crate::ports::{Clock, DeliveryClient, IdGenerator, JobStore, SystemClock, UlidGenerator};

/// Builds an [`App`] from ports and configuration.
///
/// # Example
/// ```ignore
/// let app = AppBuilder::new()
///     .config(config)
///     .delivery(Arc::new(LogDeliveryClient))
///     .build()?;
/// ```
///
/// # Fail-fast
/// - a delivery client is mandatory; there is no silent default
/// - the configuration is validated before anything is wired
///
/// Unset ports fall back to the system clock, ULID ids, an in-memory
/// store and the default decider built from `config.retry`.
#[derive(Default)]
pub struct AppBuilder {
    config: HeraldConfig,
    store: Option<Arc<dyn JobStore>>,
    delivery: Option<Arc<dyn DeliveryClient>>,
    decider: Option<Arc<dyn Decider>>,
    clock: Option<Arc<dyn Clock>>,
    ids: Option<Arc<dyn IdGenerator>>,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("no delivery client configured")]
    MissingDeliveryClient,

    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),
}

impl AppBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: HeraldConfig) -> Self {
        self.config = config;
        self
    }

    pub fn store(mut self, store: Arc<dyn JobStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn delivery(mut self, delivery: Arc<dyn DeliveryClient>) -> Self {
        self.delivery = Some(delivery);
        self
    }

    pub fn decider(mut self, decider: Arc<dyn Decider>) -> Self {
        self.decider = Some(decider);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn ids(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn build(self) -> Result<App, BuildError> {
        self.config.validate()?;
        let delivery = self.delivery.ok_or(BuildError::MissingDeliveryClient)?;

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let ids = self
            .ids
            .unwrap_or_else(|| Arc::new(UlidGenerator::new(clock.clone())));
        let store = self.store.unwrap_or_else(|| {
            Arc::new(
                InMemoryJobStore::new(ids, clock.clone()).with_defaults(self.config.defaults.clone()),
            )
        });
        let decider = self
            .decider
            .unwrap_or_else(|| Arc::new(DefaultDecider::new(self.config.retry.clone())));

        let processor = Arc::new(QueueProcessor::new(
            store.clone(),
            delivery,
            decider,
            clock,
            self.config.processor_config(),
        ));
        let stats = StatsReporter::new(store.clone(), self.config.recent_jobs_limit);

        Ok(App {
            config: self.config,
            store,
            processor,
            stats,
        })
    }
}

/// A wired queue: store, processor and stats over the same ports.
pub struct App {
    pub config: HeraldConfig,
    pub store: Arc<dyn JobStore>,
    pub processor: Arc<QueueProcessor>,
    pub stats: StatsReporter,
}

impl App {
    pub async fn enqueue(&self, job: NewJob) -> Result<JobRecord, HeraldError> {
        Ok(self.store.enqueue(job).await?)
    }

    /// Start the periodic processor at `config.interval_secs`.
    pub fn schedule(&self) -> ProcessorSchedule {
        ProcessorSchedule::spawn(self.processor.clone(), self.config.interval())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::JobStatus;
    use crate::impls::LogDeliveryClient;
    use serde_json::json;

    #[test]
    fn build_requires_delivery_client() {
        let result = AppBuilder::new().build();
        assert!(matches!(result, Err(BuildError::MissingDeliveryClient)));
    }

    #[test]
    fn build_rejects_invalid_config() {
        let config = HeraldConfig {
            batch_size: 0,
            ..HeraldConfig::default()
        };
        let result = AppBuilder::new()
            .config(config)
            .delivery(Arc::new(LogDeliveryClient))
            .build();
        assert!(matches!(result, Err(BuildError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn defaults_wire_an_in_memory_queue() {
        let mut config = HeraldConfig::default();
        config.defaults.priority = 2;
        let app = AppBuilder::new()
            .config(config)
            .delivery(Arc::new(LogDeliveryClient))
            .build()
            .unwrap();

        let job = app
            .enqueue(NewJob::new("manual", json!({"recipients": ["a@example.com"]})))
            .await
            .unwrap();
        assert_eq!(job.priority, 2);

        let report = app.processor.process_batch(None).await.unwrap();
        assert_eq!(report.succeeded, 1);
        let stats = app.stats.stats().await.unwrap();
        assert_eq!(stats.counts_by_status[&JobStatus::Sent], 1);
    }
}
