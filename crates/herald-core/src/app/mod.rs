//! Application layer: combines the ports into the queue's behaviour.
//!
//! - **AppBuilder**: wiring and start-up validation
//! - **QueueProcessor**: one batch of claim -> render -> deliver -> record
//! - **StatsReporter**: counts and recent jobs for operators
//! - **ProcessorSchedule**: periodic trigger with graceful shutdown

pub mod builder;
pub mod processor;
pub mod scheduler;
pub mod stats;

pub use self::builder::{App, AppBuilder, BuildError};
pub use self::processor::{
    BatchReport, INTERNAL_ERROR_PREFIX, JobError, NO_RECIPIENTS, ProcessorConfig, QueueProcessor,
};
pub use self::scheduler::ProcessorSchedule;
pub use self::stats::{JobDetail, QueueStats, StatsReporter};
