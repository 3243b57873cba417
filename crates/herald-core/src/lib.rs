//! herald-core
//!
//! Durable, at-least-once notification email queue.
//!
//! # Modules
//! - **domain**: records, status machine, typed payloads, retry decisions
//! - **render**: `(kind, payload)` -> subject, HTML and plain text
//! - **ports**: JobStore, DeliveryClient, Clock, IdGenerator
//! - **impls**: in-memory and file stores, HTTP and dry-run delivery
//! - **app**: processor, stats, scheduler, builder
//! - **queue**: backoff policy
//! - **config** / **observability**: TOML settings and logging

pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod impls;
pub mod observability;
pub mod ports;
pub mod queue;
pub mod render;

pub use app::{App, AppBuilder, BatchReport, QueueProcessor, QueueStats, StatsReporter};
pub use config::HeraldConfig;
pub use error::HeraldError;
