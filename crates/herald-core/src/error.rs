//! Crate-level error type.

use thiserror::Error;

use crate::app::BuildError;
use crate::config::ConfigError;
use crate::ports::{DeliveryError, StoreError};

/// Failures surfaced by the application layer and by wiring it up.
#[derive(Debug, Error)]
pub enum HeraldError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Build(#[from] BuildError),
}
