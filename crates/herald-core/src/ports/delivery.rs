//! Delivery port: hands a rendered email to an outbound transport.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Provider-side tag attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailTag {
    pub name: String,
    pub value: String,
}

impl EmailTag {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A message ready to hand to a [`DeliveryClient`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundEmail {
    pub recipients: Vec<String>,
    pub subject: String,
    pub html: String,
    pub text: String,
    pub tags: Vec<EmailTag>,

    /// Stable per job, so a provider that deduplicates on it can absorb a
    /// resend of a message that was delivered but not recorded.
    pub idempotency_key: String,
}

/// What the provider said about one send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    pub success: bool,
    pub provider_message_id: Option<String>,
    pub error: Option<String>,
}

impl DeliveryReceipt {
    pub fn delivered(provider_message_id: Option<String>) -> Self {
        Self {
            success: true,
            provider_message_id,
            error: None,
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            provider_message_id: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("delivery timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("provider returned {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("delivery client misconfigured: {0}")]
    Config(String),
}

#[async_trait]
pub trait DeliveryClient: Send + Sync {
    /// Attempt one send. An `Err` and an unsuccessful receipt are both
    /// delivery failures to the caller; the receipt form carries the
    /// provider's explanation.
    async fn send(&self, email: &OutboundEmail) -> Result<DeliveryReceipt, DeliveryError>;
}

#[async_trait]
impl<T: DeliveryClient + ?Sized> DeliveryClient for std::sync::Arc<T> {
    async fn send(&self, email: &OutboundEmail) -> Result<DeliveryReceipt, DeliveryError> {
        (**self).send(email).await
    }
}
