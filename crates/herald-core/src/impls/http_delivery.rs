//! HTTP email provider client.
//!
//! Speaks the common "POST /emails" JSON dialect: bearer API key, an
//! `Idempotency-Key` header, `{"id": ...}` back on success.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ProviderConfig;
use crate::ports::{DeliveryClient, DeliveryError, DeliveryReceipt, EmailTag, OutboundEmail};

pub struct HttpDeliveryClient {
    client: Client,
    endpoint: String,
    api_key: String,
    from: String,
}

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    html: &'a str,
    text: &'a str,
    tags: &'a [EmailTag],
}

#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    id: Option<String>,
}

impl SendEmailResponse {
    /// Message id from the body of an accepted request. A body that is not
    /// the expected JSON still means the email was accepted, just without
    /// an id.
    fn message_id(status: u16, body: &str) -> Option<String> {
        if body.trim().is_empty() {
            return None;
        }
        match serde_json::from_str::<SendEmailResponse>(body) {
            Ok(parsed) => parsed.id,
            Err(e) => {
                warn!(status, error = %e, "provider accepted email with an unexpected response body");
                None
            }
        }
    }
}

impl HttpDeliveryClient {
    /// Build a client for `provider`. `timeout` bounds each HTTP request.
    pub fn new(provider: &ProviderConfig, timeout: Duration) -> Result<Self, DeliveryError> {
        if provider.base_url.trim().is_empty() {
            return Err(DeliveryError::Config("provider base_url is empty".into()));
        }
        if provider.from.trim().is_empty() {
            return Err(DeliveryError::Config("provider from address is empty".into()));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DeliveryError::Config(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: format!("{}/emails", provider.base_url.trim_end_matches('/')),
            api_key: provider.api_key.clone(),
            from: provider.from.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_body<'a>(&'a self, email: &'a OutboundEmail) -> SendEmailRequest<'a> {
        SendEmailRequest {
            from: &self.from,
            to: &email.recipients,
            subject: &email.subject,
            html: &email.html,
            text: &email.text,
            tags: &email.tags,
        }
    }
}

#[async_trait]
impl DeliveryClient for HttpDeliveryClient {
    async fn send(&self, email: &OutboundEmail) -> Result<DeliveryReceipt, DeliveryError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header("Idempotency-Key", &email.idempotency_key)
            .json(&self.request_body(email))
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    warn!(status = status.as_u16(), error = %e, "could not read provider response body");
                    String::new()
                }
            };
            let id = SendEmailResponse::message_id(status.as_u16(), &body);
            debug!(status = status.as_u16(), provider_message_id = ?id, "provider accepted email");
            return Ok(DeliveryReceipt::delivered(id));
        }

        let body = response.text().await.unwrap_or_default();
        let rejection = DeliveryError::Provider {
            status: status.as_u16(),
            body,
        };
        Ok(DeliveryReceipt::rejected(rejection.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn provider(base_url: &str) -> ProviderConfig {
        ProviderConfig {
            base_url: base_url.into(),
            api_key: "key".into(),
            from: "HR <hr@example.com>".into(),
        }
    }

    #[test]
    fn endpoint_joins_base_url() {
        let client =
            HttpDeliveryClient::new(&provider("https://api.example.com/"), Duration::from_secs(5))
                .unwrap();
        assert_eq!(client.endpoint(), "https://api.example.com/emails");
    }

    #[test]
    fn empty_settings_are_rejected() {
        let result = HttpDeliveryClient::new(&provider(" "), Duration::from_secs(5));
        assert!(matches!(result, Err(DeliveryError::Config(_))));
    }

    #[test]
    fn request_body_shape() {
        let client =
            HttpDeliveryClient::new(&provider("https://api.example.com"), Duration::from_secs(5))
                .unwrap();
        let email = OutboundEmail {
            recipients: vec!["ana@example.com".into()],
            subject: "Hi".into(),
            html: "<p>Hi</p>".into(),
            text: "Hi".into(),
            tags: vec![EmailTag::new("kind", "manual")],
            idempotency_key: "job-1".into(),
        };
        let body = serde_json::to_value(client.request_body(&email)).unwrap();
        assert_eq!(
            body,
            json!({
                "from": "HR <hr@example.com>",
                "to": ["ana@example.com"],
                "subject": "Hi",
                "html": "<p>Hi</p>",
                "text": "Hi",
                "tags": [{"name": "kind", "value": "manual"}]
            })
        );
    }

    #[rstest]
    #[case::id(r#"{"id": "re_123"}"#, Some("re_123"))]
    #[case::no_id(r#"{"queued": true}"#, None)]
    #[case::empty("", None)]
    #[case::not_json("<html>OK</html>", None)]
    fn accepted_body_yields_message_id(#[case] body: &str, #[case] expected: Option<&str>) {
        assert_eq!(
            SendEmailResponse::message_id(200, body).as_deref(),
            expected
        );
    }
}
