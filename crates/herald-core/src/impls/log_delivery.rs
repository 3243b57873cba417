//! Dry-run delivery: emails are logged, never sent.

use async_trait::async_trait;
use tracing::info;
use ulid::Ulid;

use crate::ports::{DeliveryClient, DeliveryError, DeliveryReceipt, OutboundEmail};

/// Dry-run client: logs the message instead of sending it.
///
/// Recipient addresses stay out of the log; only their count is recorded.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDeliveryClient;

#[async_trait]
impl DeliveryClient for LogDeliveryClient {
    async fn send(&self, email: &OutboundEmail) -> Result<DeliveryReceipt, DeliveryError> {
        let message_id = format!("dry-run-{}", Ulid::new());
        info!(
            message_id = %message_id,
            recipient_count = email.recipients.len(),
            subject = %email.subject,
            idempotency_key = %email.idempotency_key,
            text_len = email.text.len(),
            "dry run: email not sent"
        );
        Ok(DeliveryReceipt::delivered(Some(message_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn email() -> OutboundEmail {
        OutboundEmail {
            recipients: vec!["ana.horvat@example.com".into(), "hr@example.com".into()],
            subject: "s".into(),
            html: String::new(),
            text: "t".into(),
            tags: vec![],
            idempotency_key: "k".into(),
        }
    }

    #[tokio::test]
    async fn always_succeeds_with_an_id() {
        let receipt = LogDeliveryClient.send(&email()).await.unwrap();
        assert!(receipt.success);
        assert!(
            receipt
                .provider_message_id
                .unwrap()
                .starts_with("dry-run-")
        );
    }

    #[tokio::test]
    async fn logs_recipient_count_not_addresses() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        LogDeliveryClient.send(&email()).await.unwrap();

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("recipient_count=2"));
        assert!(!output.contains("@example.com"));
    }
}
