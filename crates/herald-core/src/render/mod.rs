//! Content renderer: `(kind, payload)` -> subject, HTML and plain text.
//!
//! Rendering is pure. The only failure is a payload of a known kind whose
//! JSON has the wrong shape; unknown kinds fall back to a generic template.

mod digest;
mod fallback;
pub mod html;
mod layout;
mod manual;
mod onboarding;
mod probation;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{JobKind, NotificationPayload};

pub use html::{escape as escape_html, html_to_text};

/// Fully rendered message content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
    pub text: String,
}

impl RenderedEmail {
    /// Build a rendered email, deriving the text part from the HTML when
    /// none is given. The text part is never empty: if the HTML degrades to
    /// nothing the subject is used.
    pub fn new(subject: impl Into<String>, html: impl Into<String>, text: Option<String>) -> Self {
        let subject = subject.into();
        let html = html.into();
        let text = text
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| html_to_text(&html));
        let text = if text.is_empty() {
            subject.clone()
        } else {
            text
        };
        Self {
            subject,
            html,
            text,
        }
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid payload for kind `{kind}`: {source}")]
    Payload {
        kind: JobKind,
        #[source]
        source: serde_json::Error,
    },
}

/// A message template for one payload shape.
pub(crate) trait Template {
    fn subject(&self) -> String;

    /// HTML body, values already escaped.
    fn html(&self) -> String;

    /// Explicit plain-text part. `None` derives it from the HTML.
    fn text(&self) -> Option<String> {
        None
    }

    fn render(&self) -> RenderedEmail {
        RenderedEmail::new(self.subject(), self.html(), self.text())
    }
}

impl NotificationPayload {
    pub fn render(&self) -> RenderedEmail {
        match self {
            NotificationPayload::OnboardingNotice(p) => p.render(),
            NotificationPayload::ProbationWarning(p) => probation::Warning(p).render(),
            NotificationPayload::ProbationReminder(p) => probation::Reminder(p).render(),
            NotificationPayload::MonthlyDigest(p) => p.render(),
            NotificationPayload::Manual(p) => p.render(),
            NotificationPayload::Other { kind, data } => fallback::Fallback { kind, data }.render(),
        }
    }
}

/// Decode `payload` for `kind`, attributing a shape error to the kind.
pub fn decode(
    kind: &JobKind,
    payload: &serde_json::Value,
) -> Result<NotificationPayload, RenderError> {
    NotificationPayload::decode(kind, payload).map_err(|source| RenderError::Payload {
        kind: kind.clone(),
        source,
    })
}

/// Decode `payload` for `kind` and render it.
pub fn render(kind: &JobKind, payload: &serde_json::Value) -> Result<RenderedEmail, RenderError> {
    decode(kind, payload).map(|p| p.render())
}
