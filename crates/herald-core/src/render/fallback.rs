//! Generic template for kinds without a dedicated one.

use super::Template;
use super::html::escape;
use super::layout::document;
use super::manual::DEFAULT_SUBJECT;
use crate::domain::JobKind;

/// Generic rendering for kinds without a template. Never fails.
pub(crate) struct Fallback<'a> {
    pub kind: &'a JobKind,
    pub data: &'a serde_json::Value,
}

impl Fallback<'_> {
    fn pretty(&self) -> String {
        serde_json::to_string_pretty(self.data).unwrap_or_else(|_| self.data.to_string())
    }
}

impl Template for Fallback<'_> {
    fn subject(&self) -> String {
        DEFAULT_SUBJECT.to_string()
    }

    fn html(&self) -> String {
        let body = format!(
            "<p>Notification of type <code>{}</code>:</p>\n<pre>{}</pre>",
            escape(self.kind.as_str()),
            escape(&self.pretty()),
        );
        document(DEFAULT_SUBJECT, &body)
    }

    fn text(&self) -> Option<String> {
        Some(format!(
            "Notification of type {}:\n\n{}",
            self.kind,
            self.pretty()
        ))
    }
}
