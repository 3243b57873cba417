//! Job kind names.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Discriminant selecting the payload shape and template of a job.
///
/// Kept as an open string so that jobs written by newer producers still
/// load; unknown kinds render through the fallback template.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobKind(String);

impl JobKind {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for JobKind {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for JobKind {
    fn from(s: String) -> Self {
        Self(s)
    }
}
