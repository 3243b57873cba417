//! Typed payloads, one per job kind.
//!
//! Jobs carry their payload as JSON so the store stays schema-agnostic;
//! [`NotificationPayload::decode`] turns `(kind, json)` into the typed union
//! right before rendering. Every field except the structural ones is
//! optional, so a payload that merely leaves data out always decodes.
//! Dates and counts are read leniently: a value that cannot be understood
//! becomes `None` and renders as a placeholder.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

use super::kind::JobKind;

/// Fields describing the employee a notification is about.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmployeeFields {
    pub employee_name: Option<String>,
    pub position: Option<String>,
    pub department: Option<String>,
}

/// New-hire notice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OnboardingNotice {
    pub recipients: Vec<String>,
    #[serde(flatten)]
    pub employee: EmployeeFields,
    #[serde(deserialize_with = "lenient::date")]
    pub start_date: Option<NaiveDate>,
    pub content: Option<String>,
}

impl OnboardingNotice {
    pub const KIND: &'static str = "onboarding-notice";
}

/// Probation deadline data, shared by the HR warning and the employee
/// reminder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProbationNotice {
    pub recipients: Vec<String>,
    #[serde(flatten)]
    pub employee: EmployeeFields,
    #[serde(deserialize_with = "lenient::integer")]
    pub days_remaining: Option<i64>,
    #[serde(deserialize_with = "lenient::date")]
    pub probation_end_date: Option<NaiveDate>,
}

impl ProbationNotice {
    pub const WARNING_KIND: &'static str = "probation-warning";
    pub const REMINDER_KIND: &'static str = "probation-reminder";
}

/// One line of the monthly digest tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmployeeSummary {
    pub name: Option<String>,
    pub position: Option<String>,
    pub department: Option<String>,
    #[serde(deserialize_with = "lenient::date")]
    pub date: Option<NaiveDate>,
}

/// Monthly arrivals/departures summary for HR.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MonthlyDigest {
    pub recipients: Vec<String>,
    pub month: Option<u32>,
    pub year: Option<i32>,
    pub arrivals: Vec<EmployeeSummary>,
    pub departures: Vec<EmployeeSummary>,

    /// The digest repeats entries that went out in an earlier digest.
    pub include_previously_sent: bool,
}

impl MonthlyDigest {
    pub const KIND: &'static str = "monthly-digest";
}

/// Operator-written message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ManualMessage {
    pub recipients: Vec<String>,
    pub subject: Option<String>,
    pub content: Option<String>,
    #[serde(flatten)]
    pub employee: EmployeeFields,
}

impl ManualMessage {
    pub const KIND: &'static str = "manual";
}

mod lenient {
    use super::*;

    /// `YYYY-MM-DD`, or an RFC 3339 timestamp reduced to its calendar date
    /// in the timestamp's own offset.
    pub(super) fn parse_date(raw: &str) -> Option<NaiveDate> {
        let raw = raw.trim();
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|t| t.date_naive()))
    }

    pub(super) fn date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(|v| v.as_str()).and_then(parse_date))
    }

    /// Whole numbers, floats (truncated) and numeric strings.
    pub(super) fn integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(serde_json::Value::Number(n)) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                    .map(|f| f.trunc() as i64)
            }),
            Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        })
    }
}

/// The union of all payload shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationPayload {
    OnboardingNotice(OnboardingNotice),
    ProbationWarning(ProbationNotice),
    ProbationReminder(ProbationNotice),
    MonthlyDigest(MonthlyDigest),
    Manual(ManualMessage),

    /// Any kind this build does not know. Rendered generically.
    Other { kind: JobKind, data: serde_json::Value },
}

impl NotificationPayload {
    /// Decode a stored payload for its kind.
    ///
    /// Unknown kinds never fail. A known kind fails only when the JSON has
    /// the wrong shape (e.g. a string where a list is expected); a `null`
    /// payload is treated as an empty object.
    pub fn decode(kind: &JobKind, payload: &serde_json::Value) -> Result<Self, serde_json::Error> {
        let value = match payload {
            serde_json::Value::Null => serde_json::Value::Object(Default::default()),
            other => other.clone(),
        };
        let decoded = match kind.as_str() {
            OnboardingNotice::KIND => Self::OnboardingNotice(serde_json::from_value(value)?),
            ProbationNotice::WARNING_KIND => Self::ProbationWarning(serde_json::from_value(value)?),
            ProbationNotice::REMINDER_KIND => {
                Self::ProbationReminder(serde_json::from_value(value)?)
            }
            MonthlyDigest::KIND => Self::MonthlyDigest(serde_json::from_value(value)?),
            ManualMessage::KIND => Self::Manual(serde_json::from_value(value)?),
            _ => Self::Other {
                kind: kind.clone(),
                data: value,
            },
        };
        Ok(decoded)
    }

    /// Recipient addresses with blanks removed.
    pub fn recipients(&self) -> Vec<String> {
        let raw: Vec<String> = match self {
            Self::OnboardingNotice(p) => p.recipients.clone(),
            Self::ProbationWarning(p) | Self::ProbationReminder(p) => p.recipients.clone(),
            Self::MonthlyDigest(p) => p.recipients.clone(),
            Self::Manual(p) => p.recipients.clone(),
            Self::Other { data, .. } => data
                .get("recipients")
                .and_then(|v| v.as_array())
                .map(|list| {
                    list.iter()
                        .filter_map(|v| v.as_str().map(str::to_string))
                        .collect()
                })
                .unwrap_or_default(),
        };
        raw.into_iter()
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect()
    }
}
