//! Domain model: ids, job/history records, status machine, payloads, decisions.

pub mod attempt;
pub mod decision;
pub mod history;
pub mod ids;
pub mod job;
pub mod kind;
pub mod payload;
pub mod state;

pub use attempt::{AttemptOutcome, AttemptRecord, AttemptResult};
pub use decision::{Decider, Decision, DefaultDecider};
pub use history::HistoryRecord;
pub use ids::{AttemptId, HistoryId, JobId, ParseIdError};
pub use job::{
    DEFAULT_MAX_RETRIES, DEFAULT_PRIORITY, JobDefaults, JobRecord, JobSummary, NewJob,
    TransitionError,
};
pub use kind::JobKind;
pub use payload::{
    EmployeeFields, EmployeeSummary, ManualMessage, MonthlyDigest, NotificationPayload,
    OnboardingNotice, ProbationNotice,
};
pub use state::JobStatus;
