//! Job status state machine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a job (and, mirrored, of its history record).
///
/// Transitions:
/// - Queued -> Processing (claimed by the processor)
/// - Processing -> Sent
/// - Processing -> Queued (retry scheduled, `send_at` pushed back)
/// - Processing -> Failed (retries exhausted or internal error)
///
/// `Sent` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Queued,
    Processing,
    Sent,
    Failed,
}

impl JobStatus {
    pub const ALL: [JobStatus; 4] = [
        JobStatus::Queued,
        JobStatus::Processing,
        JobStatus::Sent,
        JobStatus::Failed,
    ];

    /// No further transitions happen from a terminal status.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Sent | JobStatus::Failed)
    }

    /// Eligible for batch selection (subject to `send_at`).
    pub fn is_claimable(self) -> bool {
        matches!(self, JobStatus::Queued)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "QUEUED",
            JobStatus::Processing => "PROCESSING",
            JobStatus::Sent => "SENT",
            JobStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::queued(JobStatus::Queued, false, true)]
    #[case::processing(JobStatus::Processing, false, false)]
    #[case::sent(JobStatus::Sent, true, false)]
    #[case::failed(JobStatus::Failed, true, false)]
    fn classification(#[case] status: JobStatus, #[case] terminal: bool, #[case] claimable: bool) {
        assert_eq!(status.is_terminal(), terminal);
        assert_eq!(status.is_claimable(), claimable);
    }

    #[test]
    fn serializes_as_screaming_snake_case() {
        let s = serde_json::to_string(&JobStatus::Processing).unwrap();
        assert_eq!(s, "\"PROCESSING\"");
        assert_eq!(JobStatus::Failed.to_string(), "FAILED");
    }
}
