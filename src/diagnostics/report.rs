//! Step results and the aggregate test-connection report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::FailureKind;

/// Status of one diagnostic step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    Succeeded,
    Failed,
    /// Not executed because a declared prerequisite did not succeed.
    Skipped,
}

/// Aggregate status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverallStatus {
    #[serde(rename = "Successful")]
    Succeeded,
    Failed,
}

/// Outcome of a single [`crate::DiagnosticStep`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResult {
    pub name: String,
    pub status: StepStatus,
    pub message: Option<String>,
    pub kind: Option<FailureKind>,
    /// Full cause text for failed steps.
    pub error_log: Option<String>,
    pub elapsed_ms: u64,
}

impl StepResult {
    pub fn succeeded(name: impl Into<String>, elapsed_ms: u64) -> Self {
        Self {
            name: name.into(),
            status: StepStatus::Succeeded,
            message: None,
            kind: None,
            error_log: None,
            elapsed_ms,
        }
    }

    pub fn failed(
        name: impl Into<String>,
        kind: FailureKind,
        message: impl Into<String>,
        error_log: Option<String>,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            name: name.into(),
            status: StepStatus::Failed,
            message: Some(message.into()),
            kind: Some(kind),
            error_log,
            elapsed_ms,
        }
    }

    pub fn skipped(name: impl Into<String>, dependency: &str) -> Self {
        Self {
            name: name.into(),
            status: StepStatus::Skipped,
            message: Some(format!("skipped: prerequisite step '{dependency}' did not succeed")),
            kind: None,
            error_log: None,
            elapsed_ms: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == StepStatus::Succeeded
    }
}

/// Result of one test-connection run against one service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub service: String,
    pub status: OverallStatus,
    pub steps: Vec<StepResult>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_updated_at: DateTime<Utc>,
}

impl Report {
    /// Build a report, deriving `status` from `steps`.
    ///
    /// The status is [`OverallStatus::Succeeded`] iff every step succeeded;
    /// an empty step list is vacuously successful.
    pub fn new(service: impl Into<String>, steps: Vec<StepResult>) -> Self {
        let status = if steps.iter().all(StepResult::is_success) {
            OverallStatus::Succeeded
        } else {
            OverallStatus::Failed
        };
        Self {
            service: service.into(),
            status,
            steps,
            last_updated_at: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OverallStatus::Succeeded
    }

    /// First step that ran and failed, in declaration order.
    pub fn first_failure(&self) -> Option<&StepResult> {
        self.steps.iter().find(|s| s.status == StepStatus::Failed)
    }

    pub fn step(&self, name: &str) -> Option<&StepResult> {
        self.steps.iter().find(|s| s.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn all_succeeded_is_success() {
        let report = Report::new(
            "Amundsen",
            vec![StepResult::succeeded("A", 1), StepResult::succeeded("B", 2)],
        );
        assert_eq!(report.status, OverallStatus::Succeeded);
        assert!(report.first_failure().is_none());
    }

    #[test]
    fn any_failure_fails_report() {
        let report = Report::new(
            "Amundsen",
            vec![
                StepResult::succeeded("A", 1),
                StepResult::failed("B", FailureKind::AccessDenied, "denied", None, 3),
            ],
        );
        assert_eq!(report.status, OverallStatus::Failed);
        assert_eq!(report.first_failure().map(|s| s.name.as_str()), Some("B"));
    }

    #[test]
    fn skipped_step_fails_report() {
        let report = Report::new(
            "Amundsen",
            vec![StepResult::succeeded("A", 1), StepResult::skipped("B", "X")],
        );
        assert_eq!(report.status, OverallStatus::Failed);
        // A skip is not a failure of its own.
        assert!(report.first_failure().is_none());
    }

    #[test]
    fn empty_report_is_success() {
        assert!(Report::new("Amundsen", vec![]).is_success());
    }

    #[test]
    fn skipped_message_names_dependency() {
        let step = StepResult::skipped("GetTables", "CheckAccess");
        assert!(step.message.unwrap().contains("CheckAccess"));
    }

    #[test]
    fn serializes_wire_shape() {
        let mut report = Report::new(
            "Amundsen",
            vec![StepResult::failed("CheckAccess", FailureKind::AccessDenied, "denied", Some("trace".into()), 5)],
        );
        report.last_updated_at = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["status"], json!("Failed"));
        assert_eq!(value["lastUpdatedAt"], json!(1_700_000_000_000_i64));
        assert_eq!(value["steps"][0]["name"], json!("CheckAccess"));
        assert_eq!(value["steps"][0]["kind"], json!("accessDenied"));
        assert_eq!(value["steps"][0]["errorLog"], json!("trace"));

        let ok = serde_json::to_value(Report::new("Amundsen", vec![])).unwrap();
        assert_eq!(ok["status"], json!("Successful"));
    }
}
