//! Report delivery: inline pre-flight gate or automation-workflow persistence.
//!
//! # Stores
//! - [`memory::InMemoryWorkflowStore`]: process-local, for embedding and tests.
//! - [`file::FileWorkflowStore`]: one JSON document per workflow on disk.
//! - [`http::CatalogApiStore`]: PATCHes the workflow on the catalog REST API.

pub mod file;
pub mod http;
pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::diagnostics::{Report, RunPolicy, StepStatus, TestRunner};
use crate::errors::{ConnectorError, FailureKind, Result};

pub use file::FileWorkflowStore;
pub use http::CatalogApiStore;
pub use memory::InMemoryWorkflowStore;

/// Automation workflow that receives the report of a diagnostics request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkflowRef {
    pub id: Uuid,
    pub name: String,
}

impl WorkflowRef {
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Lifecycle status recorded on the automation workflow itself. It only says
/// the run completed; the report says whether the connection test passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowStatus {
    Successful,
}

/// What a store keeps for one workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRecord {
    pub workflow: WorkflowRef,
    pub status: WorkflowStatus,
    pub response: Report,
}

impl WorkflowRecord {
    /// The workflow ran to completion; `response` says whether the test passed.
    pub fn completed(workflow: &WorkflowRef, report: &Report) -> Self {
        Self {
            workflow: workflow.clone(),
            status: WorkflowStatus::Successful,
            response: report.clone(),
        }
    }
}

/// Persistence collaborator for workflow-mode reports.
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    /// Record `report` as the response of `workflow`.
    async fn record_report(&self, workflow: &WorkflowRef, report: &Report) -> Result<()>;
}

/// Where a test-connection run's report goes.
#[derive(Clone, Copy)]
pub enum ReportSink<'a> {
    /// Pre-flight gate: fail the caller on the first failing step.
    Inline,
    /// Diagnostics request: persist the full report for later display.
    Workflow {
        workflow: &'a WorkflowRef,
        store: &'a dyn WorkflowStore,
    },
}

impl<'a> ReportSink<'a> {
    pub fn workflow(workflow: &'a WorkflowRef, store: &'a dyn WorkflowStore) -> Self {
        ReportSink::Workflow { workflow, store }
    }

    /// Inline when no workflow is attached.
    pub fn from_optional(workflow: Option<(&'a WorkflowRef, &'a dyn WorkflowStore)>) -> Self {
        match workflow {
            Some((workflow, store)) => ReportSink::Workflow { workflow, store },
            None => ReportSink::Inline,
        }
    }

    /// Runner policy matching this sink.
    pub fn policy(&self) -> RunPolicy {
        match self {
            ReportSink::Inline => RunPolicy::FailFast,
            ReportSink::Workflow { .. } => RunPolicy::CollectAll,
        }
    }

    /// Hand `report` over.
    ///
    /// Inline: `Ok(None)` on success, [`ConnectorError::TestConnectionFailed`]
    /// naming the first failing step otherwise. Workflow: the report is
    /// recorded and returned; only a store failure yields `Err`.
    pub async fn deliver(self, report: Report) -> Result<Option<Report>> {
        match self {
            ReportSink::Inline => {
                if report.is_success() {
                    return Ok(None);
                }
                Err(inline_failure(&report))
            }
            ReportSink::Workflow { workflow, store } => {
                info!(workflow = %workflow.id, status = ?report.status, "recording test connection report");
                store.record_report(workflow, &report).await.map_err(|e| {
                    warn!(workflow = %workflow.id, error = %e, "failed to record test connection report");
                    e
                })?;
                Ok(Some(report))
            }
        }
    }
}

fn inline_failure(report: &Report) -> ConnectorError {
    let culprit = report
        .first_failure()
        .or_else(|| report.steps.iter().find(|s| s.status != StepStatus::Succeeded));

    match culprit {
        Some(step) => ConnectorError::TestConnectionFailed {
            step: step.name.clone(),
            kind: step.kind.unwrap_or(FailureKind::Other),
            message: step.message.clone().unwrap_or_default(),
        },
        None => ConnectorError::TestConnectionFailed {
            step: String::new(),
            kind: FailureKind::Other,
            message: format!("test connection for {} failed", report.service),
        },
    }
}

/// Run `runner` against `connection` and deliver the report to `sink`.
///
/// The runner policy follows the sink: fail-fast inline, collect-all for
/// workflows.
pub async fn test_connection_steps<C: Sync>(
    connection: &C,
    service: &str,
    runner: &TestRunner<C>,
    sink: ReportSink<'_>,
) -> Result<Option<Report>> {
    let report = runner.run(connection, service, sink.policy()).await;
    sink.deliver(report).await
}
