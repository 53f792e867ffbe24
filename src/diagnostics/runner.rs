//! Executes diagnostic steps in order and builds a [`Report`].

use std::collections::HashMap;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::diagnostics::report::{Report, StepResult, StepStatus};
use crate::diagnostics::step::DiagnosticStep;
use crate::errors::{ConnectorError, FailureKind, Result, StepFailure};

/// What the runner does after a step fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPolicy {
    /// Stop at the first failure; later steps are neither run nor reported.
    FailFast,
    /// Run every step so the report carries the full picture.
    CollectAll,
}

/// Ordered, validated set of diagnostic steps for one connection type.
pub struct TestRunner<C> {
    steps: Vec<DiagnosticStep<C>>,
}

impl<C> std::fmt::Debug for TestRunner<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestRunner").field("steps", &self.steps).finish()
    }
}

impl<C: Sync> TestRunner<C> {
    /// Validate and wrap a step list.
    ///
    /// # Errors
    /// [`ConnectorError::InvalidSteps`] if two steps share a name or a step
    /// depends on a step that is not declared before it.
    pub fn new(steps: Vec<DiagnosticStep<C>>) -> Result<Self> {
        let mut seen: Vec<&str> = Vec::with_capacity(steps.len());
        for step in &steps {
            if seen.contains(&step.name()) {
                return Err(ConnectorError::InvalidSteps(format!(
                    "duplicate step name '{}'",
                    step.name()
                )));
            }
            if let Some(dep) = step.dependency() {
                if !seen.contains(&dep) {
                    return Err(ConnectorError::InvalidSteps(format!(
                        "step '{}' depends on '{}', which is not declared before it",
                        step.name(),
                        dep
                    )));
                }
            }
            seen.push(step.name());
        }
        Ok(Self { steps })
    }

    /// Run the steps against `connection` in declaration order.
    pub async fn run(&self, connection: &C, service: &str, policy: RunPolicy) -> Report {
        info!(service, steps = self.steps.len(), ?policy, "running test connection");

        let mut results: Vec<StepResult> = Vec::with_capacity(self.steps.len());
        let mut status_of: HashMap<&str, StepStatus> = HashMap::with_capacity(self.steps.len());

        for step in &self.steps {
            let name = step.name();

            if let Some(dep) = step.dependency() {
                if status_of.get(dep) != Some(&StepStatus::Succeeded) {
                    debug!(service, step = name, dependency = dep, "skipping step");
                    status_of.insert(name, StepStatus::Skipped);
                    results.push(StepResult::skipped(name, dep));
                    continue;
                }
            }

            let result = run_step(step, connection, service).await;
            status_of.insert(name, result.status);
            let failed = result.status == StepStatus::Failed;
            results.push(result);

            if failed && policy == RunPolicy::FailFast {
                debug!(service, step = name, "fail-fast: not running remaining steps");
                break;
            }
        }

        let report = Report::new(service, results);
        info!(service, status = ?report.status, "test connection finished");
        report
    }
}

async fn run_step<C: Sync>(step: &DiagnosticStep<C>, connection: &C, service: &str) -> StepResult {
    let name = step.name();
    debug!(service, step = name, "running step");
    let started = Instant::now();

    let outcome = match step.timeout() {
        Some(limit) => match tokio::time::timeout(limit, step.probe(connection)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(StepFailure::new(
                FailureKind::Timeout,
                format!("step did not complete within {}ms", limit.as_millis()),
            )),
        },
        None => step.probe(connection).await,
    };
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    match outcome {
        Ok(()) => {
            debug!(service, step = name, elapsed_ms, "step succeeded");
            StepResult::succeeded(name, elapsed_ms)
        }
        Err(failure) => {
            warn!(service, step = name, kind = %failure.kind, error = %failure.message, "step failed");
            StepResult::failed(name, failure.kind, failure.message, failure.detail, elapsed_ms)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::report::OverallStatus;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Minimal connection stand-in: counts probe invocations.
    #[derive(Default)]
    struct Probe {
        calls: AtomicUsize,
    }

    fn ok_step(name: &str) -> DiagnosticStep<Probe> {
        DiagnosticStep::new(name, |c: &Probe| {
            Box::pin(async move {
                c.calls.fetch_add(1, Ordering::SeqCst);
                Ok::<(), StepFailure>(())
            })
        })
    }

    fn failing_step(name: &str) -> DiagnosticStep<Probe> {
        DiagnosticStep::new(name, |c: &Probe| {
            Box::pin(async move {
                c.calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(StepFailure::new(FailureKind::AccessDenied, "permission denied"))
            })
        })
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = TestRunner::new(vec![ok_step("A"), ok_step("A")]).unwrap_err();
        assert!(matches!(err, ConnectorError::InvalidSteps(msg) if msg.contains("'A'")));
    }

    #[test]
    fn rejects_forward_dependency() {
        let err = TestRunner::new(vec![ok_step("A").depends_on("B"), ok_step("B")]).unwrap_err();
        assert!(matches!(err, ConnectorError::InvalidSteps(_)));
    }

    #[test]
    fn rejects_self_dependency() {
        assert!(TestRunner::new(vec![ok_step("A").depends_on("A")]).is_err());
    }

    #[tokio::test]
    async fn all_steps_succeed() {
        let runner = TestRunner::new(vec![ok_step("A"), ok_step("B")]).unwrap();
        let conn = Probe::default();

        let report = runner.run(&conn, "svc", RunPolicy::CollectAll).await;

        assert_eq!(report.status, OverallStatus::Succeeded);
        assert_eq!(report.steps.len(), 2);
        assert_eq!(conn.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn dependent_step_skipped_after_failure() {
        let runner = TestRunner::new(vec![
            failing_step("CheckAccess"),
            ok_step("GetUsers").depends_on("CheckAccess"),
            ok_step("GetTables").depends_on("GetUsers"),
        ])
        .unwrap();
        let conn = Probe::default();

        let report = runner.run(&conn, "svc", RunPolicy::CollectAll).await;

        let statuses: Vec<StepStatus> = report.steps.iter().map(|s| s.status).collect();
        assert_eq!(statuses, vec![StepStatus::Failed, StepStatus::Skipped, StepStatus::Skipped]);
        assert_eq!(conn.calls.load(Ordering::SeqCst), 1);
        assert_eq!(report.status, OverallStatus::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn step_timeout_records_failure() {
        let slow = DiagnosticStep::new("Slow", |_c: &Probe| {
            Box::pin(async move {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok::<(), StepFailure>(())
            })
        })
        .with_timeout(Duration::from_secs(1));
        let runner = TestRunner::new(vec![slow]).unwrap();

        let report = runner.run(&Probe::default(), "svc", RunPolicy::CollectAll).await;

        let step = report.step("Slow").unwrap();
        assert_eq!(step.status, StepStatus::Failed);
        assert_eq!(step.kind, Some(FailureKind::Timeout));
    }
}
