//! A named probe against a live connection.

use std::fmt;
use std::time::Duration;

use futures::future::BoxFuture;

use crate::errors::StepFailure;

/// Outcome of a single probe invocation.
pub type ProbeResult = Result<(), StepFailure>;

/// A probe borrows the connection for the duration of its future.
pub type Probe<C> = Box<dyn for<'c> Fn(&'c C) -> BoxFuture<'c, ProbeResult> + Send + Sync>;

/// A named, independently reportable connectivity or capability check.
///
/// Connectors register an ordered `Vec<DiagnosticStep<_>>`; the runner
/// executes them in declaration order.
pub struct DiagnosticStep<C> {
    name: String,
    depends_on: Option<String>,
    timeout: Option<Duration>,
    probe: Probe<C>,
}

impl<C> DiagnosticStep<C> {
    /// Create a step from a probe closure.
    ///
    /// ```ignore
    /// DiagnosticStep::new("CheckAccess", |conn: &Neo4jConnection| {
    ///     Box::pin(async move { conn.execute_query(QUERY).await.map(|_| ()) })
    /// })
    /// ```
    pub fn new<F>(name: impl Into<String>, probe: F) -> Self
    where
        F: for<'c> Fn(&'c C) -> BoxFuture<'c, ProbeResult> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            depends_on: None,
            timeout: None,
            probe: Box::new(probe),
        }
    }

    /// Skip this step unless the named earlier step succeeded.
    pub fn depends_on(mut self, step: impl Into<String>) -> Self {
        self.depends_on = Some(step.into());
        self
    }

    /// Fail the step with [`crate::FailureKind::Timeout`] if the probe runs longer.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dependency(&self) -> Option<&str> {
        self.depends_on.as_deref()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub(crate) fn probe<'c>(&self, connection: &'c C) -> BoxFuture<'c, ProbeResult> {
        (self.probe)(connection)
    }
}

impl<C> fmt::Debug for DiagnosticStep<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticStep")
            .field("name", &self.name)
            .field("depends_on", &self.depends_on)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
