//! Test-connection diagnostics.
//!
//! A connector declares an ordered list of [`DiagnosticStep`]s; the
//! [`TestRunner`] executes them sequentially against one live connection and
//! produces a [`Report`]:
//!
//! - Steps run strictly in declaration order.
//! - A step whose `depends_on` step did not succeed is recorded as
//!   [`StepStatus::Skipped`] without running.
//! - [`RunPolicy::FailFast`] stops at the first failure (inline pre-flight);
//!   [`RunPolicy::CollectAll`] runs everything (workflow diagnostics).
//! - The report succeeds iff every recorded step succeeded.

pub mod report;
pub mod runner;
pub mod step;

pub use report::{OverallStatus, Report, StepResult, StepStatus};
pub use runner::{RunPolicy, TestRunner};
pub use step::{DiagnosticStep, Probe, ProbeResult};
