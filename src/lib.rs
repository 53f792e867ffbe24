//! # connectors-rs
//!
//! Connection factories and the test-connection protocol for metadata
//! ingestion connectors.
//!
//! ## Architecture
//!
//! - **Connection factory**: typed, secret-bearing config → live client handle,
//!   with every construction failure classified as a [`ConnectionError`]
//! - **Diagnostic steps**: named probes run in order by a [`TestRunner`], with
//!   dependency skips and an aggregate [`Report`]
//! - **Report sinks**: inline pre-flight gate (fail on first failure) or
//!   automation-workflow persistence (full report)

pub mod config;
pub mod errors;
pub mod secret;

pub mod connection;
pub mod connectors;
pub mod diagnostics;
pub mod sink;

pub mod utils;

pub use config::Neo4jConfig;
pub use connection::Connection;
pub use connectors::{connect_and_test, test_connection, Connector};
pub use diagnostics::{DiagnosticStep, OverallStatus, Report, RunPolicy, StepResult, StepStatus, TestRunner};
pub use errors::{ConnectionError, ConnectorError, FailureKind, Result, StepFailure};
pub use secret::{Redact, Secret};
pub use sink::{ReportSink, WorkflowRef, WorkflowStore};
