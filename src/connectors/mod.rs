//! Connector registry.
//!
//! A connector ties a configuration type to its connection factory and its
//! ordered list of diagnostic steps. [`test_connection`] and
//! [`connect_and_test`] drive any connector through the same protocol.
//!
//! # Implementations
//! - [`amundsen::Amundsen`]: Amundsen catalog on Neo4j.

pub mod amundsen;

use crate::connection::{release, Connection};
use crate::diagnostics::{DiagnosticStep, Report, TestRunner};
use crate::errors::{ConnectionError, Result};
use crate::secret::Redact;
use crate::sink::{test_connection_steps, ReportSink};

/// An adapter from one external system to the common connection/test interface.
#[allow(async_fn_in_trait)]
pub trait Connector {
    type Config: Redact + Send + Sync;
    type Connection: Connection;

    /// Service identifier reported with every test-connection run.
    const SERVICE_TYPE: &'static str;

    /// Connection factory.
    async fn connect(config: &Self::Config) -> std::result::Result<Self::Connection, ConnectionError>;

    /// Diagnostic steps, in execution order.
    fn test_steps() -> Vec<DiagnosticStep<Self::Connection>>;

    fn test_runner() -> Result<TestRunner<Self::Connection>> {
        TestRunner::new(Self::test_steps())
    }
}

/// Run `K`'s diagnostic steps against an existing connection.
///
/// Inline sinks fail on the first failing step; workflow sinks receive the
/// full report. The connection stays open; its owner closes it.
pub async fn test_connection<K: Connector>(
    connection: &K::Connection,
    sink: ReportSink<'_>,
) -> Result<Option<Report>> {
    let runner = K::test_runner()?;
    test_connection_steps(connection, K::SERVICE_TYPE, &runner, sink).await
}

/// Build a connection from `config`, test it, and close it again.
///
/// # Errors
/// [`crate::ConnectorError::Connection`] if the factory fails; otherwise as
/// [`test_connection`].
pub async fn connect_and_test<K: Connector>(
    config: &K::Config,
    sink: ReportSink<'_>,
) -> Result<Option<Report>> {
    let connection = K::connect(config).await?;
    let outcome = test_connection::<K>(&connection, sink).await;
    release(connection, outcome).await
}
