//! Live connection abstraction.
//!
//! Defines the [`Connection`] trait every connector's client handle satisfies,
//! plus the Neo4j implementation, and [`release`] which closes a connection
//! once the work borrowing it has finished.

pub mod neo4j;

use async_trait::async_trait;
use tracing::warn;

use crate::errors::{Result, StepFailure};

/// A live client handle built by a connection factory.
///
/// Owned exclusively by its creator. Dropping a connection releases its
/// underlying resources; [`Connection::close`] does the same gracefully and
/// reports failures.
#[allow(async_fn_in_trait)]
pub trait Connection: Send + Sync {
    /// Health check: verify the handle can still talk to the store.
    async fn ping(&self) -> Result<()>;

    /// Release the session / pool.
    async fn close(self) -> Result<()>;
}

/// A connection that answers read-only Cypher.
///
/// Diagnostic steps for graph-backed catalogs are written against this
/// trait, so they run unchanged on [`neo4j::Neo4jConnection`] and on
/// in-process doubles.
#[async_trait]
pub trait CypherConnection: Connection {
    /// Run `cypher` and return the number of rows it produced.
    async fn read(&self, cypher: &str) -> std::result::Result<usize, StepFailure>;
}

/// Close `connection`, then hand back `outcome` unchanged.
///
/// Call with the result of the work that borrowed the connection, whatever
/// that result is. If the caller panics or its future is dropped before
/// getting here, the connection is released by `Drop` instead. A failure to
/// close is logged rather than returned, so it never masks `outcome`.
pub async fn release<C: Connection, T>(connection: C, outcome: T) -> T {
    if let Err(e) = connection.close().await {
        warn!(error = %e, "failed to close connection");
    }
    outcome
}
