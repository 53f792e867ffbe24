//! Neo4j connection implementation.
//!
//! Uses `neo4rs` 0.8 for async, pooled Bolt connections. TLS is selected
//! through the URI scheme (`bolt+s`, `neo4j+s`); extra trust roots come from
//! `caCertificate`.

use std::time::Instant;

use async_trait::async_trait;
use neo4rs::{
    query, ConfigBuilder, Graph, Neo4jClientErrorKind, Neo4jErrorKind, Neo4jSecurityErrorKind, Row,
};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::Neo4jConfig;
use crate::connection::{Connection, CypherConnection};
use crate::errors::{ConnectionError, ConnectorError, FailureKind, Result, StepFailure};
use crate::secret::Redact;
use crate::utils::{first_line, scrub_secrets, truncate_with_ellipsis};

/// Statement used to verify a freshly opened session.
const VERIFY_QUERY: &str = "RETURN 1";

/// Longest failure message kept on a step; the full text goes to `detail`.
const MAX_MESSAGE_LEN: usize = 512;

/// Build the Bolt URI for `config`.
///
/// `hostPort` may carry its own `bolt://` or `neo4j://` scheme; any TLS
/// suffix on it is replaced by the one implied by `encrypted`:
///
/// | encrypted | validate_ssl | scheme     |
/// |-----------|--------------|------------|
/// | false     | –            | `bolt`     |
/// | true      | true         | `bolt+s`   |
/// | true      | false        | rejected   |
///
/// `neo4rs` verifies server certificates on every TLS scheme, `+ssc`
/// included, so an unverified session cannot be offered.
pub fn connection_uri(config: &Neo4jConfig) -> std::result::Result<String, String> {
    let raw = config.host_port.trim();
    let (scheme, address) = match raw.split_once("://") {
        Some((scheme, address)) => (scheme, address),
        None => ("bolt", raw),
    };

    let base = scheme.split('+').next().unwrap_or(scheme).to_ascii_lowercase();
    if base != "bolt" && base != "neo4j" {
        return Err(format!("unsupported scheme '{scheme}'"));
    }
    if address.is_empty() {
        return Err("missing host".to_string());
    }

    let suffix = match (config.encrypted, config.validate_ssl) {
        (false, _) => "",
        (true, true) => "+s",
        (true, false) => {
            return Err(
                "validateSSL=false is not supported: server certificates are always verified; \
                 trust a self-signed server through caCertificate"
                    .to_string(),
            )
        }
    };
    Ok(format!("{base}{suffix}://{address}"))
}

/// Map a `neo4rs` error onto a [`FailureKind`].
fn failure_kind(err: &neo4rs::Error) -> FailureKind {
    match err {
        neo4rs::Error::IOError { .. } | neo4rs::Error::ConnectionError { .. } => {
            FailureKind::from_message(&err.to_string()).or_connectivity()
        }
        neo4rs::Error::AuthenticationError { .. } => FailureKind::Authentication,
        neo4rs::Error::UrlParseError { .. }
        | neo4rs::Error::UnsupportedScheme { .. }
        | neo4rs::Error::InvalidDnsName { .. } => FailureKind::InvalidConfig,
        neo4rs::Error::Neo4j(server) => match server.kind() {
            Neo4jErrorKind::Client(Neo4jClientErrorKind::Security(
                Neo4jSecurityErrorKind::Authentication
                | Neo4jSecurityErrorKind::AuthorizationExpired
                | Neo4jSecurityErrorKind::TokenExpired,
            )) => FailureKind::Authentication,
            Neo4jErrorKind::Client(Neo4jClientErrorKind::Security(_)) => FailureKind::AccessDenied,
            _ => match FailureKind::from_message(&err.to_string()) {
                FailureKind::Other => FailureKind::Query,
                kind => kind,
            },
        },
        other => FailureKind::from_message(&other.to_string()),
    }
}

impl FailureKind {
    /// Transport errors that carry no more specific marker are connectivity.
    fn or_connectivity(self) -> Self {
        match self {
            FailureKind::Other | FailureKind::Query => FailureKind::Connectivity,
            kind => kind,
        }
    }
}

/// Run [`VERIFY_QUERY`] in an explicit transaction and roll it back.
///
/// `Graph::run` and `Graph::execute` retry pool errors for up to a minute, so
/// a refused socket or a rejected login would only surface as a timeout.
/// Transactions are never retried.
async fn verify(graph: &Graph) -> neo4rs::Result<()> {
    let mut txn = graph.start_txn().await?;
    txn.run(query(VERIFY_QUERY)).await?;
    txn.rollback().await
}

/// Open a pooled graph handle and verify it with a round trip.
///
/// On verification failure the handle is dropped here, before the error
/// propagates, so no half-open pool escapes.
async fn open_graph(config: &Neo4jConfig) -> std::result::Result<Graph, ConnectionError> {
    let uri = connection_uri(config)
        .map_err(|cause| ConnectionError::new(config, FailureKind::InvalidConfig, cause))?;

    let mut builder = ConfigBuilder::default()
        .uri(uri.as_str())
        .user(config.username.as_str())
        .password(config.password.expose());

    if let (true, Some(ca)) = (config.encrypted, config.ca_certificate.as_deref()) {
        let readable = tokio::fs::metadata(ca).await.map(|m| m.is_file()).unwrap_or(false);
        if !readable {
            return Err(ConnectionError::new(
                config,
                FailureKind::InvalidConfig,
                format!("caCertificate '{ca}' is not a readable file"),
            ));
        }
        builder = builder.with_client_certificate(ca);
    }

    let neo_config = builder
        .build()
        .map_err(|e| ConnectionError::new(config, failure_kind(&e), e))?;

    let handshake = async {
        let graph = Graph::connect(neo_config).await?;
        verify(&graph).await?;
        Ok::<Graph, neo4rs::Error>(graph)
    };

    match tokio::time::timeout(config.connection_timeout(), handshake).await {
        Ok(Ok(graph)) => Ok(graph),
        Ok(Err(e)) => Err(ConnectionError::new(config, failure_kind(&e), e)),
        Err(_) => Err(ConnectionError::new(
            config,
            FailureKind::Timeout,
            format!(
                "no response within {}s",
                config.connection_timeout().as_secs()
            ),
        )),
    }
}

struct Session {
    graph: Graph,
    opened_at: Instant,
}

/// Live Neo4j handle produced by [`connect`].
///
/// Sessions older than the configured `maxConnectionLifeTime` are re-opened
/// transparently before the next query.
pub struct Neo4jConnection {
    config: Neo4jConfig,
    session: Mutex<Session>,
}

/// Connection factory for Neo4j.
///
/// # Errors
/// Returns [`ConnectionError`] if the URI is malformed, the host is
/// unreachable, the credentials are rejected, TLS negotiation fails, or the
/// verification round trip does not complete within `connectionTimeout`.
pub async fn connect(config: &Neo4jConfig) -> std::result::Result<Neo4jConnection, ConnectionError> {
    info!(config = %config, "opening neo4j connection");
    let graph = open_graph(config).await?;
    debug!(host = %config.host_port, "neo4j connection verified");

    Ok(Neo4jConnection {
        config: config.clone(),
        session: Mutex::new(Session {
            graph,
            opened_at: Instant::now(),
        }),
    })
}

impl Neo4jConnection {
    /// Current graph handle, re-opened if the session outlived its lifetime.
    async fn graph(&self) -> std::result::Result<Graph, StepFailure> {
        let mut session = self.session.lock().await;
        if session.opened_at.elapsed() >= self.config.max_connection_lifetime() {
            debug!(host = %self.config.host_port, "neo4j session exceeded max lifetime, re-opening");
            let graph = open_graph(&self.config)
                .await
                .map_err(|e| StepFailure::new(e.kind, e.cause))?;
            *session = Session {
                graph,
                opened_at: Instant::now(),
            };
        }
        Ok(session.graph.clone())
    }

    fn step_failure(&self, err: neo4rs::Error) -> StepFailure {
        let secrets = self.config.secrets();
        let full = scrub_secrets(&err.to_string(), &secrets);
        let message = truncate_with_ellipsis(first_line(&full), MAX_MESSAGE_LEN);
        StepFailure::new(failure_kind(&err), message)
            .with_detail(scrub_secrets(&format!("{err:?}"), &secrets))
    }

    /// Run a read-only Cypher statement and collect its rows.
    ///
    /// The statement runs in its own transaction, which is rolled back.
    pub async fn execute_query(&self, cypher: &str) -> std::result::Result<Vec<Row>, StepFailure> {
        let graph = self.graph().await?;
        let mut txn = graph.start_txn().await.map_err(|e| self.step_failure(e))?;
        let mut stream = txn
            .execute(query(cypher))
            .await
            .map_err(|e| self.step_failure(e))?;

        let mut rows = Vec::new();
        while let Some(row) = stream
            .next(txn.handle())
            .await
            .map_err(|e| self.step_failure(e))?
        {
            rows.push(row);
        }
        txn.rollback().await.map_err(|e| self.step_failure(e))?;
        debug!(rows = rows.len(), "neo4j query completed");
        Ok(rows)
    }
}

#[async_trait]
impl CypherConnection for Neo4jConnection {
    async fn read(&self, cypher: &str) -> std::result::Result<usize, StepFailure> {
        self.execute_query(cypher).await.map(|rows| rows.len())
    }
}

impl Connection for Neo4jConnection {
    async fn ping(&self) -> Result<()> {
        let graph = self
            .graph()
            .await
            .map_err(|f| ConnectionError::new(&self.config, f.kind, f.message))?;
        verify(&graph)
            .await
            .map_err(|e| ConnectorError::from(ConnectionError::new(&self.config, failure_kind(&e), e)))
    }

    async fn close(self) -> Result<()> {
        // neo4rs releases pooled connections when the last Graph clone drops.
        drop(self.session.into_inner());
        debug!(host = %self.config.host_port, "neo4j connection closed");
        Ok(())
    }
}
