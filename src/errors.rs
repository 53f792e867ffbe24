//! Error types for connectors-rs.

use serde::{Deserialize, Serialize};

use crate::secret::Redact;
use crate::utils::text::scrub_secrets;

/// Alias for Results returning [`ConnectorError`].
pub type Result<T> = std::result::Result<T, ConnectorError>;

/// Top-level error type for connectors-rs.
#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error("Test connection failed at step '{step}' ({kind}): {message}")]
    TestConnectionFailed {
        step: String,
        kind: FailureKind,
        message: String,
    },

    #[error("Invalid diagnostic steps: {0}")]
    InvalidSteps(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Workflow error: {0}")]
    Workflow(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error on '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

impl ConnectorError {
    /// Create an IO error with a path context.
    pub(crate) fn io(path: impl std::fmt::Display, source: std::io::Error) -> Self {
        ConnectorError::Io {
            path: path.to_string(),
            source,
        }
    }
}

/// Classified cause of a connection or probe failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    /// Host unreachable, connection refused, DNS failure.
    Connectivity,
    /// Credentials rejected.
    Authentication,
    /// Authenticated, but not allowed to perform the probed operation.
    AccessDenied,
    /// TLS negotiation or certificate validation failed.
    Tls,
    /// The configuration cannot describe a reachable endpoint.
    InvalidConfig,
    Timeout,
    /// The store rejected or failed the diagnostic query.
    Query,
    Other,
}

impl FailureKind {
    /// Best-effort classification from an error message.
    ///
    /// Client libraries rarely expose structured causes for server-side
    /// security errors, so this falls back to well-known message fragments
    /// (`Neo.ClientError.Security.Forbidden`, `connection refused`, ...).
    pub fn from_message(message: &str) -> Self {
        let msg = message.to_lowercase();
        let has = |needles: &[&str]| needles.iter().any(|n| msg.contains(n));

        if has(&["security.forbidden", "forbidden", "permission denied", "access denied", "not allowed"]) {
            FailureKind::AccessDenied
        } else if has(&["unauthorized", "authentication", "credentials", "invalid username or password"]) {
            FailureKind::Authentication
        } else if has(&["certificate", "tls", "ssl", "x509", "unknownissuer"]) {
            FailureKind::Tls
        } else if has(&["timed out", "timeout", "deadline"]) {
            FailureKind::Timeout
        } else if has(&["connection refused", "unreachable", "dns", "failed to lookup", "connection reset", "broken pipe"]) {
            FailureKind::Connectivity
        } else if has(&["syntax", "statement", "cypher", "query"]) {
            FailureKind::Query
        } else {
            FailureKind::Other
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FailureKind::Connectivity => "connectivity",
            FailureKind::Authentication => "authentication",
            FailureKind::AccessDenied => "access denied",
            FailureKind::Tls => "tls",
            FailureKind::InvalidConfig => "invalid config",
            FailureKind::Timeout => "timeout",
            FailureKind::Query => "query",
            FailureKind::Other => "other",
        };
        f.write_str(s)
    }
}

/// Failure to build a live connection from a configuration.
///
/// Carries only the redacted rendering of the configuration and a cause text
/// that has been scrubbed of every secret the configuration holds. The client
/// error is not kept as a `source`, since its `Display` may echo credentials.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Unknown error connecting with {config}: {cause}")]
pub struct ConnectionError {
    pub config: String,
    pub kind: FailureKind,
    pub cause: String,
}

impl ConnectionError {
    pub fn new(config: &impl Redact, kind: FailureKind, cause: impl std::fmt::Display) -> Self {
        Self {
            config: config.redacted(),
            kind,
            cause: scrub_secrets(&cause.to_string(), &config.secrets()),
        }
    }
}

/// A diagnostic probe failure, captured as data by the test runner.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct StepFailure {
    pub kind: FailureKind,
    pub message: String,
    /// Full cause chain, when richer than `message`.
    pub detail: Option<String>,
}

impl StepFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}
