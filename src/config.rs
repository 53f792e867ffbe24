//! Connection configuration for the Neo4j-backed catalog.

use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use validator::Validate;

use crate::errors::{ConnectorError, Result};
use crate::secret::{Redact, Secret, MASK};

/// Default `maxConnectionLifeTime`, in seconds.
pub const DEFAULT_MAX_CONNECTION_LIFETIME_SECS: u64 = 50;

/// Default bound on opening and verifying a session, in seconds.
pub const DEFAULT_CONNECTION_TIMEOUT_SECS: u64 = 10;

fn default_max_connection_lifetime() -> u64 {
    DEFAULT_MAX_CONNECTION_LIFETIME_SECS
}

fn default_connection_timeout() -> u64 {
    DEFAULT_CONNECTION_TIMEOUT_SECS
}

/// How to reach one Neo4j instance.
///
/// Deserializes from the service-connection JSON the ingestion framework
/// hands over (`hostPort`, `username`, `password`, `encrypted`,
/// `validateSSL`, `maxConnectionLifeTime`). `Display` renders the redacted
/// form; there is no way to format the password.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Neo4jConfig {
    /// `host:port`, optionally prefixed by a `bolt://` or `neo4j://` scheme.
    #[validate(length(min = 1))]
    pub host_port: String,

    #[validate(length(min = 1))]
    pub username: String,

    pub password: Secret,

    /// Open the session over TLS.
    #[serde(default)]
    pub encrypted: bool,

    /// Validate the server certificate when `encrypted` is set. Certificate
    /// checks cannot be switched off; `false` with `encrypted` is rejected
    /// when the connection is opened.
    #[serde(default, rename = "validateSSL")]
    pub validate_ssl: bool,

    /// PEM file with extra trusted certificates, e.g. a self-signed server
    /// certificate. Only read when `encrypted` is set.
    #[serde(default)]
    pub ca_certificate: Option<String>,

    /// Sessions older than this are re-opened before the next query.
    #[serde(default = "default_max_connection_lifetime", rename = "maxConnectionLifeTime")]
    #[validate(range(min = 1))]
    pub max_connection_lifetime_secs: u64,

    #[serde(default = "default_connection_timeout", rename = "connectionTimeout")]
    #[validate(range(min = 1))]
    pub connection_timeout_secs: u64,
}

impl Neo4jConfig {
    pub fn new(host_port: impl Into<String>, username: impl Into<String>, password: impl Into<Secret>) -> Self {
        Self {
            host_port: host_port.into(),
            username: username.into(),
            password: password.into(),
            encrypted: false,
            validate_ssl: false,
            ca_certificate: None,
            max_connection_lifetime_secs: DEFAULT_MAX_CONNECTION_LIFETIME_SECS,
            connection_timeout_secs: DEFAULT_CONNECTION_TIMEOUT_SECS,
        }
    }

    pub fn with_tls(mut self, validate_ssl: bool) -> Self {
        self.encrypted = true;
        self.validate_ssl = validate_ssl;
        self
    }

    /// Trust the certificates in the PEM file at `path` in addition to the
    /// system roots.
    pub fn with_ca_certificate(mut self, path: impl Into<String>) -> Self {
        self.ca_certificate = Some(path.into());
        self
    }

    pub fn max_connection_lifetime(&self) -> Duration {
        Duration::from_secs(self.max_connection_lifetime_secs)
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }

    /// Run field validation, returning the config on success.
    pub fn validated(self) -> Result<Self> {
        self.validate()
            .map_err(|e| ConnectorError::Validation(e.to_string()))?;
        Ok(self)
    }

    /// Parse and validate a service-connection JSON document.
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validated()
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv().ok()` first (non-fatal if `.env` is absent),
    /// then reads `NEO4J_HOST_PORT`, `NEO4J_USERNAME`, `NEO4J_PASSWORD`,
    /// `NEO4J_ENCRYPTED`, `NEO4J_VALIDATE_SSL`, `NEO4J_CA_CERTIFICATE`,
    /// `NEO4J_MAX_CONNECTION_LIFETIME` and `NEO4J_CONNECTION_TIMEOUT`. `NEO4J_PASSWORD` is required.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup (the process environment in
    /// [`Neo4jConfig::from_env`]).
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host_port = lookup("NEO4J_HOST_PORT").unwrap_or_else(|| "localhost:7687".to_string());
        let username = lookup("NEO4J_USERNAME").unwrap_or_else(|| "neo4j".to_string());

        let password = lookup("NEO4J_PASSWORD")
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ConnectorError::Validation("NEO4J_PASSWORD is required".to_string()))?;

        let encrypted = parse_bool(&lookup, "NEO4J_ENCRYPTED")?.unwrap_or(false);
        let validate_ssl = parse_bool(&lookup, "NEO4J_VALIDATE_SSL")?.unwrap_or(false);
        let ca_certificate = lookup("NEO4J_CA_CERTIFICATE").filter(|p| !p.trim().is_empty());

        let max_connection_lifetime_secs = parse_u64(&lookup, "NEO4J_MAX_CONNECTION_LIFETIME")?
            .unwrap_or(DEFAULT_MAX_CONNECTION_LIFETIME_SECS);
        let connection_timeout_secs =
            parse_u64(&lookup, "NEO4J_CONNECTION_TIMEOUT")?.unwrap_or(DEFAULT_CONNECTION_TIMEOUT_SECS);

        Self {
            host_port,
            username,
            password: Secret::from(password),
            encrypted,
            validate_ssl,
            ca_certificate,
            max_connection_lifetime_secs,
            connection_timeout_secs,
        }
        .validated()
    }
}

fn parse_bool<F>(lookup: &F, name: &str) -> Result<Option<bool>>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(val) => match val.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" | "" => Ok(Some(false)),
            _ => Err(ConnectorError::Validation(format!(
                "{name} must be a boolean, got '{val}'"
            ))),
        },
    }
}

fn parse_u64<F>(lookup: &F, name: &str) -> Result<Option<u64>>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(val) => val.trim().parse::<u64>().map(Some).map_err(|_| {
            ConnectorError::Validation(format!("{name} must be a positive integer"))
        }),
    }
}

impl Redact for Neo4jConfig {
    fn redacted(&self) -> String {
        format!(
            "Neo4jConfig(hostPort={}, username={}, password={MASK}, encrypted={}, validateSSL={}, maxConnectionLifeTime={}s)",
            self.host_port,
            self.username,
            self.encrypted,
            self.validate_ssl,
            self.max_connection_lifetime_secs,
        )
    }

    fn secrets(&self) -> Vec<&Secret> {
        vec![&self.password]
    }
}

impl fmt::Display for Neo4jConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_config_defaults() {
        let config = Neo4jConfig::from_vars(lookup_from(&[("NEO4J_PASSWORD", "secret")]))
            .expect("config should load");
        assert_eq!(config.host_port, "localhost:7687");
        assert_eq!(config.username, "neo4j");
        assert!(!config.encrypted);
        assert!(!config.validate_ssl);
        assert!(config.ca_certificate.is_none());
        assert_eq!(config.max_connection_lifetime(), Duration::from_secs(50));
        assert_eq!(config.connection_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_config_custom_values() {
        let config = Neo4jConfig::from_vars(lookup_from(&[
            ("NEO4J_HOST_PORT", "db.example:7687"),
            ("NEO4J_USERNAME", "amundsen"),
            ("NEO4J_PASSWORD", "pw"),
            ("NEO4J_ENCRYPTED", "true"),
            ("NEO4J_VALIDATE_SSL", "1"),
            ("NEO4J_CA_CERTIFICATE", "/etc/neo4j/ca.pem"),
            ("NEO4J_MAX_CONNECTION_LIFETIME", "120"),
            ("NEO4J_CONNECTION_TIMEOUT", "3"),
        ]))
        .expect("config should load");
        assert_eq!(config.host_port, "db.example:7687");
        assert_eq!(config.username, "amundsen");
        assert_eq!(config.password.expose(), "pw");
        assert!(config.encrypted);
        assert!(config.validate_ssl);
        assert_eq!(config.ca_certificate.as_deref(), Some("/etc/neo4j/ca.pem"));
        assert_eq!(config.max_connection_lifetime_secs, 120);
        assert_eq!(config.connection_timeout_secs, 3);
    }

    #[test]
    fn test_config_missing_password() {
        let result = Neo4jConfig::from_vars(lookup_from(&[]));
        match result.unwrap_err() {
            ConnectorError::Validation(msg) => assert!(msg.contains("NEO4J_PASSWORD")),
            e => panic!("expected Validation error, got {:?}", e),
        }
    }

    #[test]
    fn test_config_invalid_bool() {
        let result = Neo4jConfig::from_vars(lookup_from(&[
            ("NEO4J_PASSWORD", "pw"),
            ("NEO4J_ENCRYPTED", "maybe"),
        ]));
        match result.unwrap_err() {
            ConnectorError::Validation(msg) => assert!(msg.contains("NEO4J_ENCRYPTED")),
            e => panic!("expected Validation error, got {:?}", e),
        }
    }

    #[test]
    fn test_config_zero_lifetime_rejected() {
        let result = Neo4jConfig::from_vars(lookup_from(&[
            ("NEO4J_PASSWORD", "pw"),
            ("NEO4J_MAX_CONNECTION_LIFETIME", "0"),
        ]));
        assert!(matches!(result, Err(ConnectorError::Validation(_))));
    }

    #[test]
    fn test_config_from_json() {
        let raw = r#"{
            "hostPort": "db.example:7687",
            "username": "neo4j",
            "password": "pw",
            "encrypted": true,
            "validateSSL": false,
            "caCertificate": "/certs/neo4j.pem",
            "maxConnectionLifeTime": 30
        }"#;
        let config = Neo4jConfig::from_json(raw).expect("json config should load");
        assert_eq!(config.host_port, "db.example:7687");
        assert!(config.encrypted);
        assert!(!config.validate_ssl);
        assert_eq!(config.ca_certificate.as_deref(), Some("/certs/neo4j.pem"));
        assert_eq!(config.max_connection_lifetime_secs, 30);
        assert_eq!(config.connection_timeout_secs, DEFAULT_CONNECTION_TIMEOUT_SECS);
    }

    #[test]
    fn test_config_from_json_empty_host_rejected() {
        let raw = r#"{"hostPort": "", "username": "neo4j", "password": "pw"}"#;
        assert!(matches!(Neo4jConfig::from_json(raw), Err(ConnectorError::Validation(_))));
    }

    #[test]
    fn test_redacted_rendering_hides_password() {
        let config = Neo4jConfig::new("db.example:7687", "neo4j", "pw-very-secret");
        let shown = config.to_string();
        let debugged = format!("{config:?}");
        assert!(!shown.contains("pw-very-secret"));
        assert!(!debugged.contains("pw-very-secret"));
        assert!(shown.contains("db.example:7687"));
        assert!(shown.contains(MASK));
    }
}
