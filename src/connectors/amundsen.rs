//! Amundsen catalog connector.
//!
//! Amundsen keeps its metadata graph in Neo4j; the connector reads it over
//! Bolt. Its test connection is a single `CheckAccess` step that reads user
//! records, which needs both a working session and read access to the
//! Amundsen `User` nodes.

use crate::config::Neo4jConfig;
use crate::connection::neo4j::{self, Neo4jConnection};
use crate::connection::CypherConnection;
use crate::connectors::Connector;
use crate::diagnostics::DiagnosticStep;
use crate::errors::ConnectionError;

/// Service identifier reported with Amundsen test-connection runs.
pub const SERVICE_TYPE: &str = "Amundsen";

/// Name of the access check step.
pub const CHECK_ACCESS: &str = "CheckAccess";

/// Amundsen user records, as read by the metadata extraction.
pub const NEO4J_AMUNDSEN_USER_QUERY: &str = "\
MATCH (user:User)
OPTIONAL MATCH (user)-[:MANAGE_BY]->(manager)
WITH user, manager
ORDER BY user.email
RETURN user.email AS email, user.first_name AS first_name, user.last_name AS last_name,
       user.full_name AS full_name, user.github_username AS github_username,
       user.team_name AS team_name, user.employee_type AS employee_type,
       manager.email AS manager_email, user.slack_id AS slack_id,
       user.role_name AS role_name, user.is_active AS is_active
LIMIT 1";

/// The Amundsen diagnostic steps, for any connection that answers Cypher.
pub fn check_access_steps<C: CypherConnection + 'static>() -> Vec<DiagnosticStep<C>> {
    vec![DiagnosticStep::new(CHECK_ACCESS, |conn: &C| {
        Box::pin(async move { conn.read(NEO4J_AMUNDSEN_USER_QUERY).await.map(|_rows| ()) })
    })]
}

/// Amundsen-on-Neo4j connector.
pub struct Amundsen;

impl Connector for Amundsen {
    type Config = Neo4jConfig;
    type Connection = Neo4jConnection;

    const SERVICE_TYPE: &'static str = SERVICE_TYPE;

    async fn connect(config: &Neo4jConfig) -> Result<Neo4jConnection, ConnectionError> {
        neo4j::connect(config).await
    }

    fn test_steps() -> Vec<DiagnosticStep<Neo4jConnection>> {
        check_access_steps()
    }
}
