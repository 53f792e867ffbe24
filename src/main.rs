use anyhow::Context;
use tracing::{error, info};
use uuid::Uuid;

use connectors_rs::{
    connect_and_test,
    connectors::amundsen::Amundsen,
    sink::{CatalogApiStore, FileWorkflowStore},
    Neo4jConfig, ReportSink, Secret, WorkflowRef, WorkflowStore,
};

/// Workflow target read from `WORKFLOW_ID` / `WORKFLOW_NAME` plus a store:
/// `CATALOG_API_URL` (with optional `CATALOG_API_TOKEN`) or
/// `WORKFLOW_STORE_DIR`.
fn workflow_from_env() -> anyhow::Result<Option<(WorkflowRef, Box<dyn WorkflowStore>)>> {
    let Ok(raw_id) = std::env::var("WORKFLOW_ID") else {
        return Ok(None);
    };
    let id = Uuid::parse_str(&raw_id)
        .map_err(|e| anyhow::anyhow!("Invalid WORKFLOW_ID '{}': {}", raw_id, e))?;
    let name = std::env::var("WORKFLOW_NAME").unwrap_or_else(|_| format!("test-connection-{id}"));

    let store: Box<dyn WorkflowStore> = if let Ok(url) = std::env::var("CATALOG_API_URL") {
        let token = std::env::var("CATALOG_API_TOKEN").ok().map(Secret::from);
        Box::new(CatalogApiStore::new(url, token))
    } else if let Ok(dir) = std::env::var("WORKFLOW_STORE_DIR") {
        Box::new(FileWorkflowStore::new(dir))
    } else {
        anyhow::bail!("WORKFLOW_ID is set but neither CATALOG_API_URL nor WORKFLOW_STORE_DIR is");
    };

    Ok(Some((WorkflowRef::new(id, name), store)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Tracing ───────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("connectors_rs=info".parse()?),
        )
        .json()
        .with_writer(std::io::stderr)
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let config = Neo4jConfig::from_env().map_err(|e| {
        error!("Configuration error: {}", e);
        e
    })?;
    info!(config = %config, "configuration loaded");

    let workflow = workflow_from_env()?;
    let sink = match &workflow {
        Some((workflow, store)) => {
            info!(workflow = %workflow.id, "workflow mode");
            ReportSink::workflow(workflow, store.as_ref())
        }
        None => ReportSink::Inline,
    };

    // ── Test connection ───────────────────────────────────────────────────────
    let outcome = connect_and_test::<Amundsen>(&config, sink).await.map_err(|e| {
        error!(error = %e, "test connection failed");
        e
    })?;

    match outcome {
        Some(report) => {
            let rendered = serde_json::to_string_pretty(&report).context("rendering report")?;
            println!("{rendered}");
        }
        None => info!("test connection succeeded"),
    }
    Ok(())
}
