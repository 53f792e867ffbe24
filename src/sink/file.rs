use std::{
    io,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use super::{WorkflowRecord, WorkflowRef, WorkflowStore};
use crate::diagnostics::Report;
use crate::errors::{ConnectorError, Result};

/// Workflow store keeping one pretty-printed JSON document per workflow,
/// named `<workflow id>.json`, under a root directory.
///
/// Writes go to a sibling `.tmp` file first and are renamed into place, so a
/// reader never observes a half-written record.
pub struct FileWorkflowStore {
    root: PathBuf,
}

impl FileWorkflowStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns a reference to the store's root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, id: &Uuid) -> PathBuf {
        self.root.join(format!("{id}.json"))
    }

    /// Load the record for `id`; `Ok(None)` if none was written.
    pub async fn load(&self, id: &Uuid) -> Result<Option<WorkflowRecord>> {
        let path = self.record_path(id);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ConnectorError::io(path.display(), e)),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }
}

#[async_trait]
impl WorkflowStore for FileWorkflowStore {
    async fn record_report(&self, workflow: &WorkflowRef, report: &Report) -> Result<()> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| ConnectorError::io(self.root.display(), e))?;

        let record = WorkflowRecord::completed(workflow, report);
        let body = serde_json::to_vec_pretty(&record)?;

        let path = self.record_path(&workflow.id);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, body)
            .await
            .map_err(|e| ConnectorError::io(tmp.display(), e))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| ConnectorError::io(path.display(), e))?;

        debug!(path = %path.display(), "workflow report written");
        Ok(())
    }
}
