use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use super::{WorkflowRecord, WorkflowRef, WorkflowStore};
use crate::diagnostics::Report;
use crate::errors::Result;

/// Process-local workflow store.
///
/// Thread-safe via `DashMap`. Not persisted across restarts. A later report
/// for the same workflow replaces the earlier one.
#[derive(Default)]
pub struct InMemoryWorkflowStore {
    records: DashMap<Uuid, WorkflowRecord>,
}

impl InMemoryWorkflowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest record for `id`, if any.
    pub fn get(&self, id: &Uuid) -> Option<WorkflowRecord> {
        self.records.get(id).map(|r| r.value().clone())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl WorkflowStore for InMemoryWorkflowStore {
    async fn record_report(&self, workflow: &WorkflowRef, report: &Report) -> Result<()> {
        self.records
            .insert(workflow.id, WorkflowRecord::completed(workflow, report));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::StepResult;

    #[tokio::test]
    async fn later_report_replaces_earlier() {
        let store = InMemoryWorkflowStore::new();
        let wf = WorkflowRef::new(Uuid::new_v4(), "wf");

        store
            .record_report(&wf, &Report::new("svc", vec![]))
            .await
            .unwrap();
        store
            .record_report(&wf, &Report::new("svc", vec![StepResult::succeeded("A", 1)]))
            .await
            .unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&wf.id).unwrap().response.steps.len(), 1);
    }

    #[test]
    fn unknown_workflow_is_none() {
        let store = InMemoryWorkflowStore::new();
        assert!(store.is_empty());
        assert!(store.get(&Uuid::new_v4()).is_none());
    }
}
