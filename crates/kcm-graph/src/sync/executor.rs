//! Upsert execution with per-operation failure isolation.
//!
//! Every node and relationship upsert goes through [`UpsertExecutor`]. A
//! failure is logged together with its statement and parameters and
//! counted; the caller moves on to the next operation.

use std::sync::Mutex;

use tracing::{debug, error};

use crate::cypher::{EdgeUpsert, NodeUpsert};
use crate::store::{GraphStore, UpsertOutcome};

use super::SyncResult;

pub struct UpsertExecutor<'a> {
    store: &'a dyn GraphStore,
    result: Mutex<SyncResult>,
}

impl<'a> UpsertExecutor<'a> {
    pub fn new(store: &'a dyn GraphStore) -> Self {
        Self {
            store,
            result: Mutex::new(SyncResult::default()),
        }
    }

    fn record(&self, update: impl FnOnce(&mut SyncResult)) {
        let mut result = self.result.lock().unwrap_or_else(|p| p.into_inner());
        update(&mut result);
    }

    /// Upsert a node. Returns whether it was written.
    pub async fn node(&self, upsert: NodeUpsert) -> bool {
        match self.store.merge_node(&upsert).await {
            Ok(()) => {
                self.record(|r| r.nodes_upserted += 1);
                true
            }
            Err(e) => {
                let statement = upsert.to_statement();
                error!(node = %upsert.node, error = %e, "Error executing node upsert");
                debug!(query = %statement.text, params = %statement.params_json(), "Failed query");
                self.record(|r| r.failed += 1);
                false
            }
        }
    }

    /// Upsert a relationship. Returns whether it exists afterwards.
    ///
    /// A missing endpoint is not an error: the relationship is skipped and
    /// counted.
    pub async fn edge(&self, upsert: EdgeUpsert) -> bool {
        match self.store.merge_edge(&upsert).await {
            Ok(UpsertOutcome::Applied) => {
                self.record(|r| r.relationships_upserted += 1);
                true
            }
            Ok(UpsertOutcome::MissingEndpoint) => {
                debug!(edge = %upsert, "Skipped relationship, endpoint not found");
                self.record(|r| r.relationships_skipped += 1);
                false
            }
            Err(e) => {
                let statement = upsert.to_statement();
                error!(edge = %upsert, error = %e, "Error executing relationship upsert");
                debug!(query = %statement.text, params = %statement.params_json(), "Failed query");
                self.record(|r| r.failed += 1);
                false
            }
        }
    }

    /// Count a relationship skipped before reaching the store.
    pub fn skipped(&self) {
        self.record(|r| r.relationships_skipped += 1);
    }

    /// Count a failed extraction call.
    pub fn extraction_failed(&self) {
        self.record(|r| r.extraction_failures += 1);
    }

    /// Counters accumulated since the last call, resetting them.
    pub fn take_result(&self) -> SyncResult {
        let mut result = self.result.lock().unwrap_or_else(|p| p.into_inner());
        std::mem::take(&mut *result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cypher::NodeRef;
    use crate::memory::MemoryStore;
    use kcm_core::{NodeLabel, RelType};
    use serde_json::Value;

    #[tokio::test]
    async fn test_counts_each_outcome() {
        let store = MemoryStore::new();
        let exec = UpsertExecutor::new(&store);
        let realm = NodeRef::new(NodeLabel::Realm).with("name", "demo");
        let client = NodeRef::new(NodeLabel::Client).with("internal_id", "c-1");

        assert!(exec.node(NodeUpsert::new(realm.clone())).await);
        assert!(!exec.node(NodeUpsert::new(NodeRef::new(NodeLabel::User).with("id", Value::Null))).await);
        assert!(!exec.edge(EdgeUpsert::new(client.clone(), RelType::InRealm, realm.clone())).await);
        assert!(exec.node(NodeUpsert::new(client.clone())).await);
        assert!(exec.edge(EdgeUpsert::new(client, RelType::InRealm, realm)).await);

        let result = exec.take_result();
        assert_eq!(result.nodes_upserted, 2);
        assert_eq!(result.relationships_upserted, 1);
        assert_eq!(result.relationships_skipped, 1);
        assert_eq!(result.failed, 1);

        assert_eq!(exec.take_result(), SyncResult::default());
    }
}
