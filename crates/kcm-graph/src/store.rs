//! Graph store interfaces.
//!
//! [`GraphStore`] is the write side used by the loaders and the schema
//! bootstrapper; [`GraphReader`] is the read side used by the query gateway.
//! Both are implemented by the Neo4j client, the write side also by the
//! in-memory store.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::cypher::{EdgeUpsert, NodeUpsert};
use crate::schema::Constraint;
use crate::StoreResult;

/// Result of a relationship upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// The relationship exists now (created or already present).
    Applied,
    /// One of the endpoints was not found; nothing was written.
    MissingEndpoint,
}

/// Node and relationship counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphCounts {
    pub nodes: usize,
    pub relationships: usize,
}

/// Write-side graph operations. Each call is its own unit of work.
#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn merge_node(&self, node: &NodeUpsert) -> StoreResult<()>;

    async fn merge_edge(&self, edge: &EdgeUpsert) -> StoreResult<UpsertOutcome>;

    async fn create_constraint(&self, constraint: &Constraint) -> StoreResult<()>;

    async fn constraint_names(&self) -> StoreResult<Vec<String>>;

    async fn drop_constraint(&self, name: &str) -> StoreResult<()>;

    /// Names of indexes that do not back a constraint.
    async fn standalone_index_names(&self) -> StoreResult<Vec<String>>;

    async fn drop_index(&self, name: &str) -> StoreResult<()>;

    /// Delete every node and relationship.
    async fn delete_all(&self) -> StoreResult<()>;

    async fn counts(&self) -> StoreResult<GraphCounts>;
}

/// Read-side graph operations.
#[async_trait]
pub trait GraphReader: Send + Sync {
    /// Run a read query and return the named columns of every row.
    async fn run_read(
        &self,
        query: &str,
        params: &Map<String, Value>,
        columns: &[String],
    ) -> StoreResult<Vec<Vec<Value>>>;
}
