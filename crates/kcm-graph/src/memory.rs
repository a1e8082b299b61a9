//! In-memory graph store.
//!
//! Applies the same merge semantics as the Cypher statements in
//! [`crate::cypher`] to a plain node list and edge set. Used by
//! `export --dry-run` and by the engine tests.

use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use kcm_core::{NodeLabel, Properties, RelType};
use serde_json::Value;

use crate::cypher::{EdgeUpsert, NodeRef, NodeUpsert};
use crate::schema::Constraint;
use crate::store::{GraphCounts, GraphStore, UpsertOutcome};
use crate::{StoreError, StoreResult};

/// A stored node.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryNode {
    pub labels: BTreeSet<NodeLabel>,
    pub properties: Properties,
}

impl MemoryNode {
    pub fn has_label(&self, label: NodeLabel) -> bool {
        self.labels.contains(&label)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.properties.get(field).and_then(Value::as_str)
    }

    fn matches(&self, node: &NodeRef) -> bool {
        self.has_label(node.label)
            && node
                .key
                .iter()
                .all(|(field, value)| self.properties.get(*field) == Some(value))
    }
}

/// Contents of a [`MemoryStore`]. Edges refer to nodes by index.
#[derive(Debug, Clone, Default)]
pub struct MemoryGraph {
    pub nodes: Vec<MemoryNode>,
    pub edges: BTreeSet<(usize, RelType, usize)>,
    pub constraints: BTreeSet<String>,
}

impl MemoryGraph {
    /// Indexes of nodes matching a reference.
    pub fn find(&self, node: &NodeRef) -> Vec<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.matches(node))
            .map(|(i, _)| i)
            .collect()
    }

    /// The single node matching a reference.
    pub fn node(&self, node: &NodeRef) -> Option<&MemoryNode> {
        match self.find(node).as_slice() {
            [idx] => self.nodes.get(*idx),
            _ => None,
        }
    }

    pub fn with_label(&self, label: NodeLabel) -> Vec<&MemoryNode> {
        self.nodes.iter().filter(|n| n.has_label(label)).collect()
    }

    /// Whether `from -[rel]-> to` exists.
    pub fn has_edge(&self, from: &NodeRef, rel: RelType, to: &NodeRef) -> bool {
        let targets = self.find(to);
        self.find(from).iter().any(|a| {
            targets
                .iter()
                .any(|b| self.edges.contains(&(*a, rel, *b)))
        })
    }

    /// Outgoing edges of a node index.
    pub fn outgoing(&self, idx: usize) -> Vec<(RelType, usize)> {
        self.edges
            .iter()
            .filter(|(from, _, _)| *from == idx)
            .map(|(_, rel, to)| (*rel, *to))
            .collect()
    }

    pub fn count_edges(&self, rel: RelType) -> usize {
        self.edges.iter().filter(|(_, r, _)| *r == rel).count()
    }

    pub fn counts(&self) -> GraphCounts {
        GraphCounts {
            nodes: self.nodes.len(),
            relationships: self.edges.len(),
        }
    }
}

/// [`GraphStore`] held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    graph: Mutex<MemoryGraph>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryGraph> {
        self.graph.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> MemoryGraph {
        self.lock().clone()
    }
}

#[async_trait]
impl GraphStore for MemoryStore {
    async fn merge_node(&self, upsert: &NodeUpsert) -> StoreResult<()> {
        if let Some((field, _)) = upsert.node.key.iter().find(|(_, v)| v.is_null()) {
            return Err(StoreError::Query(format!(
                "Cannot merge {} node using null property value for {}",
                upsert.node.label, field
            )));
        }

        let mut graph = self.lock();
        let existing = graph.find(&upsert.node).into_iter().next();
        let idx = match existing {
            Some(idx) => idx,
            None => {
                let mut properties = Properties::new();
                for (field, value) in upsert.node.key.iter().chain(upsert.on_create.iter()) {
                    if !value.is_null() {
                        properties.insert(field.to_string(), value.clone());
                    }
                }
                graph.nodes.push(MemoryNode {
                    labels: BTreeSet::from([upsert.node.label]),
                    properties,
                });
                graph.nodes.len() - 1
            }
        };

        let node = &mut graph.nodes[idx];
        node.labels.extend(upsert.extra_labels.iter().copied());
        node.properties
            .extend(upsert.properties.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(())
    }

    async fn merge_edge(&self, edge: &EdgeUpsert) -> StoreResult<UpsertOutcome> {
        let mut graph = self.lock();
        let sources = graph.find(&edge.from);
        let targets = graph.find(&edge.to);
        if sources.is_empty() || targets.is_empty() {
            return Ok(UpsertOutcome::MissingEndpoint);
        }

        for a in &sources {
            for b in &targets {
                graph.edges.insert((*a, edge.rel, *b));
            }
        }
        Ok(UpsertOutcome::Applied)
    }

    async fn create_constraint(&self, constraint: &Constraint) -> StoreResult<()> {
        self.lock().constraints.insert(constraint.name.clone());
        Ok(())
    }

    async fn constraint_names(&self) -> StoreResult<Vec<String>> {
        Ok(self.lock().constraints.iter().cloned().collect())
    }

    async fn drop_constraint(&self, name: &str) -> StoreResult<()> {
        self.lock().constraints.remove(name);
        Ok(())
    }

    async fn standalone_index_names(&self) -> StoreResult<Vec<String>> {
        Ok(Vec::new())
    }

    async fn drop_index(&self, _name: &str) -> StoreResult<()> {
        Ok(())
    }

    async fn delete_all(&self) -> StoreResult<()> {
        let mut graph = self.lock();
        graph.nodes.clear();
        graph.edges.clear();
        Ok(())
    }

    async fn counts(&self) -> StoreResult<GraphCounts> {
        Ok(self.lock().counts())
    }
}
