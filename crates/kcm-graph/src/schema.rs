//! Neo4j schema initialization and destructive reset.

use kcm_core::NodeLabel;
use tracing::{debug, error, info, warn};

use crate::store::{GraphCounts, GraphStore};

/// A uniqueness constraint over a label's natural key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    pub name: String,
    pub label: NodeLabel,
    pub properties: &'static [&'static str],
}

impl Constraint {
    /// The constraint for a label's natural key, named `<label>_<fields>`.
    pub fn for_label(label: NodeLabel) -> Self {
        let properties = label.natural_key();
        Self {
            name: format!("{}_{}", label.as_str().to_lowercase(), properties.join("_")),
            label,
            properties,
        }
    }

    pub fn to_cypher(&self) -> String {
        let fields: Vec<String> = self.properties.iter().map(|p| format!("n.{p}")).collect();
        let target = match fields.as_slice() {
            [single] => single.clone(),
            _ => format!("({})", fields.join(", ")),
        };
        format!(
            "CREATE CONSTRAINT {} IF NOT EXISTS FOR (n:{}) REQUIRE {} IS UNIQUE",
            self.name, self.label, target
        )
    }
}

/// Constraints for every label.
pub fn constraints() -> Vec<Constraint> {
    NodeLabel::ALL.iter().copied().map(Constraint::for_label).collect()
}

/// Outcome of [`initialize_schema`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaReport {
    pub created: usize,
    pub failed: usize,
}

/// Outcome of [`reset_database`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResetReport {
    pub constraints_dropped: usize,
    pub indexes_dropped: usize,
    pub deleted: GraphCounts,
    pub failed: usize,
}

/// Declare a uniqueness constraint for every natural key.
///
/// Safe to run multiple times - uses IF NOT EXISTS clauses. A failing
/// statement is logged and the rest still run.
pub async fn initialize_schema(store: &dyn GraphStore) -> SchemaReport {
    info!("Creating constraints...");
    let mut report = SchemaReport::default();

    for constraint in constraints() {
        match store.create_constraint(&constraint).await {
            Ok(()) => report.created += 1,
            Err(e) => {
                error!(constraint = %constraint.name, error = %e, "Failed to create constraint");
                debug!(statement = %constraint.to_cypher(), "Failed statement");
                report.failed += 1;
            }
        }
    }

    info!(created = report.created, failed = report.failed, "Constraints ready");
    report
}

/// Drop every constraint and standalone index, then delete all data.
///
/// Must run before [`initialize_schema`] and before any loader.
pub async fn reset_database(store: &dyn GraphStore) -> ResetReport {
    warn!("--- CLEANING DATABASE ---");
    warn!("Deleting ALL data and schema in the database");
    let mut report = ResetReport::default();

    info!("Dropping all constraints...");
    match store.constraint_names().await {
        Ok(names) => {
            for name in names {
                debug!(constraint = %name, "Dropping constraint");
                match store.drop_constraint(&name).await {
                    Ok(()) => report.constraints_dropped += 1,
                    Err(e) => {
                        error!(constraint = %name, error = %e, "Failed to drop constraint");
                        report.failed += 1;
                    }
                }
            }
        }
        Err(e) => {
            error!(error = %e, "Failed to list constraints");
            report.failed += 1;
        }
    }

    info!("Dropping all standalone indexes...");
    match store.standalone_index_names().await {
        Ok(names) => {
            for name in names {
                debug!(index = %name, "Dropping index");
                match store.drop_index(&name).await {
                    Ok(()) => report.indexes_dropped += 1,
                    Err(e) => {
                        error!(index = %name, error = %e, "Failed to drop index");
                        report.failed += 1;
                    }
                }
            }
        }
        Err(e) => {
            error!(error = %e, "Failed to list indexes");
            report.failed += 1;
        }
    }

    info!("Deleting all nodes and relationships...");
    let before = store.counts().await.unwrap_or_default();
    match store.delete_all().await {
        Ok(()) => report.deleted = before,
        Err(e) => {
            error!(error = %e, "Failed to delete graph data");
            report.failed += 1;
        }
    }

    info!(
        constraints = report.constraints_dropped,
        indexes = report.indexes_dropped,
        nodes_deleted = report.deleted.nodes,
        relationships_deleted = report.deleted.relationships,
        "Database cleaning complete"
    );
    report
}
