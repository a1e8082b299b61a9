//! Component synchronization to Neo4j.
//!
//! - (:Component)-[:IN_REALM]->(:Realm)

use kcm_core::record::id_field;
use kcm_core::{clean_properties, NodeLabel, Record, RelType};
use tracing::{info, warn};

use crate::cypher::{EdgeUpsert, NodeRef, NodeUpsert};

use super::SyncContext;

/// Display name for a component, synthesized from its id when absent.
fn component_name(component: &Record, id: &str) -> String {
    match id_field(component, "name") {
        Some(name) => name.to_string(),
        None => {
            let short: String = id.chars().take(8).collect();
            format!("Unnamed Component ({short})")
        }
    }
}

pub async fn sync_components(ctx: &SyncContext<'_>) {
    info!("Processing components...");
    let components = ctx.extracted("components", ctx.source.list_components(ctx.realm).await);
    info!(count = components.len(), "Found component(s)");

    for component in &components {
        let Some(id) = id_field(component, "id") else {
            warn!(provider = ?component.get("providerId"), "Skipping component without an id");
            continue;
        };
        let node = NodeRef::new(NodeLabel::Component).with("id", id);

        let upsert = NodeUpsert::new(node.clone())
            .properties(clean_properties(component, &["id"]))
            .set("name", component_name(component, id));
        ctx.exec.node(upsert).await;
        ctx.exec
            .edge(EdgeUpsert::new(node, RelType::InRealm, ctx.realm_ref()))
            .await;
    }

    info!("Finished processing components");
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_component_name() {
        assert_eq!(component_name(&json!({"name": "rsa"}), "abc"), "rsa");
        assert_eq!(
            component_name(&json!({"name": ""}), "0123456789"),
            "Unnamed Component (01234567)"
        );
        assert_eq!(component_name(&json!({}), "ab"), "Unnamed Component (ab)");
    }
}
