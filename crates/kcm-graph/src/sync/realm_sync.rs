//! Realm synchronization to Neo4j.
//!
//! - (:Realm {name})

use kcm_core::record::id_field;
use kcm_core::{clean_properties, NodeLabel};
use kcm_source::IdentitySource;
use tracing::{info, warn};

use crate::cypher::{NodeRef, NodeUpsert};

use super::{extracted, UpsertExecutor};

/// Upsert every realm (or only the requested ones) and return the names
/// loaded, in source order.
pub async fn sync_realms(
    source: &dyn IdentitySource,
    exec: &UpsertExecutor<'_>,
    only: &[String],
) -> Vec<String> {
    info!("Processing realms...");
    let realms = extracted(exec, "realms", source.list_realms().await);
    info!(count = realms.len(), "Found realm(s)");

    for wanted in only {
        if !realms.iter().any(|r| id_field(r, "realm") == Some(wanted.as_str())) {
            warn!(realm = %wanted, "Requested realm not found on the source");
        }
    }

    let mut loaded = Vec::new();
    for realm in &realms {
        let Some(name) = id_field(realm, "realm") else {
            warn!("Skipping realm without a name");
            continue;
        };
        if !only.is_empty() && !only.iter().any(|o| o == name) {
            continue;
        }

        let upsert = NodeUpsert::new(NodeRef::new(NodeLabel::Realm).with("name", name))
            .properties(clean_properties(realm, &["realm"]));
        if exec.node(upsert).await {
            loaded.push(name.to_string());
        }
    }

    info!(count = loaded.len(), "Finished processing realms");
    loaded
}
