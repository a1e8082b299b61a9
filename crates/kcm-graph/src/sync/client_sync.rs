//! Client synchronization to Neo4j.
//!
//! - (:Client)-[:IN_REALM]->(:Realm)
//! - (:Client)-[:HAS_MAPPER]->(:ProtocolMapper)

use kcm_core::record::{id_field, str_field};
use kcm_core::{clean_properties, NodeLabel, Record, RelType};
use tracing::{debug, info, warn};

use crate::cypher::{EdgeUpsert, NodeRef, NodeUpsert};

use super::SyncContext;

/// Upsert the realm's clients with their protocol mappers.
///
/// Returns the extracted client records; role, group, user and scope
/// loading enumerate per-client data from them.
pub async fn sync_clients(ctx: &SyncContext<'_>) -> Vec<Record> {
    info!("Processing clients...");
    let clients = ctx.extracted("clients", ctx.source.list_clients(ctx.realm).await);
    info!(count = clients.len(), "Found client(s)");

    for client in &clients {
        let Some(id) = id_field(client, "id") else {
            warn!(client_id = ?str_field(client, "clientId"), "Skipping client without an id");
            continue;
        };
        let node = client_ref(id);

        let upsert = NodeUpsert::new(node.clone())
            .properties(clean_properties(client, &["id", "protocolMappers"]));
        ctx.exec.node(upsert).await;
        ctx.exec
            .edge(EdgeUpsert::new(node.clone(), RelType::InRealm, ctx.realm_ref()))
            .await;

        let mappers = ctx.extracted(
            "client protocol mappers",
            ctx.source.client_mappers(ctx.realm, id).await,
        );
        debug!(client = id, count = mappers.len(), "Loading protocol mappers");
        for mapper in &mappers {
            sync_mapper(ctx, mapper, &node).await;
        }
    }

    clients
}

/// Upsert a protocol mapper and attach it to its owner (client or scope).
pub(crate) async fn sync_mapper(ctx: &SyncContext<'_>, mapper: &Record, owner: &NodeRef) {
    let (Some(id), Some(name)) = (id_field(mapper, "id"), str_field(mapper, "name")) else {
        warn!(owner = %owner, "Skipping protocol mapper without id or name");
        return;
    };
    let node = NodeRef::new(NodeLabel::ProtocolMapper)
        .with("id", id)
        .with("name", name);

    let upsert = NodeUpsert::new(node.clone()).properties(clean_properties(mapper, &["id", "name"]));
    ctx.exec.node(upsert).await;
    ctx.exec
        .edge(EdgeUpsert::new(owner.clone(), RelType::HasMapper, node))
        .await;
}

pub(crate) fn client_ref(internal_id: &str) -> NodeRef {
    NodeRef::new(NodeLabel::Client).with("internal_id", internal_id)
}
