//! Client scope synchronization to Neo4j.
//!
//! - (:ClientScope)-[:IN_REALM]->(:Realm)
//! - (:ClientScope)-[:HAS_MAPPER]->(:ProtocolMapper)
//! - (:Client)-[:DEFAULT_SCOPE]->(:ClientScope)
//! - (:Client)-[:OPTIONAL_SCOPE]->(:ClientScope)

use kcm_core::record::{id_field, str_field};
use kcm_core::{clean_properties, NodeLabel, Record, RelType};
use tracing::{info, warn};

use crate::cypher::{EdgeUpsert, NodeRef, NodeUpsert};

use super::client_sync::{client_ref, sync_mapper};
use super::SyncContext;

fn scope_ref(id: &str) -> NodeRef {
    NodeRef::new(NodeLabel::ClientScope).with("id", id)
}

pub async fn sync_client_scopes(ctx: &SyncContext<'_>, clients: &[Record]) {
    info!("Processing client scopes...");
    let scopes = ctx.extracted("client scopes", ctx.source.list_client_scopes(ctx.realm).await);
    info!(count = scopes.len(), "Found client scope(s)");

    for scope in &scopes {
        let (Some(id), Some(name)) = (id_field(scope, "id"), str_field(scope, "name")) else {
            warn!("Skipping client scope without id or name");
            continue;
        };
        let node = NodeRef::new(NodeLabel::ClientScope)
            .with("id", id)
            .with("name", name);

        let upsert = NodeUpsert::new(node.clone())
            .properties(clean_properties(scope, &["id", "name", "protocolMappers"]));
        ctx.exec.node(upsert).await;
        ctx.exec
            .edge(EdgeUpsert::new(node, RelType::InRealm, ctx.realm_ref()))
            .await;

        let mappers = ctx.extracted(
            "client scope mappers",
            ctx.source.client_scope_mappers(ctx.realm, id).await,
        );
        let owner = scope_ref(id);
        for mapper in &mappers {
            sync_mapper(ctx, mapper, &owner).await;
        }
    }

    info!("Processing default/optional scope mappings for clients...");
    for client in clients {
        let Some(client_id) = id_field(client, "id") else {
            continue;
        };

        let default_scopes = ctx.extracted(
            "default client scopes",
            ctx.source.client_default_scopes(ctx.realm, client_id).await,
        );
        link_scopes(ctx, client_id, RelType::DefaultScope, &default_scopes).await;

        let optional_scopes = ctx.extracted(
            "optional client scopes",
            ctx.source.client_optional_scopes(ctx.realm, client_id).await,
        );
        link_scopes(ctx, client_id, RelType::OptionalScope, &optional_scopes).await;
    }

    info!("Finished processing client scopes");
}

async fn link_scopes(ctx: &SyncContext<'_>, client_id: &str, rel: RelType, scopes: &[Record]) {
    for scope in scopes {
        let Some(scope_id) = id_field(scope, "id") else {
            continue;
        };
        ctx.exec
            .edge(EdgeUpsert::new(client_ref(client_id), rel, scope_ref(scope_id)))
            .await;
    }
}
