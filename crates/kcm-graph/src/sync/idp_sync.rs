//! Identity provider synchronization to Neo4j.
//!
//! - (:IdentityProvider)-[:IN_REALM]->(:Realm)
//! - (:IdentityProvider)-[:HAS_MAPPER]->(:IdpMapper)

use kcm_core::record::{id_field, str_field};
use kcm_core::{clean_properties, NodeLabel, RelType};
use tracing::{info, warn};

use crate::cypher::{EdgeUpsert, NodeRef, NodeUpsert};

use super::SyncContext;

pub async fn sync_identity_providers(ctx: &SyncContext<'_>) {
    info!("Processing identity providers...");
    let idps = ctx.extracted(
        "identity providers",
        ctx.source.list_identity_providers(ctx.realm).await,
    );
    info!(count = idps.len(), "Found identity provider(s)");

    for idp in &idps {
        let (Some(internal_id), Some(alias)) = (id_field(idp, "internalId"), id_field(idp, "alias")) else {
            warn!("Skipping identity provider without internalId or alias");
            continue;
        };
        let node = NodeRef::new(NodeLabel::IdentityProvider)
            .with("internalId", internal_id)
            .with("alias", alias);

        let upsert = NodeUpsert::new(node.clone())
            .properties(clean_properties(idp, &["internalId", "alias"]));
        ctx.exec.node(upsert).await;
        ctx.exec
            .edge(EdgeUpsert::new(node, RelType::InRealm, ctx.realm_ref()))
            .await;

        let mappers = ctx.extracted(
            "identity provider mappers",
            ctx.source.identity_provider_mappers(ctx.realm, alias).await,
        );
        let owner = NodeRef::new(NodeLabel::IdentityProvider).with("internalId", internal_id);
        for mapper in &mappers {
            let (Some(id), Some(name)) = (id_field(mapper, "id"), str_field(mapper, "name")) else {
                warn!(idp = alias, "Skipping identity provider mapper without id or name");
                continue;
            };
            let target = NodeRef::new(NodeLabel::IdpMapper).with("id", id).with("name", name);

            let upsert = NodeUpsert::new(target.clone())
                .properties(clean_properties(mapper, &["id", "name"]));
            ctx.exec.node(upsert).await;
            ctx.exec
                .edge(EdgeUpsert::new(owner.clone(), RelType::HasMapper, target))
                .await;
        }
    }

    info!("Finished processing identity providers");
}
