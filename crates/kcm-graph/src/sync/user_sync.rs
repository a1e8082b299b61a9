//! User synchronization to Neo4j.
//!
//! - (:User)-[:IN_REALM]->(:Realm)
//! - (:User)-[:MEMBER_OF]->(:Group)
//! - (:User)-[:HAS_ROLE]->(:RealmRole|:ClientRole)

use kcm_core::record::{id_field, str_field};
use kcm_core::{clean_properties, NodeLabel, Record, RelType};
use tracing::{debug, info, warn};

use crate::cypher::{EdgeUpsert, NodeRef, NodeUpsert};

use super::role_mapping::{sync_role_mappings, Holder};
use super::SyncContext;

pub async fn sync_users(ctx: &SyncContext<'_>, clients: &[Record]) {
    info!("Processing users...");
    let users = ctx.extracted("users", ctx.source.list_users(ctx.realm).await);
    info!(count = users.len(), "Found user(s)");

    for user in &users {
        let Some(id) = id_field(user, "id") else {
            warn!(username = ?str_field(user, "username"), "Skipping user without an id");
            continue;
        };
        let node = NodeRef::new(NodeLabel::User).with("id", id);

        let upsert = NodeUpsert::new(node.clone()).properties(clean_properties(user, &["id"]));
        ctx.exec.node(upsert).await;
        ctx.exec
            .edge(EdgeUpsert::new(node.clone(), RelType::InRealm, ctx.realm_ref()))
            .await;

        let groups = ctx.extracted("user groups", ctx.source.user_groups(ctx.realm, id).await);
        debug!(user = id, count = groups.len(), "Loading group memberships");
        for group in &groups {
            let Some(group_id) = id_field(group, "id") else {
                continue;
            };
            let to = NodeRef::new(NodeLabel::Group).with("id", group_id);
            ctx.exec.edge(EdgeUpsert::new(node.clone(), RelType::MemberOf, to)).await;
        }

        sync_role_mappings(ctx, Holder::User(id), clients).await;
    }

    info!("Finished processing users");
}
