//! Direct role mappings of groups and users.
//!
//! - (:Group|:User)-[:HAS_ROLE]->(:RealmRole {name, realm})
//! - (:Group|:User)-[:HAS_ROLE]->(:ClientRole {name, client})

use kcm_core::record::{id_field, str_field};
use kcm_core::{NodeLabel, Record, RelType};
use kcm_source::SourceResult;

use crate::cypher::{EdgeUpsert, NodeRef};

use super::SyncContext;

/// Whose role mappings are being loaded.
#[derive(Debug, Clone, Copy)]
pub enum Holder<'h> {
    Group(&'h str),
    User(&'h str),
}

impl Holder<'_> {
    fn node(&self) -> NodeRef {
        match self {
            Holder::Group(id) => NodeRef::new(NodeLabel::Group).with("id", *id),
            Holder::User(id) => NodeRef::new(NodeLabel::User).with("id", *id),
        }
    }

    async fn realm_roles(&self, ctx: &SyncContext<'_>) -> SourceResult<Vec<Record>> {
        match self {
            Holder::Group(id) => ctx.source.group_realm_roles(ctx.realm, id).await,
            Holder::User(id) => ctx.source.user_realm_roles(ctx.realm, id).await,
        }
    }

    async fn client_roles(&self, ctx: &SyncContext<'_>, client_id: &str) -> SourceResult<Vec<Record>> {
        match self {
            Holder::Group(id) => ctx.source.group_client_roles(ctx.realm, id, client_id).await,
            Holder::User(id) => ctx.source.user_client_roles(ctx.realm, id, client_id).await,
        }
    }
}

/// Link a holder to the realm roles and per-client roles mapped to it
/// directly. Inherited and composite-derived roles are not included.
pub async fn sync_role_mappings(ctx: &SyncContext<'_>, holder: Holder<'_>, clients: &[Record]) {
    let from = holder.node();

    let realm_roles = ctx.extracted("realm role mappings", holder.realm_roles(ctx).await);
    for role in &realm_roles {
        let Some(name) = str_field(role, "name") else {
            continue;
        };
        let to = NodeRef::new(NodeLabel::RealmRole)
            .with("name", name)
            .with("realm", ctx.realm);
        ctx.exec.edge(EdgeUpsert::new(from.clone(), RelType::HasRole, to)).await;
    }

    for client in clients {
        let Some(client_id) = id_field(client, "id") else {
            continue;
        };
        let client_roles = ctx.extracted(
            "client role mappings",
            holder.client_roles(ctx, client_id).await,
        );
        for role in &client_roles {
            let Some(name) = str_field(role, "name") else {
                continue;
            };
            let to = NodeRef::new(NodeLabel::ClientRole)
                .with("name", name)
                .with("client", client_id);
            ctx.exec.edge(EdgeUpsert::new(from.clone(), RelType::HasRole, to)).await;
        }
    }
}
