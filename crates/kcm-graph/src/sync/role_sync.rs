//! Role synchronization to Neo4j.
//!
//! - (:Role:RealmRole)-[:BELONGS_TO_REALM]->(:Realm)
//! - (:Role:ClientRole)-[:BELONGS_TO_CLIENT]->(:Client)
//! - (:Role)-[:COMPOSED_OF]->(:Role)
//!
//! Loading is two-pass. Every realm and client role node is written first;
//! only then are composite children resolved, so an edge's target exists
//! whenever the source knows it.

use std::collections::HashSet;

use kcm_core::record::{flag, id_field, str_field};
use kcm_core::{clean_properties, NodeLabel, Record, RelType};
use tracing::{debug, info, warn};

use crate::cypher::{EdgeUpsert, NodeRef, NodeUpsert};

use super::client_sync::client_ref;
use super::SyncContext;

const REALM_ROLE_IGNORED: &[&str] = &["id", "name", "composites", "realm", "clientRole", "containerId"];
const CLIENT_ROLE_IGNORED: &[&str] = &["id", "name", "composites", "clientRole", "containerId"];

/// Role node ids written during the first pass.
#[derive(Debug, Default)]
struct RoleIndex {
    ids: HashSet<String>,
}

impl RoleIndex {
    fn insert(&mut self, id: &str) {
        self.ids.insert(id.to_string());
    }

    fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }
}

/// A role record and where its composite children are looked up.
enum Extracted {
    Realm(Record),
    Client(Record),
}

pub async fn sync_roles(ctx: &SyncContext<'_>, clients: &[Record]) {
    info!("Processing roles...");

    let realm_roles = ctx.extracted("realm roles", ctx.source.list_realm_roles(ctx.realm).await);
    info!(count = realm_roles.len(), "Found realm role(s)");

    let mut roles: Vec<Extracted> = realm_roles.into_iter().map(Extracted::Realm).collect();
    let mut client_role_count = 0;
    for client in clients {
        let Some(client_id) = id_field(client, "id") else {
            continue;
        };
        let client_roles = ctx.extracted(
            "client roles",
            ctx.source.list_client_roles(ctx.realm, client_id).await,
        );
        client_role_count += client_roles.len();
        roles.extend(client_roles.into_iter().map(|mut role| {
            // Roles listed under a client always belong to it.
            if id_field(&role, "containerId").is_none() {
                if let Some(obj) = role.as_object_mut() {
                    obj.insert("containerId".into(), client_id.into());
                }
            }
            Extracted::Client(role)
        }));
    }
    info!(count = client_role_count, "Found client role(s) across all clients");

    info!("Loading role nodes...");
    let mut index = RoleIndex::default();
    for role in &roles {
        let written = match role {
            Extracted::Realm(record) => load_realm_role(ctx, record).await,
            Extracted::Client(record) => load_client_role(ctx, record).await,
        };
        if let Some(id) = written {
            index.insert(id);
        }
    }

    info!("Processing composite relationships...");
    for role in &roles {
        resolve_composites(ctx, role, &index).await;
    }

    info!("Finished processing roles");
}

fn role_ref(id: &str) -> NodeRef {
    NodeRef::new(NodeLabel::Role).with("id", id)
}

/// Returns the role id when the node was written.
async fn load_realm_role<'r>(ctx: &SyncContext<'_>, role: &'r Record) -> Option<&'r str> {
    let Some(id) = id_field(role, "id") else {
        warn!(name = ?str_field(role, "name"), "Skipping realm role without an id");
        return None;
    };
    let upsert = NodeUpsert::new(role_ref(id))
        .label(NodeLabel::RealmRole)
        .properties(clean_properties(role, REALM_ROLE_IGNORED))
        .set("name", str_field(role, "name").unwrap_or_default())
        .set("realm", ctx.realm);
    let written = ctx.exec.node(upsert).await;
    ctx.exec
        .edge(EdgeUpsert::new(role_ref(id), RelType::BelongsToRealm, ctx.realm_ref()))
        .await;
    written.then_some(id)
}

async fn load_client_role<'r>(ctx: &SyncContext<'_>, role: &'r Record) -> Option<&'r str> {
    let Some(id) = id_field(role, "id") else {
        warn!(name = ?str_field(role, "name"), "Skipping client role without an id");
        return None;
    };
    let client_id = str_field(role, "containerId").unwrap_or_default();
    let upsert = NodeUpsert::new(role_ref(id))
        .label(NodeLabel::ClientRole)
        .properties(clean_properties(role, CLIENT_ROLE_IGNORED))
        .set("name", str_field(role, "name").unwrap_or_default())
        .set("client", client_id);
    let written = ctx.exec.node(upsert).await;
    ctx.exec
        .edge(EdgeUpsert::new(role_ref(id), RelType::BelongsToClient, client_ref(client_id)))
        .await;
    written.then_some(id)
}

/// Link a composite role to each of its children that was written in the
/// first pass. Children the source returns but the graph lacks are skipped.
async fn resolve_composites(ctx: &SyncContext<'_>, role: &Extracted, index: &RoleIndex) {
    let record = match role {
        Extracted::Realm(r) | Extracted::Client(r) => r,
    };
    if !flag(record, "composite") {
        return;
    }
    let Some(parent_id) = id_field(record, "id").filter(|id| index.contains(id)) else {
        return;
    };

    let children = match role {
        Extracted::Realm(r) => {
            let name = str_field(r, "name").unwrap_or_default();
            ctx.extracted(
                "realm role composites",
                ctx.source.realm_role_composites(ctx.realm, name).await,
            )
        }
        Extracted::Client(_) => ctx.extracted(
            "client role composites",
            ctx.source.client_role_composites(ctx.realm, parent_id).await,
        ),
    };

    for child in &children {
        match id_field(child, "id") {
            Some(child_id) if index.contains(child_id) => {
                ctx.exec
                    .edge(EdgeUpsert::new(role_ref(parent_id), RelType::ComposedOf, role_ref(child_id)))
                    .await;
            }
            child_id => {
                debug!(parent = parent_id, child = ?child_id, "Composite child not loaded, skipping");
                ctx.exec.skipped();
            }
        }
    }
}
