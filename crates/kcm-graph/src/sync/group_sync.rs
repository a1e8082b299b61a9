//! Group hierarchy synchronization to Neo4j.
//!
//! - (:Group)-[:IS_SUBGROUP_OF]->(:Group)  for nested groups
//! - (:Group)-[:IN_REALM]->(:Realm)        for top-level groups
//! - (:Group)-[:HAS_ROLE]->(:RealmRole|:ClientRole)
//!
//! The source returns a forest with children embedded under `subGroups`.
//! It is walked depth-first with an explicit stack, so hierarchy depth is
//! not limited by the call stack.

use kcm_core::record::{children, id_field, str_field};
use kcm_core::{clean_properties, NodeLabel, Record, RelType};
use tracing::{info, warn};

use crate::cypher::{EdgeUpsert, NodeRef, NodeUpsert};

use super::role_mapping::{sync_role_mappings, Holder};
use super::SyncContext;

fn group_ref(id: &str) -> NodeRef {
    NodeRef::new(NodeLabel::Group).with("id", id)
}

pub async fn sync_groups(ctx: &SyncContext<'_>, clients: &[Record]) {
    info!("Processing groups...");
    let groups = ctx.extracted("groups", ctx.source.list_groups(ctx.realm).await);
    info!(count = groups.len(), "Found top-level group(s)");

    // (group, parent id). Pushed in reverse so siblings pop in source order.
    let mut stack: Vec<(&Record, Option<&str>)> = groups.iter().rev().map(|g| (g, None)).collect();
    let mut loaded = 0usize;

    while let Some((group, parent_id)) = stack.pop() {
        let Some(id) = id_field(group, "id") else {
            warn!(name = ?str_field(group, "name"), "Skipping group without an id and its subgroups");
            continue;
        };

        let upsert = NodeUpsert::new(group_ref(id))
            .properties(clean_properties(group, &["id", "subGroups", "roleMappings"]));
        ctx.exec.node(upsert).await;
        loaded += 1;

        // Exactly one containment edge per group.
        let container = match parent_id {
            Some(parent) => EdgeUpsert::new(group_ref(id), RelType::IsSubgroupOf, group_ref(parent)),
            None => EdgeUpsert::new(group_ref(id), RelType::InRealm, ctx.realm_ref()),
        };
        ctx.exec.edge(container).await;

        sync_role_mappings(ctx, Holder::Group(id), clients).await;

        stack.extend(children(group, "subGroups").iter().rev().map(|child| (child, Some(id))));
    }

    info!(count = loaded, "Finished processing groups");
}
