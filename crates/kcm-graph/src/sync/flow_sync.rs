//! Authentication flow synchronization to Neo4j.
//!
//! - (:AuthenticationFlow)-[:IN_REALM]->(:Realm)
//! - (:AuthenticationFlow)-[:HAS_EXECUTION]->(:AuthenticationExecution)
//!
//! An execution's `authenticator` is written only when the node is
//! created; later runs leave it as first stored. The executions endpoint
//! names it `providerId`, exported realms name it `authenticator`.

use kcm_core::record::{id_field, str_field};
use kcm_core::{clean_properties, NodeLabel, RelType};
use tracing::{debug, info, warn};

use crate::cypher::{EdgeUpsert, NodeRef, NodeUpsert};

use super::SyncContext;

pub async fn sync_flows(ctx: &SyncContext<'_>) {
    info!("Processing authentication flows...");
    let flows = ctx.extracted(
        "authentication flows",
        ctx.source.list_authentication_flows(ctx.realm).await,
    );
    info!(count = flows.len(), "Found authentication flow(s)");

    for flow in &flows {
        let (Some(id), Some(alias)) = (id_field(flow, "id"), id_field(flow, "alias")) else {
            warn!("Skipping authentication flow without id or alias");
            continue;
        };
        let node = NodeRef::new(NodeLabel::AuthenticationFlow)
            .with("id", id)
            .with("alias", alias);

        let upsert = NodeUpsert::new(node.clone())
            .properties(clean_properties(flow, &["id", "alias", "authenticationExecutions"]));
        ctx.exec.node(upsert).await;
        ctx.exec
            .edge(EdgeUpsert::new(node, RelType::InRealm, ctx.realm_ref()))
            .await;

        let executions = ctx.extracted(
            "flow executions",
            ctx.source.flow_executions(ctx.realm, alias).await,
        );
        let owner = NodeRef::new(NodeLabel::AuthenticationFlow).with("id", id);
        for execution in &executions {
            let Some(exec_id) = id_field(execution, "id") else {
                debug!(flow = alias, "Skipping execution without an id");
                continue;
            };
            let target = NodeRef::new(NodeLabel::AuthenticationExecution).with("id", exec_id);

            let authenticator = authenticator_field(execution);
            let ignore = match authenticator {
                Some((field, _)) => vec!["id", field],
                None => vec!["id"],
            };
            let mut upsert =
                NodeUpsert::new(target.clone()).properties(clean_properties(execution, &ignore));
            if let Some((_, value)) = authenticator {
                upsert = upsert.on_create("authenticator", value);
            }
            ctx.exec.node(upsert).await;
            ctx.exec
                .edge(EdgeUpsert::new(owner.clone(), RelType::HasExecution, target))
                .await;
        }
    }

    info!("Finished processing authentication flows");
}

/// The field naming an execution's authenticator, and its value.
fn authenticator_field(execution: &kcm_core::Record) -> Option<(&'static str, &str)> {
    ["authenticator", "providerId"]
        .into_iter()
        .find_map(|field| str_field(execution, field).map(|value| (field, value)))
}
