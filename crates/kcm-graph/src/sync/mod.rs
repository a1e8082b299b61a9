//! Identity source to Neo4j export pipeline.
//!
//! Extracts every entity collection of each realm from an
//! [`IdentitySource`], normalizes the records and upserts them as
//! nodes/relationships through an [`UpsertExecutor`].
//!
//! Loaders run in a fixed order per realm because later loaders link to
//! nodes created by earlier ones:
//! realm, client, role, group, user, client scope, authentication flow,
//! identity provider, component.

pub mod client_sync;
pub mod component_sync;
pub mod executor;
pub mod flow_sync;
pub mod group_sync;
pub mod idp_sync;
pub mod realm_sync;
pub mod role_mapping;
pub mod role_sync;
pub mod scope_sync;
pub mod user_sync;

use chrono::{DateTime, Utc};
use kcm_core::{NodeLabel, Record};
use kcm_source::{IdentitySource, SourceResult};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::cypher::NodeRef;
use crate::schema::{self, ResetReport, SchemaReport};
use crate::store::GraphStore;

pub use executor::UpsertExecutor;

/// Counters for one loader, or the sum over several.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncResult {
    pub nodes_upserted: usize,
    pub relationships_upserted: usize,
    /// Relationships not written because an endpoint did not exist.
    pub relationships_skipped: usize,
    /// Upserts rejected by the store.
    pub failed: usize,
    /// Source calls that failed and were treated as empty.
    pub extraction_failures: usize,
}

impl SyncResult {
    pub fn merge(&mut self, other: &SyncResult) {
        self.nodes_upserted += other.nodes_upserted;
        self.relationships_upserted += other.relationships_upserted;
        self.relationships_skipped += other.relationships_skipped;
        self.failed += other.failed;
        self.extraction_failures += other.extraction_failures;
    }

    /// Whether anything went wrong during the run.
    pub fn has_errors(&self) -> bool {
        self.failed > 0 || self.extraction_failures > 0
    }
}

/// Everything a per-realm loader needs.
pub struct SyncContext<'a> {
    pub source: &'a dyn IdentitySource,
    pub exec: &'a UpsertExecutor<'a>,
    pub realm: &'a str,
}

impl<'a> SyncContext<'a> {
    /// Unwrap an extraction result, logging and counting a failure.
    ///
    /// A failed collection is treated as empty so the run continues.
    pub fn extracted(&self, what: &str, result: SourceResult<Vec<Record>>) -> Vec<Record> {
        extracted(self.exec, what, result)
    }

    /// The current realm node.
    pub fn realm_ref(&self) -> NodeRef {
        NodeRef::new(NodeLabel::Realm).with("name", self.realm)
    }
}

fn extracted(exec: &UpsertExecutor<'_>, what: &str, result: SourceResult<Vec<Record>>) -> Vec<Record> {
    match result {
        Ok(records) => records,
        Err(e) => {
            warn!(what, error = %e, "Error while extracting, continuing with no records");
            exec.extraction_failed();
            Vec::new()
        }
    }
}

/// Options for [`run_export`].
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Drop all schema and data before loading.
    pub reset: bool,
    /// Realms to process. Empty means every realm the source returns.
    pub realms: Vec<String>,
}

/// Counters of one loader over all realms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderSummary {
    pub loader: &'static str,
    pub result: SyncResult,
}

/// Outcome of a full export run.
#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub reset: Option<ResetReport>,
    pub schema: SchemaReport,
    /// Realms processed, in order.
    pub realms: Vec<String>,
    /// Per-loader counters, in loader order.
    pub by_loader: Vec<LoaderSummary>,
}

impl ExportSummary {
    fn new(run_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            run_id,
            started_at: now,
            finished_at: now,
            reset: None,
            schema: SchemaReport::default(),
            realms: Vec::new(),
            by_loader: Vec::new(),
        }
    }

    fn record(&mut self, loader: &'static str, result: SyncResult) {
        match self.by_loader.iter_mut().find(|s| s.loader == loader) {
            Some(summary) => summary.result.merge(&result),
            None => self.by_loader.push(LoaderSummary { loader, result }),
        }
    }

    /// Sum over every loader.
    pub fn total(&self) -> SyncResult {
        let mut total = SyncResult::default();
        for summary in &self.by_loader {
            total.merge(&summary.result);
        }
        total
    }

    pub fn loader(&self, loader: &str) -> Option<&SyncResult> {
        self.by_loader
            .iter()
            .find(|s| s.loader == loader)
            .map(|s| &s.result)
    }
}

/// Run a full export from `source` into `store`.
///
/// Never fails: per-record and per-collection errors are logged and
/// counted in the returned summary. Connection failures are the caller's
/// concern and happen before this is reached.
pub async fn run_export(
    source: &dyn IdentitySource,
    store: &dyn GraphStore,
    options: &ExportOptions,
) -> ExportSummary {
    let run_id = Uuid::new_v4();
    export(source, store, options, run_id)
        .instrument(info_span!("export", %run_id))
        .await
}

async fn export(
    source: &dyn IdentitySource,
    store: &dyn GraphStore,
    options: &ExportOptions,
    run_id: Uuid,
) -> ExportSummary {
    info!("Starting export");
    let mut summary = ExportSummary::new(run_id);

    if options.reset {
        summary.reset = Some(schema::reset_database(store).await);
    }
    summary.schema = schema::initialize_schema(store).await;

    let exec = UpsertExecutor::new(store);

    let realms = realm_sync::sync_realms(source, &exec, &options.realms).await;
    summary.record("realms", exec.take_result());

    for realm in &realms {
        let ctx = SyncContext {
            source,
            exec: &exec,
            realm,
        };
        sync_realm(&ctx, &mut summary)
            .instrument(info_span!("realm", realm = %realm))
            .await;
    }

    summary.realms = realms;
    summary.finished_at = Utc::now();

    let total = summary.total();
    info!(
        realms = summary.realms.len(),
        nodes = total.nodes_upserted,
        relationships = total.relationships_upserted,
        skipped = total.relationships_skipped,
        failed = total.failed,
        extraction_failures = total.extraction_failures,
        "Export complete"
    );
    summary
}

async fn sync_realm(ctx: &SyncContext<'_>, summary: &mut ExportSummary) {
    info!("Processing realm");

    let clients = client_sync::sync_clients(ctx).await;
    summary.record("clients", ctx.exec.take_result());

    role_sync::sync_roles(ctx, &clients).await;
    summary.record("roles", ctx.exec.take_result());

    group_sync::sync_groups(ctx, &clients).await;
    summary.record("groups", ctx.exec.take_result());

    user_sync::sync_users(ctx, &clients).await;
    summary.record("users", ctx.exec.take_result());

    scope_sync::sync_client_scopes(ctx, &clients).await;
    summary.record("client_scopes", ctx.exec.take_result());

    flow_sync::sync_flows(ctx).await;
    summary.record("authentication_flows", ctx.exec.take_result());

    idp_sync::sync_identity_providers(ctx).await;
    summary.record("identity_providers", ctx.exec.take_result());

    component_sync::sync_components(ctx).await;
    summary.record("components", ctx.exec.take_result());

    info!("Finished realm");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryGraph, MemoryStore};
    use crate::store::GraphCounts;
    use async_trait::async_trait;
    use kcm_core::RelType;
    use kcm_source::{SnapshotSource, SourceError};
    use serde_json::{json, Value};

    fn demo_snapshot() -> Value {
        json!({
            "realms": [{"realm": "demo", "id": "demo", "enabled": true}],
            "data": {
                "demo": {
                    "clients": [{
                        "id": "c-app",
                        "clientId": "app",
                        "publicClient": false,
                        "redirectUris": ["https://app.example.com/*"]
                    }],
                    "client_mappers": {"c-app": [{
                        "id": "pm-1",
                        "name": "email-mapper",
                        "protocol": "openid-connect",
                        "config": {"claim.name": "email"}
                    }]},
                    "realm_roles": [{
                        "id": "r-admin",
                        "name": "admin",
                        "composite": true,
                        "clientRole": false,
                        "containerId": "demo"
                    }],
                    "client_roles": {"c-app": [{
                        "id": "r-app-read",
                        "name": "read",
                        "composite": false,
                        "clientRole": true,
                        "containerId": "c-app"
                    }]},
                    "realm_role_composites": {"admin": [{"id": "r-app-read", "name": "read"}]},
                    "groups": [{
                        "id": "g-eng",
                        "name": "engineering",
                        "path": "/engineering",
                        "subGroups": [{
                            "id": "g-backend",
                            "name": "backend",
                            "path": "/engineering/backend",
                            "subGroups": []
                        }]
                    }],
                    "users": [{"id": "u-alice", "username": "alice", "enabled": true}],
                    "user_groups": {"u-alice": [{"id": "g-backend", "name": "backend"}]},
                    "user_realm_roles": {"u-alice": [{"id": "r-admin", "name": "admin"}]}
                }
            }
        })
    }

    async fn export_into(source: &dyn IdentitySource, store: &MemoryStore) -> ExportSummary {
        run_export(source, store, &ExportOptions::default()).await
    }

    fn role(id: &str) -> NodeRef {
        NodeRef::new(NodeLabel::Role).with("id", id)
    }

    fn group(id: &str) -> NodeRef {
        NodeRef::new(NodeLabel::Group).with("id", id)
    }

    fn realm() -> NodeRef {
        NodeRef::new(NodeLabel::Realm).with("name", "demo")
    }

    fn containment_edges(graph: &MemoryGraph, idx: usize) -> usize {
        graph
            .outgoing(idx)
            .into_iter()
            .filter(|(rel, _)| matches!(rel, RelType::IsSubgroupOf | RelType::InRealm))
            .count()
    }

    #[tokio::test]
    async fn test_demo_realm_end_to_end() {
        let source = SnapshotSource::from_value(demo_snapshot()).unwrap();
        let store = MemoryStore::new();
        let summary = export_into(&source, &store).await;
        assert_eq!(summary.realms, vec!["demo".to_string()]);
        assert!(!summary.total().has_errors());

        let graph = store.snapshot();
        let client = NodeRef::new(NodeLabel::Client).with("internal_id", "c-app");
        let mapper = NodeRef::new(NodeLabel::ProtocolMapper).with("id", "pm-1");
        let alice = NodeRef::new(NodeLabel::User).with("id", "u-alice");

        assert!(graph.node(&realm()).is_some());
        assert!(graph.has_edge(&client, RelType::InRealm, &realm()));
        assert!(graph.has_edge(&client, RelType::HasMapper, &mapper));
        assert_eq!(graph.node(&mapper).unwrap().get_str("name"), Some("email-mapper"));
        assert_eq!(graph.node(&mapper).unwrap().get_str("config.claim.name"), Some("email"));

        let admin = graph.node(&role("r-admin")).unwrap();
        assert!(admin.has_label(NodeLabel::RealmRole));
        assert!(!admin.has_label(NodeLabel::ClientRole));
        assert_eq!(admin.get_str("realm"), Some("demo"));
        assert!(graph.has_edge(&role("r-admin"), RelType::BelongsToRealm, &realm()));

        let read = graph.node(&role("r-app-read")).unwrap();
        assert!(read.has_label(NodeLabel::ClientRole));
        assert_eq!(read.get_str("client"), Some("c-app"));
        assert!(graph.has_edge(&role("r-app-read"), RelType::BelongsToClient, &client));

        assert!(graph.has_edge(&role("r-admin"), RelType::ComposedOf, &role("r-app-read")));
        assert!(graph.has_edge(&group("g-eng"), RelType::InRealm, &realm()));
        assert!(graph.has_edge(&group("g-backend"), RelType::IsSubgroupOf, &group("g-eng")));
        assert!(!graph.has_edge(&group("g-backend"), RelType::InRealm, &realm()));
        assert!(graph.has_edge(&alice, RelType::MemberOf, &group("g-backend")));
        assert!(graph.has_edge(
            &alice,
            RelType::HasRole,
            &NodeRef::new(NodeLabel::RealmRole).with("name", "admin").with("realm", "demo"),
        ));
    }

    #[tokio::test]
    async fn test_second_run_adds_nothing() {
        let source = SnapshotSource::from_value(demo_snapshot()).unwrap();
        let store = MemoryStore::new();

        export_into(&source, &store).await;
        let first = store.snapshot().counts();
        export_into(&source, &store).await;
        let second = store.snapshot().counts();

        assert_eq!(first, second);
        assert!(first.nodes > 0);
    }

    #[tokio::test]
    async fn test_every_group_has_one_containment_edge() {
        let mut snapshot = demo_snapshot();
        snapshot["data"]["demo"]["groups"] = json!([
            {"id": "a", "name": "a", "subGroups": [
                {"id": "a1", "name": "a1", "subGroups": [
                    {"id": "a11", "name": "a11"}
                ]},
                {"id": "a2", "name": "a2"}
            ]},
            {"id": "b", "name": "b", "subGroups": []}
        ]);
        let source = SnapshotSource::from_value(snapshot).unwrap();
        let store = MemoryStore::new();
        export_into(&source, &store).await;

        let graph = store.snapshot();
        let groups: Vec<usize> = graph.find(&NodeRef::new(NodeLabel::Group));
        assert_eq!(groups.len(), 5);
        for idx in groups {
            assert_eq!(containment_edges(&graph, idx), 1, "group {:?}", graph.nodes[idx]);
        }
        assert!(graph.has_edge(&group("a11"), RelType::IsSubgroupOf, &group("a1")));
        assert!(graph.has_edge(&group("b"), RelType::InRealm, &realm()));
    }

    #[tokio::test]
    async fn test_missing_composite_child_is_dropped() {
        let mut snapshot = demo_snapshot();
        snapshot["data"]["demo"]["realm_role_composites"] =
            json!({"admin": [{"id": "r-app-read"}, {"id": "r-ghost", "name": "ghost"}]});
        let source = SnapshotSource::from_value(snapshot).unwrap();
        let store = MemoryStore::new();
        let summary = export_into(&source, &store).await;

        let graph = store.snapshot();
        assert!(graph.node(&role("r-ghost")).is_none());
        assert_eq!(graph.count_edges(RelType::ComposedOf), 1);
        assert_eq!(summary.loader("roles").unwrap().relationships_skipped, 1);
        assert_eq!(summary.loader("roles").unwrap().failed, 0);
    }

    /// Fails scope lookups for one client, delegating everything else.
    struct FailingScopes {
        inner: SnapshotSource,
        client_id: &'static str,
    }

    #[async_trait]
    impl IdentitySource for FailingScopes {
        async fn list_realms(&self) -> SourceResult<Vec<Record>> {
            self.inner.list_realms().await
        }
        async fn list_clients(&self, realm: &str) -> SourceResult<Vec<Record>> {
            self.inner.list_clients(realm).await
        }
        async fn client_mappers(&self, realm: &str, client_id: &str) -> SourceResult<Vec<Record>> {
            self.inner.client_mappers(realm, client_id).await
        }
        async fn client_default_scopes(&self, realm: &str, client_id: &str) -> SourceResult<Vec<Record>> {
            if client_id == self.client_id {
                return Err(SourceError::Snapshot("scope lookup refused".into()));
            }
            self.inner.client_default_scopes(realm, client_id).await
        }
        async fn client_optional_scopes(&self, realm: &str, client_id: &str) -> SourceResult<Vec<Record>> {
            if client_id == self.client_id {
                return Err(SourceError::Snapshot("scope lookup refused".into()));
            }
            self.inner.client_optional_scopes(realm, client_id).await
        }
        async fn list_realm_roles(&self, realm: &str) -> SourceResult<Vec<Record>> {
            self.inner.list_realm_roles(realm).await
        }
        async fn list_client_roles(&self, realm: &str, client_id: &str) -> SourceResult<Vec<Record>> {
            self.inner.list_client_roles(realm, client_id).await
        }
        async fn realm_role_composites(&self, realm: &str, role_name: &str) -> SourceResult<Vec<Record>> {
            self.inner.realm_role_composites(realm, role_name).await
        }
        async fn client_role_composites(&self, realm: &str, role_id: &str) -> SourceResult<Vec<Record>> {
            self.inner.client_role_composites(realm, role_id).await
        }
        async fn list_groups(&self, realm: &str) -> SourceResult<Vec<Record>> {
            self.inner.list_groups(realm).await
        }
        async fn group_realm_roles(&self, realm: &str, group_id: &str) -> SourceResult<Vec<Record>> {
            self.inner.group_realm_roles(realm, group_id).await
        }
        async fn group_client_roles(&self, realm: &str, group_id: &str, client_id: &str) -> SourceResult<Vec<Record>> {
            self.inner.group_client_roles(realm, group_id, client_id).await
        }
        async fn list_users(&self, realm: &str) -> SourceResult<Vec<Record>> {
            self.inner.list_users(realm).await
        }
        async fn user_groups(&self, realm: &str, user_id: &str) -> SourceResult<Vec<Record>> {
            self.inner.user_groups(realm, user_id).await
        }
        async fn user_realm_roles(&self, realm: &str, user_id: &str) -> SourceResult<Vec<Record>> {
            self.inner.user_realm_roles(realm, user_id).await
        }
        async fn user_client_roles(&self, realm: &str, user_id: &str, client_id: &str) -> SourceResult<Vec<Record>> {
            self.inner.user_client_roles(realm, user_id, client_id).await
        }
        async fn list_client_scopes(&self, realm: &str) -> SourceResult<Vec<Record>> {
            self.inner.list_client_scopes(realm).await
        }
        async fn client_scope_mappers(&self, realm: &str, scope_id: &str) -> SourceResult<Vec<Record>> {
            self.inner.client_scope_mappers(realm, scope_id).await
        }
        async fn list_identity_providers(&self, realm: &str) -> SourceResult<Vec<Record>> {
            self.inner.list_identity_providers(realm).await
        }
        async fn identity_provider_mappers(&self, realm: &str, alias: &str) -> SourceResult<Vec<Record>> {
            self.inner.identity_provider_mappers(realm, alias).await
        }
        async fn list_authentication_flows(&self, realm: &str) -> SourceResult<Vec<Record>> {
            self.inner.list_authentication_flows(realm).await
        }
        async fn flow_executions(&self, realm: &str, flow_alias: &str) -> SourceResult<Vec<Record>> {
            self.inner.flow_executions(realm, flow_alias).await
        }
        async fn list_components(&self, realm: &str) -> SourceResult<Vec<Record>> {
            self.inner.list_components(realm).await
        }
    }

    #[tokio::test]
    async fn test_scope_failure_for_one_client_keeps_others() {
        let mut snapshot = demo_snapshot();
        let demo = &mut snapshot["data"]["demo"];
        demo["clients"] = json!([
            {"id": "c-good", "clientId": "good"},
            {"id": "c-bad", "clientId": "bad"}
        ]);
        demo["client_scopes"] = json!([
            {"id": "s-profile", "name": "profile", "protocol": "openid-connect"},
            {"id": "s-email", "name": "email", "protocol": "openid-connect"}
        ]);
        demo["default_scopes"] = json!({
            "c-good": [{"id": "s-profile", "name": "profile"}],
            "c-bad": [{"id": "s-profile", "name": "profile"}]
        });
        demo["optional_scopes"] = json!({"c-good": [{"id": "s-email", "name": "email"}]});

        let source = FailingScopes {
            inner: SnapshotSource::from_value(snapshot).unwrap(),
            client_id: "c-bad",
        };
        let store = MemoryStore::new();
        let summary = export_into(&source, &store).await;

        let graph = store.snapshot();
        let good = NodeRef::new(NodeLabel::Client).with("internal_id", "c-good");
        let bad = NodeRef::new(NodeLabel::Client).with("internal_id", "c-bad");
        let profile = NodeRef::new(NodeLabel::ClientScope).with("id", "s-profile");
        let email = NodeRef::new(NodeLabel::ClientScope).with("id", "s-email");

        assert!(graph.has_edge(&good, RelType::DefaultScope, &profile));
        assert!(graph.has_edge(&good, RelType::OptionalScope, &email));
        assert!(!graph.has_edge(&bad, RelType::DefaultScope, &profile));
        assert_eq!(summary.loader("client_scopes").unwrap().extraction_failures, 2);
    }

    #[tokio::test]
    async fn test_execution_authenticator_is_first_writer_wins() {
        let mut snapshot = demo_snapshot();
        let demo = &mut snapshot["data"]["demo"];
        demo["flows"] = json!([{"id": "f-browser", "alias": "browser", "builtIn": true}]);
        demo["flow_executions"] = json!({"browser": [
            {"id": "e-1", "authenticator": "auth-cookie", "requirement": "ALTERNATIVE", "level": 0, "index": 0},
            {"displayName": "no id, skipped"}
        ]});
        let store = MemoryStore::new();
        export_into(&SnapshotSource::from_value(snapshot.clone()).unwrap(), &store).await;

        snapshot["data"]["demo"]["flow_executions"]["browser"][0]["authenticator"] = json!("auth-otp-form");
        snapshot["data"]["demo"]["flow_executions"]["browser"][0]["requirement"] = json!("REQUIRED");
        export_into(&SnapshotSource::from_value(snapshot).unwrap(), &store).await;

        let graph = store.snapshot();
        let exec = NodeRef::new(NodeLabel::AuthenticationExecution).with("id", "e-1");
        let node = graph.node(&exec).unwrap();
        assert_eq!(node.get_str("authenticator"), Some("auth-cookie"));
        assert_eq!(node.get_str("requirement"), Some("REQUIRED"));
        assert_eq!(graph.with_label(NodeLabel::AuthenticationExecution).len(), 1);
        assert!(graph.has_edge(
            &NodeRef::new(NodeLabel::AuthenticationFlow).with("id", "f-browser"),
            RelType::HasExecution,
            &exec,
        ));
    }

    #[tokio::test]
    async fn test_execution_info_provider_id_is_authenticator() {
        let mut snapshot = demo_snapshot();
        let demo = &mut snapshot["data"]["demo"];
        demo["flows"] = json!([{"id": "f-browser", "alias": "browser", "builtIn": true}]);
        demo["flow_executions"] = json!({"browser": [{
            "id": "e-1",
            "providerId": "auth-cookie",
            "displayName": "Cookie",
            "requirement": "ALTERNATIVE",
            "level": 0,
            "index": 0
        }]});
        let store = MemoryStore::new();
        export_into(&SnapshotSource::from_value(snapshot.clone()).unwrap(), &store).await;

        snapshot["data"]["demo"]["flow_executions"]["browser"][0]["providerId"] = json!("auth-otp-form");
        export_into(&SnapshotSource::from_value(snapshot).unwrap(), &store).await;

        let graph = store.snapshot();
        let node = graph
            .node(&NodeRef::new(NodeLabel::AuthenticationExecution).with("id", "e-1"))
            .unwrap();
        assert_eq!(node.get_str("authenticator"), Some("auth-cookie"));
        assert_eq!(node.get_str("providerId"), None);
        assert_eq!(node.get_str("displayName"), Some("Cookie"));
    }

    #[tokio::test]
    async fn test_role_mappings_and_cross_container_composites() {
        let mut snapshot = demo_snapshot();
        let demo = &mut snapshot["data"]["demo"];
        demo["client_roles"]["c-app"] = json!([
            {"id": "r-app-read", "name": "read", "composite": false, "clientRole": true},
            {"id": "r-app-manage", "name": "manage", "composite": true, "clientRole": true}
        ]);
        demo["client_role_composites"] = json!({"r-app-manage": [{"id": "r-admin", "name": "admin"}]});
        demo["group_realm_roles"] = json!({"g-eng": [{"id": "r-admin", "name": "admin"}]});
        demo["group_client_roles"] = json!({"g-backend": {"c-app": [{"id": "r-app-read", "name": "read"}]}});
        demo["user_client_roles"] = json!({"u-alice": {"c-app": [{"id": "r-app-manage", "name": "manage"}]}});
        demo["client_scopes"] = json!([{"id": "s-profile", "name": "profile", "protocol": "openid-connect"}]);
        demo["scope_mappers"] = json!({"s-profile": [{"id": "sm-1", "name": "full name", "protocolMapper": "oidc-full-name-mapper"}]});

        let store = MemoryStore::new();
        let summary = export_into(&SnapshotSource::from_value(snapshot).unwrap(), &store).await;
        assert!(!summary.total().has_errors());
        let graph = store.snapshot();

        let admin = NodeRef::new(NodeLabel::RealmRole).with("name", "admin").with("realm", "demo");
        let read = NodeRef::new(NodeLabel::ClientRole).with("name", "read").with("client", "c-app");
        let manage = NodeRef::new(NodeLabel::ClientRole).with("name", "manage").with("client", "c-app");
        let alice = NodeRef::new(NodeLabel::User).with("id", "u-alice");

        assert!(graph.has_edge(&role("r-app-manage"), RelType::ComposedOf, &role("r-admin")));
        assert!(graph.has_edge(&group("g-eng"), RelType::HasRole, &admin));
        assert!(graph.has_edge(&group("g-backend"), RelType::HasRole, &read));
        assert!(!graph.has_edge(&group("g-backend"), RelType::HasRole, &admin));
        assert!(graph.has_edge(&alice, RelType::HasRole, &manage));
        assert!(graph.has_edge(&alice, RelType::HasRole, &admin));

        let mapper = NodeRef::new(NodeLabel::ProtocolMapper).with("id", "sm-1");
        assert!(graph.has_edge(
            &NodeRef::new(NodeLabel::ClientScope).with("id", "s-profile"),
            RelType::HasMapper,
            &mapper,
        ));
        assert_eq!(
            graph.node(&mapper).unwrap().get_str("protocolMapper"),
            Some("oidc-full-name-mapper")
        );
    }

    #[tokio::test]
    async fn test_component_and_idp_loading() {
        let mut snapshot = demo_snapshot();
        let demo = &mut snapshot["data"]["demo"];
        demo["components"] = json!([
            {"id": "0123456789abcdef", "providerId": "rsa-generated", "providerType": "org.keycloak.keys.KeyProvider"},
            {"id": "k-2", "name": "ldap", "providerId": "ldap"},
            {"name": "no id"}
        ]);
        demo["identity_providers"] = json!([
            {"internalId": "idp-1", "alias": "google", "providerId": "google", "enabled": true}
        ]);
        demo["idp_mappers"] = json!({"google": [{"id": "m-1", "name": "email", "identityProviderAlias": "google"}]});

        let store = MemoryStore::new();
        export_into(&SnapshotSource::from_value(snapshot).unwrap(), &store).await;
        let graph = store.snapshot();

        let unnamed = graph
            .node(&NodeRef::new(NodeLabel::Component).with("id", "0123456789abcdef"))
            .unwrap();
        assert_eq!(unnamed.get_str("name"), Some("Unnamed Component (01234567)"));
        let named = graph.node(&NodeRef::new(NodeLabel::Component).with("id", "k-2")).unwrap();
        assert_eq!(named.get_str("name"), Some("ldap"));
        assert_eq!(graph.with_label(NodeLabel::Component).len(), 2);

        let idp = NodeRef::new(NodeLabel::IdentityProvider).with("internalId", "idp-1");
        assert!(graph.has_edge(&idp, RelType::InRealm, &realm()));
        assert_eq!(graph.node(&idp).unwrap().get_str("enabled"), Some("true"));
        assert!(graph.has_edge(
            &idp,
            RelType::HasMapper,
            &NodeRef::new(NodeLabel::IdpMapper).with("id", "m-1"),
        ));
    }

    #[tokio::test]
    async fn test_realm_filter() {
        let mut snapshot = demo_snapshot();
        snapshot["realms"] = json!([{"realm": "demo"}, {"realm": "other"}]);
        let source = SnapshotSource::from_value(snapshot).unwrap();
        let store = MemoryStore::new();

        let options = ExportOptions {
            reset: false,
            realms: vec!["other".into()],
        };
        let summary = run_export(&source, &store, &options).await;

        assert_eq!(summary.realms, vec!["other".to_string()]);
        let graph = store.snapshot();
        assert_eq!(graph.with_label(NodeLabel::Realm).len(), 1);
        assert!(graph.with_label(NodeLabel::User).is_empty());
    }

    #[tokio::test]
    async fn test_reset_before_load() {
        let source = SnapshotSource::from_value(demo_snapshot()).unwrap();
        let store = MemoryStore::new();
        export_into(&source, &store).await;
        let once = store.snapshot().counts();

        let options = ExportOptions {
            reset: true,
            realms: Vec::new(),
        };
        let summary = run_export(&source, &store, &options).await;

        let reset = summary.reset.unwrap();
        assert_eq!(reset.deleted, once);
        assert_eq!(store.snapshot().counts(), once);
        assert_eq!(summary.schema.created, NodeLabel::ALL.len());
    }

    #[tokio::test]
    async fn test_empty_source() {
        let source = SnapshotSource::from_value(json!({"realms": []})).unwrap();
        let store = MemoryStore::new();
        let summary = export_into(&source, &store).await;
        assert!(summary.realms.is_empty());
        assert_eq!(store.snapshot().counts(), GraphCounts::default());
    }
}
