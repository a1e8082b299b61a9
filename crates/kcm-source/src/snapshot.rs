//! Snapshot-backed source.
//!
//! Serves every [`IdentitySource`] call from a JSON document instead of a
//! live server. Used for offline exports and as the fixture for engine
//! tests. Lookups for entities the snapshot does not mention return an
//! empty list.
//!
//! ```json
//! {
//!   "realms": [{"realm": "demo"}],
//!   "data": {
//!     "demo": {
//!       "clients": [{"id": "c-1", "clientId": "app"}],
//!       "client_mappers": {"c-1": [{"id": "m-1", "name": "email-mapper"}]},
//!       "groups": [{"id": "g-1", "name": "engineering", "subGroups": []}]
//!     }
//!   }
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use kcm_core::Record;
use serde::Deserialize;

use crate::{IdentitySource, SourceError, SourceResult};

type ByKey = HashMap<String, Vec<Record>>;
type ByKeyPair = HashMap<String, HashMap<String, Vec<Record>>>;

/// Full snapshot document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub realms: Vec<Record>,
    /// Per-realm collections, keyed by realm name.
    #[serde(default)]
    pub data: HashMap<String, RealmSnapshot>,
}

/// Collections for one realm. Keyed maps use internal ids, except
/// `realm_role_composites` (role name) and `idp_mappers` / `flow_executions`
/// (alias).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RealmSnapshot {
    pub clients: Vec<Record>,
    pub client_mappers: ByKey,
    pub default_scopes: ByKey,
    pub optional_scopes: ByKey,
    pub realm_roles: Vec<Record>,
    pub client_roles: ByKey,
    pub realm_role_composites: ByKey,
    pub client_role_composites: ByKey,
    pub groups: Vec<Record>,
    pub group_realm_roles: ByKey,
    pub group_client_roles: ByKeyPair,
    pub users: Vec<Record>,
    pub user_groups: ByKey,
    pub user_realm_roles: ByKey,
    pub user_client_roles: ByKeyPair,
    pub client_scopes: Vec<Record>,
    pub scope_mappers: ByKey,
    pub identity_providers: Vec<Record>,
    pub idp_mappers: ByKey,
    pub flows: Vec<Record>,
    pub flow_executions: ByKey,
    pub components: Vec<Record>,
}

/// [`IdentitySource`] over an in-memory [`Snapshot`].
#[derive(Debug, Clone, Default)]
pub struct SnapshotSource {
    snapshot: Snapshot,
}

impl SnapshotSource {
    pub fn new(snapshot: Snapshot) -> Self {
        Self { snapshot }
    }

    /// Parse a snapshot from a JSON value.
    pub fn from_value(value: serde_json::Value) -> SourceResult<Self> {
        let snapshot: Snapshot = serde_json::from_value(value)?;
        Ok(Self::new(snapshot))
    }

    /// Read a snapshot file.
    pub fn from_path(path: &Path) -> SourceResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| SourceError::Snapshot(format!("{}: {}", path.display(), e)))?;
        let snapshot: Snapshot = serde_json::from_str(&text)
            .map_err(|e| SourceError::Snapshot(format!("{}: {}", path.display(), e)))?;
        Ok(Self::new(snapshot))
    }

    fn realm(&self, realm: &str) -> Option<&RealmSnapshot> {
        self.snapshot.data.get(realm)
    }

    fn list(&self, realm: &str, pick: impl Fn(&RealmSnapshot) -> &Vec<Record>) -> SourceResult<Vec<Record>> {
        Ok(self.realm(realm).map(|r| pick(r).clone()).unwrap_or_default())
    }

    fn keyed(&self, realm: &str, key: &str, pick: impl Fn(&RealmSnapshot) -> &ByKey) -> SourceResult<Vec<Record>> {
        Ok(self
            .realm(realm)
            .and_then(|r| pick(r).get(key).cloned())
            .unwrap_or_default())
    }

    fn keyed_pair(
        &self,
        realm: &str,
        outer: &str,
        inner: &str,
        pick: impl Fn(&RealmSnapshot) -> &ByKeyPair,
    ) -> SourceResult<Vec<Record>> {
        Ok(self
            .realm(realm)
            .and_then(|r| pick(r).get(outer))
            .and_then(|m| m.get(inner).cloned())
            .unwrap_or_default())
    }
}

#[async_trait]
impl IdentitySource for SnapshotSource {
    async fn list_realms(&self) -> SourceResult<Vec<Record>> {
        Ok(self.snapshot.realms.clone())
    }

    async fn list_clients(&self, realm: &str) -> SourceResult<Vec<Record>> {
        self.list(realm, |r| &r.clients)
    }

    async fn client_mappers(&self, realm: &str, client_id: &str) -> SourceResult<Vec<Record>> {
        self.keyed(realm, client_id, |r| &r.client_mappers)
    }

    async fn client_default_scopes(&self, realm: &str, client_id: &str) -> SourceResult<Vec<Record>> {
        self.keyed(realm, client_id, |r| &r.default_scopes)
    }

    async fn client_optional_scopes(&self, realm: &str, client_id: &str) -> SourceResult<Vec<Record>> {
        self.keyed(realm, client_id, |r| &r.optional_scopes)
    }

    async fn list_realm_roles(&self, realm: &str) -> SourceResult<Vec<Record>> {
        self.list(realm, |r| &r.realm_roles)
    }

    async fn list_client_roles(&self, realm: &str, client_id: &str) -> SourceResult<Vec<Record>> {
        self.keyed(realm, client_id, |r| &r.client_roles)
    }

    async fn realm_role_composites(&self, realm: &str, role_name: &str) -> SourceResult<Vec<Record>> {
        self.keyed(realm, role_name, |r| &r.realm_role_composites)
    }

    async fn client_role_composites(&self, realm: &str, role_id: &str) -> SourceResult<Vec<Record>> {
        self.keyed(realm, role_id, |r| &r.client_role_composites)
    }

    async fn list_groups(&self, realm: &str) -> SourceResult<Vec<Record>> {
        self.list(realm, |r| &r.groups)
    }

    async fn group_realm_roles(&self, realm: &str, group_id: &str) -> SourceResult<Vec<Record>> {
        self.keyed(realm, group_id, |r| &r.group_realm_roles)
    }

    async fn group_client_roles(&self, realm: &str, group_id: &str, client_id: &str) -> SourceResult<Vec<Record>> {
        self.keyed_pair(realm, group_id, client_id, |r| &r.group_client_roles)
    }

    async fn list_users(&self, realm: &str) -> SourceResult<Vec<Record>> {
        self.list(realm, |r| &r.users)
    }

    async fn user_groups(&self, realm: &str, user_id: &str) -> SourceResult<Vec<Record>> {
        self.keyed(realm, user_id, |r| &r.user_groups)
    }

    async fn user_realm_roles(&self, realm: &str, user_id: &str) -> SourceResult<Vec<Record>> {
        self.keyed(realm, user_id, |r| &r.user_realm_roles)
    }

    async fn user_client_roles(&self, realm: &str, user_id: &str, client_id: &str) -> SourceResult<Vec<Record>> {
        self.keyed_pair(realm, user_id, client_id, |r| &r.user_client_roles)
    }

    async fn list_client_scopes(&self, realm: &str) -> SourceResult<Vec<Record>> {
        self.list(realm, |r| &r.client_scopes)
    }

    async fn client_scope_mappers(&self, realm: &str, scope_id: &str) -> SourceResult<Vec<Record>> {
        self.keyed(realm, scope_id, |r| &r.scope_mappers)
    }

    async fn list_identity_providers(&self, realm: &str) -> SourceResult<Vec<Record>> {
        self.list(realm, |r| &r.identity_providers)
    }

    async fn identity_provider_mappers(&self, realm: &str, alias: &str) -> SourceResult<Vec<Record>> {
        self.keyed(realm, alias, |r| &r.idp_mappers)
    }

    async fn list_authentication_flows(&self, realm: &str) -> SourceResult<Vec<Record>> {
        self.list(realm, |r| &r.flows)
    }

    async fn flow_executions(&self, realm: &str, flow_alias: &str) -> SourceResult<Vec<Record>> {
        self.keyed(realm, flow_alias, |r| &r.flow_executions)
    }

    async fn list_components(&self, realm: &str) -> SourceResult<Vec<Record>> {
        self.list(realm, |r| &r.components)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_snapshot_lookups() {
        let source = SnapshotSource::from_value(json!({
            "realms": [{"realm": "demo"}],
            "data": {
                "demo": {
                    "clients": [{"id": "c-1", "clientId": "app"}],
                    "group_client_roles": {"g-1": {"c-1": [{"name": "app.read"}]}}
                }
            }
        }))
        .unwrap();

        assert_eq!(source.list_realms().await.unwrap().len(), 1);
        assert_eq!(source.list_clients("demo").await.unwrap().len(), 1);
        assert_eq!(source.group_client_roles("demo", "g-1", "c-1").await.unwrap().len(), 1);
        assert!(source.group_client_roles("demo", "g-1", "c-2").await.unwrap().is_empty());
        assert!(source.list_users("demo").await.unwrap().is_empty());
        assert!(source.list_clients("other").await.unwrap().is_empty());
    }

    #[test]
    fn test_missing_file_is_snapshot_error() {
        let err = SnapshotSource::from_path(Path::new("/nonexistent/snapshot.json")).unwrap_err();
        assert!(matches!(err, SourceError::Snapshot(_)));
    }
}
