//! The extraction interface consumed by the loaders.

use async_trait::async_trait;
use kcm_core::Record;

use crate::SourceResult;

/// Read-only view of the identity server's admin API.
///
/// Every call is scoped to a realm by name, except [`list_realms`].
/// Client, group, user and role arguments are internal ids unless the
/// parameter name says otherwise.
///
/// [`list_realms`]: IdentitySource::list_realms
#[async_trait]
pub trait IdentitySource: Send + Sync {
    async fn list_realms(&self) -> SourceResult<Vec<Record>>;

    // Clients
    async fn list_clients(&self, realm: &str) -> SourceResult<Vec<Record>>;
    async fn client_mappers(&self, realm: &str, client_id: &str) -> SourceResult<Vec<Record>>;
    async fn client_default_scopes(&self, realm: &str, client_id: &str) -> SourceResult<Vec<Record>>;
    async fn client_optional_scopes(&self, realm: &str, client_id: &str) -> SourceResult<Vec<Record>>;

    // Roles
    async fn list_realm_roles(&self, realm: &str) -> SourceResult<Vec<Record>>;
    async fn list_client_roles(&self, realm: &str, client_id: &str) -> SourceResult<Vec<Record>>;
    /// Children of a composite realm role, looked up by role name.
    async fn realm_role_composites(&self, realm: &str, role_name: &str) -> SourceResult<Vec<Record>>;
    /// Children of a composite client role, looked up by role id.
    async fn client_role_composites(&self, realm: &str, role_id: &str) -> SourceResult<Vec<Record>>;

    // Groups
    /// Top-level groups with their descendants embedded under `subGroups`.
    async fn list_groups(&self, realm: &str) -> SourceResult<Vec<Record>>;
    async fn group_realm_roles(&self, realm: &str, group_id: &str) -> SourceResult<Vec<Record>>;
    async fn group_client_roles(&self, realm: &str, group_id: &str, client_id: &str) -> SourceResult<Vec<Record>>;

    // Users
    async fn list_users(&self, realm: &str) -> SourceResult<Vec<Record>>;
    async fn user_groups(&self, realm: &str, user_id: &str) -> SourceResult<Vec<Record>>;
    async fn user_realm_roles(&self, realm: &str, user_id: &str) -> SourceResult<Vec<Record>>;
    async fn user_client_roles(&self, realm: &str, user_id: &str, client_id: &str) -> SourceResult<Vec<Record>>;

    // Client scopes
    async fn list_client_scopes(&self, realm: &str) -> SourceResult<Vec<Record>>;
    async fn client_scope_mappers(&self, realm: &str, scope_id: &str) -> SourceResult<Vec<Record>>;

    // Identity providers
    async fn list_identity_providers(&self, realm: &str) -> SourceResult<Vec<Record>>;
    async fn identity_provider_mappers(&self, realm: &str, alias: &str) -> SourceResult<Vec<Record>>;

    // Authentication
    async fn list_authentication_flows(&self, realm: &str) -> SourceResult<Vec<Record>>;
    async fn flow_executions(&self, realm: &str, flow_alias: &str) -> SourceResult<Vec<Record>>;

    // Components
    async fn list_components(&self, realm: &str) -> SourceResult<Vec<Record>>;
}
