//! Admin REST API client.
//!
//! Authenticates against the OpenID Connect token endpoint of the admin
//! realm and issues bearer-authenticated GETs under `/admin/realms`.

use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use kcm_core::{Record, SourceConfig};
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::{IdentitySource, SourceError, SourceResult};

/// Tokens this close to expiry are requested again.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(10);

/// Identity server admin API client.
pub struct KeycloakClient {
    base_url: Url,
    config: SourceConfig,
    client: reqwest::Client,
    token: Mutex<Option<CachedToken>>,
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

impl KeycloakClient {
    /// Create a client and authenticate once.
    ///
    /// The initial token request doubles as a connectivity check, so a bad
    /// URL or credentials fail here rather than on the first extraction.
    pub async fn connect(config: &SourceConfig) -> SourceResult<Self> {
        let client = Self::new(config)?;
        client.bearer_token().await?;
        debug!(url = %client.base_url, realm = %config.auth_realm, "Authenticated against admin API");
        Ok(client)
    }

    /// Create a client without contacting the server.
    pub fn new(config: &SourceConfig) -> SourceResult<Self> {
        let base_url = Url::parse(config.url.trim_end_matches('/'))
            .map_err(|e| SourceError::Url(format!("{}: {}", config.url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(SourceError::Url(config.url.clone()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SourceError::Request {
                path: config.url.clone(),
                source: e,
            })?;

        Ok(Self {
            base_url,
            config: config.clone(),
            client,
            token: Mutex::new(None),
        })
    }

    /// URL built from `base` plus percent-encoded path segments.
    fn url(&self, segments: &[&str]) -> SourceResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SourceError::Url(self.config.url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn admin_url(&self, realm: &str, segments: &[&str]) -> SourceResult<Url> {
        let mut all = vec!["admin", "realms", realm];
        all.extend_from_slice(segments);
        self.url(&all)
    }

    /// Current access token, requesting a new one when missing or expiring.
    async fn bearer_token(&self) -> SourceResult<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() + TOKEN_REFRESH_MARGIN {
                return Ok(token.access_token.clone());
            }
        }

        let fresh = self.request_token().await?;
        let access_token = fresh.access_token.clone();
        *cached = Some(fresh);
        Ok(access_token)
    }

    async fn request_token(&self) -> SourceResult<CachedToken> {
        let url = self.url(&[
            "realms",
            &self.config.auth_realm,
            "protocol",
            "openid-connect",
            "token",
        ])?;

        let mut form: Vec<(&str, &str)> = vec![("client_id", self.config.client_id.as_str())];
        match (&self.config.username, &self.config.password) {
            (Some(username), password) => {
                form.push(("grant_type", "password"));
                form.push(("username", username.as_str()));
                form.push(("password", password.as_deref().unwrap_or_default()));
                if let Some(totp) = &self.config.totp {
                    form.push(("totp", totp.as_str()));
                }
            }
            (None, _) => form.push(("grant_type", "client_credentials")),
        }
        if let Some(secret) = &self.config.client_secret {
            form.push(("client_secret", secret.as_str()));
        }

        let response = self
            .client
            .post(url.clone())
            .form(&form)
            .send()
            .await
            .map_err(|e| SourceError::Request {
                path: url.path().to_string(),
                source: e,
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Auth(format!("token endpoint returned {}: {}", status, body)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Auth(format!("unreadable token response: {}", e)))?;

        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in.unwrap_or(60)),
        })
    }

    /// GET a JSON array.
    async fn get_list(&self, url: Url) -> SourceResult<Vec<Record>> {
        let token = self.bearer_token().await?;
        let path = url.path().to_string();

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| SourceError::Request {
                path: path.clone(),
                source: e,
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                path,
                status: status.as_u16(),
                body,
            });
        }

        let payload: Value = response.json().await.map_err(|e| SourceError::Decode {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        match payload {
            Value::Array(items) => {
                debug!(path = %path, count = items.len(), "Fetched list");
                Ok(items)
            }
            other => Err(SourceError::Decode {
                path,
                reason: format!("expected a JSON array, got {}", json_kind(&other)),
            }),
        }
    }

    /// GET a paginated JSON array with `first`/`max`.
    async fn get_paged(&self, base: Url) -> SourceResult<Vec<Record>> {
        let page_size = self.config.page_size.max(1);
        collect_pages(page_size, |first| {
            let mut url = base.clone();
            url.query_pairs_mut()
                .append_pair("first", &first.to_string())
                .append_pair("max", &page_size.to_string());
            self.get_list(url)
        })
        .await
    }

    async fn get_admin(&self, realm: &str, segments: &[&str]) -> SourceResult<Vec<Record>> {
        self.get_list(self.admin_url(realm, segments)?).await
    }

    async fn get_full(&self, realm: &str, segments: &[&str]) -> SourceResult<Vec<Record>> {
        let mut url = self.admin_url(realm, segments)?;
        url.query_pairs_mut().append_pair("briefRepresentation", "false");
        self.get_list(url).await
    }

    async fn group_children(&self, realm: &str, group_id: String) -> SourceResult<Vec<Record>> {
        let mut url = self.admin_url(realm, &["groups", &group_id, "children"])?;
        url.query_pairs_mut().append_pair("briefRepresentation", "false");
        self.get_paged(url).await
    }
}

/// Fetch pages until a short, empty or repeated page.
///
/// A server that ignores `first`/`max` keeps answering with the same page;
/// that page is kept once.
async fn collect_pages<F, Fut>(page_size: u32, mut fetch: F) -> SourceResult<Vec<Record>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = SourceResult<Vec<Record>>>,
{
    let mut all = Vec::new();
    let mut previous: Option<Vec<Record>> = None;
    let mut first: u32 = 0;

    loop {
        let page = fetch(first).await?;
        if page.is_empty() {
            break;
        }
        if previous.as_ref() == Some(&page) {
            warn!(first, "Server returned the same page again, paging stopped");
            break;
        }

        let short = page.len() < page_size as usize;
        all.extend(page.iter().cloned());
        if short {
            break;
        }
        previous = Some(page);
        first = first.saturating_add(page_size);
    }

    Ok(all)
}

/// Fill `subGroups` for groups that report children but embed none.
///
/// A failed children lookup leaves that group without children and the
/// rest of the tree intact. Returns the number of failed lookups.
async fn fill_subgroups<F, Fut>(groups: &mut [Record], mut children_of: F) -> usize
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = SourceResult<Vec<Record>>>,
{
    let mut failed = 0;
    let mut stack: Vec<&mut Record> = groups.iter_mut().collect();

    while let Some(group) = stack.pop() {
        if needs_children(group) {
            if let Some(id) = kcm_core::record::id_field(group, "id").map(str::to_string) {
                match children_of(id.clone()).await {
                    Ok(children) => {
                        if let Some(fields) = group.as_object_mut() {
                            fields.insert("subGroups".to_string(), Value::Array(children));
                        }
                    }
                    Err(e) => {
                        warn!(group = %id, error = %e, "Failed to fetch subgroups");
                        failed += 1;
                    }
                }
            }
        }
        if let Some(children) = group.get_mut("subGroups").and_then(Value::as_array_mut) {
            stack.extend(children.iter_mut());
        }
    }

    failed
}

fn needs_children(group: &Record) -> bool {
    let count = group.get("subGroupCount").and_then(Value::as_u64).unwrap_or(0);
    count > 0 && kcm_core::record::children(group, "subGroups").is_empty()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[async_trait]
impl IdentitySource for KeycloakClient {
    async fn list_realms(&self) -> SourceResult<Vec<Record>> {
        self.get_list(self.url(&["admin", "realms"])?).await
    }

    async fn list_clients(&self, realm: &str) -> SourceResult<Vec<Record>> {
        self.get_admin(realm, &["clients"]).await
    }

    async fn client_mappers(&self, realm: &str, client_id: &str) -> SourceResult<Vec<Record>> {
        self.get_admin(realm, &["clients", client_id, "protocol-mappers", "models"])
            .await
    }

    async fn client_default_scopes(&self, realm: &str, client_id: &str) -> SourceResult<Vec<Record>> {
        self.get_admin(realm, &["clients", client_id, "default-client-scopes"])
            .await
    }

    async fn client_optional_scopes(&self, realm: &str, client_id: &str) -> SourceResult<Vec<Record>> {
        self.get_admin(realm, &["clients", client_id, "optional-client-scopes"])
            .await
    }

    async fn list_realm_roles(&self, realm: &str) -> SourceResult<Vec<Record>> {
        self.get_full(realm, &["roles"]).await
    }

    async fn list_client_roles(&self, realm: &str, client_id: &str) -> SourceResult<Vec<Record>> {
        self.get_full(realm, &["clients", client_id, "roles"]).await
    }

    async fn realm_role_composites(&self, realm: &str, role_name: &str) -> SourceResult<Vec<Record>> {
        self.get_admin(realm, &["roles", role_name, "composites"]).await
    }

    async fn client_role_composites(&self, realm: &str, role_id: &str) -> SourceResult<Vec<Record>> {
        self.get_admin(realm, &["roles-by-id", role_id, "composites"]).await
    }

    async fn list_groups(&self, realm: &str) -> SourceResult<Vec<Record>> {
        let mut url = self.admin_url(realm, &["groups"])?;
        url.query_pairs_mut().append_pair("briefRepresentation", "false");
        let mut groups = self.get_paged(url).await?;
        let failed = fill_subgroups(&mut groups, |id| self.group_children(realm, id)).await;
        if failed > 0 {
            warn!(realm, failed, "Group tree is missing the children of some groups");
        }
        Ok(groups)
    }

    async fn group_realm_roles(&self, realm: &str, group_id: &str) -> SourceResult<Vec<Record>> {
        self.get_admin(realm, &["groups", group_id, "role-mappings", "realm"])
            .await
    }

    async fn group_client_roles(&self, realm: &str, group_id: &str, client_id: &str) -> SourceResult<Vec<Record>> {
        self.get_admin(realm, &["groups", group_id, "role-mappings", "clients", client_id])
            .await
    }

    async fn list_users(&self, realm: &str) -> SourceResult<Vec<Record>> {
        self.get_paged(self.admin_url(realm, &["users"])?).await
    }

    async fn user_groups(&self, realm: &str, user_id: &str) -> SourceResult<Vec<Record>> {
        self.get_paged(self.admin_url(realm, &["users", user_id, "groups"])?)
            .await
    }

    async fn user_realm_roles(&self, realm: &str, user_id: &str) -> SourceResult<Vec<Record>> {
        self.get_admin(realm, &["users", user_id, "role-mappings", "realm"])
            .await
    }

    async fn user_client_roles(&self, realm: &str, user_id: &str, client_id: &str) -> SourceResult<Vec<Record>> {
        self.get_admin(realm, &["users", user_id, "role-mappings", "clients", client_id])
            .await
    }

    async fn list_client_scopes(&self, realm: &str) -> SourceResult<Vec<Record>> {
        self.get_admin(realm, &["client-scopes"]).await
    }

    async fn client_scope_mappers(&self, realm: &str, scope_id: &str) -> SourceResult<Vec<Record>> {
        self.get_admin(realm, &["client-scopes", scope_id, "protocol-mappers", "models"])
            .await
    }

    async fn list_identity_providers(&self, realm: &str) -> SourceResult<Vec<Record>> {
        self.get_admin(realm, &["identity-provider", "instances"]).await
    }

    async fn identity_provider_mappers(&self, realm: &str, alias: &str) -> SourceResult<Vec<Record>> {
        self.get_admin(realm, &["identity-provider", "instances", alias, "mappers"])
            .await
    }

    async fn list_authentication_flows(&self, realm: &str) -> SourceResult<Vec<Record>> {
        self.get_admin(realm, &["authentication", "flows"]).await
    }

    async fn flow_executions(&self, realm: &str, flow_alias: &str) -> SourceResult<Vec<Record>> {
        self.get_admin(realm, &["authentication", "flows", flow_alias, "executions"])
            .await
    }

    async fn list_components(&self, realm: &str) -> SourceResult<Vec<Record>> {
        self.get_admin(realm, &["components"]).await
    }
}
