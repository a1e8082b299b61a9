//! Connection settings for the source API and the graph store.

use serde::Deserialize;

use crate::error::{KcmError, KcmResult};

/// Default users page size for the admin API.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Configuration for connecting to the identity server admin API.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Server base URL, e.g. `https://sso.example.com`.
    pub url: String,
    /// Realm the admin credentials authenticate against.
    pub auth_realm: String,
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub client_secret: Option<String>,
    /// One-time password for accounts with OTP enforced.
    pub totp: Option<String>,
    pub page_size: u32,
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080".to_string(),
            auth_realm: "master".to_string(),
            client_id: "admin-cli".to_string(),
            username: None,
            password: None,
            client_secret: None,
            totp: None,
            page_size: DEFAULT_PAGE_SIZE,
            timeout_secs: 30,
        }
    }
}

impl SourceConfig {
    /// Check that a usable credential combination is present.
    ///
    /// A username requires a password; without a username the client
    /// secret is used for a client-credentials grant.
    pub fn validate(&self) -> KcmResult<()> {
        if self.url.trim().is_empty() {
            return Err(KcmError::missing("KEYCLOAK_URL"));
        }
        if self.page_size == 0 {
            return Err(KcmError::invalid("page_size", "must be greater than zero"));
        }
        match (&self.username, &self.password, &self.client_secret) {
            (Some(_), Some(_), _) => Ok(()),
            (Some(_), None, _) => Err(KcmError::missing("KEYCLOAK_PASSWORD")),
            (None, _, Some(_)) => Ok(()),
            (None, _, None) => Err(KcmError::missing("KEYCLOAK_USER or KEYCLOAK_CLIENT_SECRET")),
        }
    }
}

/// Configuration for connecting to Neo4j.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: String::new(),
            database: "neo4j".to_string(),
        }
    }
}

impl GraphConfig {
    pub fn validate(&self) -> KcmResult<()> {
        if self.password.is_empty() {
            return Err(KcmError::missing("NEO4J_PASSWORD"));
        }
        Ok(())
    }
}
