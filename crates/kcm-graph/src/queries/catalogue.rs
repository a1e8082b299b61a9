//! Named-query catalogue.
//!
//! A JSON object mapping query names to their definition:
//!
//! ```json
//! {
//!   "list_users": {
//!     "description": "Users of a realm",
//!     "query": "MATCH (u:User)-[:IN_REALM]->(:Realm {name: $realm}) RETURN u.username AS username",
//!     "columns": ["username"],
//!     "params": [{"name": "realm", "label": "Realm", "autocomplete": "list_realms"}]
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::gateway::{GatewayError, GatewayResult};

const BUILTIN: &str = include_str!("../../queries.json");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryParam {
    pub name: String,
    #[serde(default)]
    pub label: String,
    /// Catalogue query whose first column suggests values for this parameter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autocomplete: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedQuery {
    #[serde(default)]
    pub description: String,
    pub query: String,
    /// Returned columns, in order. The first one feeds autocompletion.
    pub columns: Vec<String>,
    #[serde(default)]
    pub params: Vec<QueryParam>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct QueryCatalogue {
    queries: BTreeMap<String, NamedQuery>,
}

impl QueryCatalogue {
    /// The catalogue shipped with the binary.
    pub fn builtin() -> GatewayResult<Self> {
        Self::parse(BUILTIN)
    }

    pub fn from_path(path: &Path) -> GatewayResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| GatewayError::Catalogue(format!("{}: {}", path.display(), e)))?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> GatewayResult<Self> {
        let queries: BTreeMap<String, NamedQuery> =
            serde_json::from_str(text).map_err(|e| GatewayError::Catalogue(e.to_string()))?;

        for (name, query) in &queries {
            if query.columns.is_empty() {
                return Err(GatewayError::Catalogue(format!("query '{name}' declares no columns")));
            }
            for param in &query.params {
                if let Some(source) = &param.autocomplete {
                    if !queries.contains_key(source) {
                        return Err(GatewayError::Catalogue(format!(
                            "query '{name}' parameter '{}' autocompletes from unknown query '{source}'",
                            param.name
                        )));
                    }
                }
            }
        }

        Ok(Self { queries })
    }

    pub fn get(&self, name: &str) -> Option<&NamedQuery> {
        self.queries.get(name)
    }

    /// All queries, sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &NamedQuery)> {
        self.queries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}
