//! Upsert statements.
//!
//! Two write shapes exist:
//!
//! ```cypher
//! MERGE (n:Role {id: $key_id}) ON CREATE SET ... SET n:RealmRole SET n += $props
//! MATCH (a:Group {id: $from_id}) MATCH (b:Realm {name: $to_name})
//! MERGE (a)-[:IN_REALM]->(b) RETURN count(*) AS linked
//! ```
//!
//! Labels, relationship types and key field names are `'static` literals;
//! every value travels as a parameter.

use std::fmt;

use kcm_core::{NodeLabel, Properties, RelType};
use serde_json::Value;

/// Key or single-field assignments: fixed field name to value.
pub type Fields = Vec<(&'static str, Value)>;

/// A node identified by label and (part of) its natural key.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRef {
    pub label: NodeLabel,
    pub key: Fields,
}

impl NodeRef {
    pub fn new(label: NodeLabel) -> Self {
        Self {
            label,
            key: Vec::new(),
        }
    }

    /// Add a key field.
    pub fn with(mut self, field: &'static str, value: impl Into<Value>) -> Self {
        self.key.push((field, value.into()));
        self
    }

    fn pattern(&self, var: &str, prefix: &str) -> String {
        let fields: Vec<String> = self
            .key
            .iter()
            .map(|(field, _)| format!("{field}: ${prefix}_{field}"))
            .collect();
        format!("({}:{} {{{}}})", var, self.label, fields.join(", "))
    }

    fn params(&self, prefix: &str) -> Vec<(String, Value)> {
        self.key
            .iter()
            .map(|(field, value)| (format!("{prefix}_{field}"), value.clone()))
            .collect()
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)?;
        for (field, value) in &self.key {
            write!(f, " {field}={value}")?;
        }
        Ok(())
    }
}

/// Match-or-create a node by key, then overwrite its properties.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeUpsert {
    pub node: NodeRef,
    /// Labels added on every upsert (e.g. `RealmRole` on a `Role`).
    pub extra_labels: Vec<NodeLabel>,
    /// Fields written only when the node is created.
    pub on_create: Fields,
    pub properties: Properties,
}

impl NodeUpsert {
    pub fn new(node: NodeRef) -> Self {
        Self {
            node,
            extra_labels: Vec::new(),
            on_create: Vec::new(),
            properties: Properties::new(),
        }
    }

    pub fn label(mut self, label: NodeLabel) -> Self {
        self.extra_labels.push(label);
        self
    }

    pub fn on_create(mut self, field: &'static str, value: impl Into<Value>) -> Self {
        self.on_create.push((field, value.into()));
        self
    }

    /// Merge normalized properties.
    pub fn properties(mut self, properties: Properties) -> Self {
        self.properties.extend(properties);
        self
    }

    /// Set one property, overriding any normalized value of the same name.
    pub fn set(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(field.to_string(), value.into());
        self
    }

    pub fn to_statement(&self) -> Statement {
        let mut text = format!("MERGE {}", self.node.pattern("n", "key"));
        let mut params = self.node.params("key");

        if !self.on_create.is_empty() {
            let sets: Vec<String> = self
                .on_create
                .iter()
                .map(|(field, _)| format!("n.{field} = $create_{field}"))
                .collect();
            text.push_str(&format!(" ON CREATE SET {}", sets.join(", ")));
            params.extend(
                self.on_create
                    .iter()
                    .map(|(field, value)| (format!("create_{field}"), value.clone())),
            );
        }

        for label in &self.extra_labels {
            text.push_str(&format!(" SET n:{label}"));
        }

        text.push_str(" SET n += $props");
        params.push((
            "props".to_string(),
            Value::Object(self.properties.clone().into_iter().collect()),
        ));

        Statement { text, params }
    }
}

/// Match both endpoints by key, then match-or-create the relationship.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeUpsert {
    pub from: NodeRef,
    pub rel: RelType,
    pub to: NodeRef,
}

impl EdgeUpsert {
    pub fn new(from: NodeRef, rel: RelType, to: NodeRef) -> Self {
        Self { from, rel, to }
    }

    pub fn to_statement(&self) -> Statement {
        let text = format!(
            "MATCH {} MATCH {} MERGE (a)-[:{}]->(b) RETURN count(*) AS linked",
            self.from.pattern("a", "from"),
            self.to.pattern("b", "to"),
            self.rel
        );
        let mut params = self.from.params("from");
        params.extend(self.to.params("to"));
        Statement { text, params }
    }
}

impl fmt::Display for EdgeUpsert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})-[:{}]->({})", self.from, self.rel, self.to)
    }
}

/// Rendered Cypher text plus its parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub text: String,
    pub params: Vec<(String, Value)>,
}

impl Statement {
    /// Parameters as a JSON object, for logging.
    pub fn params_json(&self) -> Value {
        Value::Object(self.params.iter().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_node_statement() {
        let upsert = NodeUpsert::new(NodeRef::new(NodeLabel::Role).with("id", "r-1"))
            .label(NodeLabel::RealmRole)
            .set("realm", "demo")
            .set("name", "admin");

        let stmt = upsert.to_statement();
        assert_eq!(
            stmt.text,
            "MERGE (n:Role {id: $key_id}) SET n:RealmRole SET n += $props"
        );
        assert_eq!(stmt.params[0], ("key_id".to_string(), json!("r-1")));
        assert_eq!(
            stmt.params_json()["props"],
            json!({"name": "admin", "realm": "demo"})
        );
    }

    #[test]
    fn test_on_create_statement() {
        let upsert = NodeUpsert::new(NodeRef::new(NodeLabel::AuthenticationExecution).with("id", "e-1"))
            .on_create("authenticator", "auth-cookie");
        let stmt = upsert.to_statement();
        assert_eq!(
            stmt.text,
            "MERGE (n:AuthenticationExecution {id: $key_id}) ON CREATE SET n.authenticator = $create_authenticator SET n += $props"
        );
        assert_eq!(stmt.params_json()["create_authenticator"], json!("auth-cookie"));
    }

    #[test]
    fn test_edge_statement_with_compound_key() {
        let edge = EdgeUpsert::new(
            NodeRef::new(NodeLabel::Group).with("id", "g-1"),
            RelType::HasRole,
            NodeRef::new(NodeLabel::RealmRole)
                .with("name", "admin")
                .with("realm", "demo"),
        );
        let stmt = edge.to_statement();
        assert_eq!(
            stmt.text,
            "MATCH (a:Group {id: $from_id}) MATCH (b:RealmRole {name: $to_name, realm: $to_realm}) \
             MERGE (a)-[:HAS_ROLE]->(b) RETURN count(*) AS linked"
        );
        assert_eq!(
            stmt.params_json(),
            json!({"from_id": "g-1", "to_name": "admin", "to_realm": "demo"})
        );
    }

    #[test]
    fn test_set_overrides_normalized_value() {
        let mut props = Properties::new();
        props.insert("name".into(), json!(""));
        let upsert = NodeUpsert::new(NodeRef::new(NodeLabel::Component).with("id", "c"))
            .properties(props)
            .set("name", "Unnamed Component (c)");
        assert_eq!(upsert.properties["name"], json!("Unnamed Component (c)"));
    }
}
