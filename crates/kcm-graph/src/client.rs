//! Neo4j connection client.

use async_trait::async_trait;
use kcm_core::GraphConfig;
use neo4rs::{BoltType, ConfigBuilder, Graph, Query};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use crate::cypher::{EdgeUpsert, NodeUpsert, Statement};
use crate::schema::Constraint;
use crate::store::{GraphCounts, GraphReader, GraphStore, UpsertOutcome};
use crate::{StoreError, StoreResult};

/// Client for Neo4j graph operations.
#[derive(Clone)]
pub struct GraphClient {
    graph: Graph,
}

impl GraphClient {
    /// Create a new GraphClient from config.
    ///
    /// neo4rs creates its pool lazily, so a `RETURN 1` ping forces the bolt
    /// handshake here. Bad credentials or an unreachable server surface as
    /// an error from `connect` instead of from the first upsert.
    pub async fn connect(config: &GraphConfig) -> StoreResult<Self> {
        let neo4j_config = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.user)
            .password(&config.password)
            .db(config.database.as_str())
            .max_connections(4)
            .fetch_size(200)
            .build()?;

        let graph = Graph::connect(neo4j_config).await?;
        graph.run(Query::new("RETURN 1".to_string())).await?;

        debug!(uri = %config.uri, database = %config.database, "Connected to Neo4j");
        Ok(Self { graph })
    }

    /// Execute a Cypher query that returns no results.
    pub async fn execute(&self, query: Query) -> StoreResult<()> {
        self.graph.run(query).await?;
        Ok(())
    }

    /// Execute a Cypher query and return results as rows.
    pub async fn query(&self, query: Query) -> StoreResult<Vec<neo4rs::Row>> {
        let mut result = self.graph.execute(query).await?;

        let mut rows = Vec::new();
        while let Some(row) = result.next().await? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Execute a Cypher query and return a single scalar value.
    pub async fn query_scalar<T: DeserializeOwned>(&self, query: Query, field: &str) -> StoreResult<Option<T>> {
        let rows = self.query(query).await?;
        match rows.into_iter().next() {
            Some(row) => {
                let val: T = row
                    .get(field)
                    .map_err(|e| StoreError::Query(format!("Failed to get field '{}': {:?}", field, e)))?;
                Ok(Some(val))
            }
            None => Ok(None),
        }
    }

    async fn names(&self, cypher: &str) -> StoreResult<Vec<String>> {
        let rows = self.query(Query::new(cypher.to_string())).await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| row.get::<String>("name").ok())
            .collect())
    }
}

/// Build a parameterized neo4rs query from a rendered statement.
fn to_query(statement: &Statement) -> Query {
    statement
        .params
        .iter()
        .fold(Query::new(statement.text.clone()), |query, (name, value)| {
            query.param(name, json_to_bolt(value))
        })
}

fn json_to_bolt(value: &Value) -> BoltType {
    match value {
        Value::Null => BoltType::Null(neo4rs::BoltNull),
        Value::Bool(v) => BoltType::Boolean(neo4rs::BoltBoolean::new(*v)),
        Value::Number(v) => match v.as_i64() {
            Some(i) => BoltType::Integer(neo4rs::BoltInteger::new(i)),
            None => BoltType::Float(neo4rs::BoltFloat::new(v.as_f64().unwrap_or_default())),
        },
        Value::String(v) => BoltType::String(neo4rs::BoltString::new(v)),
        Value::Array(v) => BoltType::List(neo4rs::BoltList {
            value: v.iter().map(json_to_bolt).collect(),
        }),
        Value::Object(v) => BoltType::Map(neo4rs::BoltMap {
            value: v
                .iter()
                .map(|(k, v)| (neo4rs::BoltString::new(k), json_to_bolt(v)))
                .collect(),
        }),
    }
}

/// Quote a schema object name for DROP statements.
fn quote_name(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

#[async_trait]
impl GraphStore for GraphClient {
    async fn merge_node(&self, node: &NodeUpsert) -> StoreResult<()> {
        self.execute(to_query(&node.to_statement())).await
    }

    async fn merge_edge(&self, edge: &EdgeUpsert) -> StoreResult<UpsertOutcome> {
        let linked: i64 = self
            .query_scalar(to_query(&edge.to_statement()), "linked")
            .await?
            .unwrap_or(0);
        if linked > 0 {
            Ok(UpsertOutcome::Applied)
        } else {
            Ok(UpsertOutcome::MissingEndpoint)
        }
    }

    async fn create_constraint(&self, constraint: &Constraint) -> StoreResult<()> {
        self.execute(Query::new(constraint.to_cypher())).await
    }

    async fn constraint_names(&self) -> StoreResult<Vec<String>> {
        self.names("SHOW CONSTRAINTS YIELD name RETURN name").await
    }

    async fn drop_constraint(&self, name: &str) -> StoreResult<()> {
        self.execute(Query::new(format!("DROP CONSTRAINT {} IF EXISTS", quote_name(name))))
            .await
    }

    async fn standalone_index_names(&self) -> StoreResult<Vec<String>> {
        self.names("SHOW INDEXES YIELD name, owningConstraint WHERE owningConstraint IS NULL RETURN name")
            .await
    }

    async fn drop_index(&self, name: &str) -> StoreResult<()> {
        self.execute(Query::new(format!("DROP INDEX {} IF EXISTS", quote_name(name))))
            .await
    }

    async fn delete_all(&self) -> StoreResult<()> {
        self.execute(Query::new("MATCH (n) DETACH DELETE n".to_string())).await
    }

    async fn counts(&self) -> StoreResult<GraphCounts> {
        let node_query = Query::new("MATCH (n) RETURN count(n) as count".to_string());
        let rel_query = Query::new("MATCH ()-[r]->() RETURN count(r) as count".to_string());

        let node_count: i64 = self.query_scalar(node_query, "count").await?.unwrap_or(0);
        let rel_count: i64 = self.query_scalar(rel_query, "count").await?.unwrap_or(0);

        Ok(GraphCounts {
            nodes: node_count as usize,
            relationships: rel_count as usize,
        })
    }
}

#[async_trait]
impl GraphReader for GraphClient {
    async fn run_read(
        &self,
        query: &str,
        params: &Map<String, Value>,
        columns: &[String],
    ) -> StoreResult<Vec<Vec<Value>>> {
        let query = params
            .iter()
            .fold(Query::new(query.to_string()), |q, (name, value)| {
                q.param(name, json_to_bolt(value))
            });

        let rows = self.query(query).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|col| row.get::<Value>(col).unwrap_or(Value::Null))
                    .collect()
            })
            .collect())
    }
}
