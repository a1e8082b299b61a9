//! Query gateway: runs named catalogue queries against a [`GraphReader`].

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, error};

use crate::store::GraphReader;
use crate::StoreError;

use super::catalogue::QueryCatalogue;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Query '{0}' not found")]
    NotFound(String),

    #[error("Neo4j authentication failed. Check credentials.")]
    Unauthorized,

    #[error("Could not connect to Neo4j: {0}")]
    Unavailable(String),

    #[error("An internal error occurred: {0}")]
    Internal(String),

    #[error("Invalid query catalogue: {0}")]
    Catalogue(String),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

impl From<StoreError> for GatewayError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unauthorized(_) => Self::Unauthorized,
            StoreError::Unavailable(msg) => Self::Unavailable(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}

/// Rows of a named query, one value per declared column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

#[derive(Clone)]
pub struct QueryGateway {
    reader: Arc<dyn GraphReader>,
    catalogue: Arc<QueryCatalogue>,
}

impl QueryGateway {
    pub fn new(reader: Arc<dyn GraphReader>, catalogue: QueryCatalogue) -> Self {
        Self {
            reader,
            catalogue: Arc::new(catalogue),
        }
    }

    pub fn catalogue(&self) -> &QueryCatalogue {
        &self.catalogue
    }

    /// Run a catalogue query. Declared parameters missing from `params`
    /// are passed as null.
    pub async fn run_named(&self, name: &str, params: &Map<String, Value>) -> GatewayResult<QueryResult> {
        let query = self
            .catalogue
            .get(name)
            .ok_or_else(|| GatewayError::NotFound(name.to_string()))?;

        let mut bound = params.clone();
        for param in &query.params {
            bound.entry(param.name.clone()).or_insert(Value::Null);
        }

        let shown = Value::Object(bound.clone());
        debug!(query = name, params = %shown, "Running named query");
        let rows = self
            .reader
            .run_read(&query.query, &bound, &query.columns)
            .await
            .map_err(|e| {
                error!(query = name, error = %e, "Error during query execution");
                GatewayError::from(e)
            })?;

        Ok(QueryResult {
            columns: query.columns.clone(),
            rows,
        })
    }

    /// Distinct non-empty values of the query's first column, in the order
    /// first returned.
    pub async fn autocomplete(&self, name: &str, params: &Map<String, Value>) -> GatewayResult<Vec<Value>> {
        let result = self.run_named(name, params).await?;

        let mut suggestions: Vec<Value> = Vec::new();
        for value in result.rows.into_iter().filter_map(|row| row.into_iter().next()) {
            let empty = match &value {
                Value::Null => true,
                Value::String(s) => s.is_empty(),
                _ => false,
            };
            if !empty && !suggestions.contains(&value) {
                suggestions.push(value);
            }
        }
        Ok(suggestions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StoreResult;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Returns canned rows and records the parameters it was called with.
    struct StubReader {
        rows: StoreResult<Vec<Vec<Value>>>,
        seen: Mutex<Vec<Map<String, Value>>>,
    }

    impl StubReader {
        fn new(rows: StoreResult<Vec<Vec<Value>>>) -> Arc<Self> {
            Arc::new(Self {
                rows,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl GraphReader for StubReader {
        async fn run_read(
            &self,
            _query: &str,
            params: &Map<String, Value>,
            _columns: &[String],
        ) -> StoreResult<Vec<Vec<Value>>> {
            self.seen.lock().unwrap().push(params.clone());
            match &self.rows {
                Ok(rows) => Ok(rows.clone()),
                Err(StoreError::Unauthorized(m)) => Err(StoreError::Unauthorized(m.clone())),
                Err(StoreError::Unavailable(m)) => Err(StoreError::Unavailable(m.clone())),
                Err(e) => Err(StoreError::Query(e.to_string())),
            }
        }
    }

    fn catalogue() -> QueryCatalogue {
        QueryCatalogue::parse(
            r#"{
                "names": {"query": "MATCH (u:User) RETURN u.username AS name, u.id AS id",
                          "columns": ["name", "id"],
                          "params": [{"name": "realm"}]}
            }"#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_unknown_query_is_not_found() {
        let gateway = QueryGateway::new(StubReader::new(Ok(vec![])), catalogue());
        let err = gateway.run_named("nope", &Map::new()).await.unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(name) if name == "nope"));
    }

    #[tokio::test]
    async fn test_run_named_binds_missing_params_as_null() {
        let reader = StubReader::new(Ok(vec![vec![json!("alice"), json!("u-1")]]));
        let gateway = QueryGateway::new(reader.clone(), catalogue());

        let result = gateway.run_named("names", &Map::new()).await.unwrap();
        assert_eq!(result.columns, vec!["name", "id"]);
        assert_eq!(result.rows, vec![vec![json!("alice"), json!("u-1")]]);
        assert_eq!(reader.seen.lock().unwrap()[0]["realm"], Value::Null);
    }

    #[tokio::test]
    async fn test_autocomplete_dedupes_and_drops_empty() {
        let rows = vec![
            vec![json!("bob"), json!(1)],
            vec![json!(""), json!(2)],
            vec![json!("alice"), json!(3)],
            vec![Value::Null, json!(4)],
            vec![json!("bob"), json!(5)],
        ];
        let gateway = QueryGateway::new(StubReader::new(Ok(rows)), catalogue());
        let values = gateway.autocomplete("names", &Map::new()).await.unwrap();
        assert_eq!(values, vec![json!("bob"), json!("alice")]);
    }

    #[tokio::test]
    async fn test_store_errors_are_mapped() {
        let gateway = QueryGateway::new(
            StubReader::new(Err(StoreError::Unauthorized("bad password".into()))),
            catalogue(),
        );
        assert!(matches!(
            gateway.run_named("names", &Map::new()).await,
            Err(GatewayError::Unauthorized)
        ));

        let gateway = QueryGateway::new(
            StubReader::new(Err(StoreError::Unavailable("refused".into()))),
            catalogue(),
        );
        assert!(matches!(
            gateway.autocomplete("names", &Map::new()).await,
            Err(GatewayError::Unavailable(_))
        ));

        let gateway = QueryGateway::new(StubReader::new(Err(StoreError::Query("syntax".into()))), catalogue());
        assert!(matches!(
            gateway.run_named("names", &Map::new()).await,
            Err(GatewayError::Internal(_))
        ));
    }
}
