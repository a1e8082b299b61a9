//! Graph store errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Neo4j authentication failed: {0}")]
    Unauthorized(String),

    #[error("Neo4j is unavailable: {0}")]
    Unavailable(String),

    #[error("Neo4j query failed: {0}")]
    Query(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),
}

/// Result type for graph store operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl From<neo4rs::Error> for StoreError {
    fn from(err: neo4rs::Error) -> Self {
        match &err {
            neo4rs::Error::AuthenticationError(msg) => Self::Unauthorized(msg.clone()),
            neo4rs::Error::ConnectionError | neo4rs::Error::IOError { .. } => {
                Self::Unavailable(err.to_string())
            }
            _ if err.to_string().contains("Security.Unauthorized") => {
                Self::Unauthorized(err.to_string())
            }
            _ => Self::Query(err.to_string()),
        }
    }
}
