//! # KcMapper Graph
//!
//! Neo4j side of KcMapper.
//!
//! Provides the transform-and-load engine that turns identity source
//! records into an idempotently merged property graph, the schema
//! bootstrap/reset, and the named-query gateway used for analysis.

pub mod client;
pub mod cypher;
pub mod error;
pub mod memory;
pub mod queries;
pub mod schema;
pub mod store;
pub mod sync;

pub use client::GraphClient;
pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use queries::{GatewayError, QueryCatalogue, QueryGateway, QueryResult};
pub use store::{GraphCounts, GraphReader, GraphStore, UpsertOutcome};
pub use sync::{run_export, ExportOptions, ExportSummary, SyncResult};
