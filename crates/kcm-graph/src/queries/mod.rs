//! Named read queries over the loaded graph.
//!
//! - `catalogue`: the named-query definitions (embedded or from a file)
//! - `gateway`: runs catalogue queries and maps store failures

pub mod catalogue;
pub mod gateway;

pub use catalogue::{NamedQuery, QueryCatalogue, QueryParam};
pub use gateway::{GatewayError, GatewayResult, QueryGateway, QueryResult};
