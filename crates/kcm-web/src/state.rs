//! Application state.

use std::sync::Arc;

use kcm_graph::QueryGateway;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<QueryGateway>,
}

impl AppState {
    pub fn new(gateway: QueryGateway) -> Self {
        Self {
            gateway: Arc::new(gateway),
        }
    }
}
