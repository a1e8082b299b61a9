//! Named-query route handlers.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use kcm_graph::{GatewayError, QueryCatalogue, QueryResult};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::state::AppState;

#[derive(Deserialize)]
pub struct ExecuteRequest {
    pub query_name: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

#[derive(Deserialize)]
pub struct AutocompleteRequest {
    pub source_query: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

/// [`GatewayError`] rendered as `{"error": ...}` with a matching status.
pub struct ApiError(GatewayError);

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Unauthorized => StatusCode::UNAUTHORIZED,
            GatewayError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::Internal(_) | GatewayError::Catalogue(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

pub async fn list_queries(State(state): State<AppState>) -> Json<QueryCatalogue> {
    Json(state.gateway.catalogue().clone())
}

pub async fn execute(
    State(state): State<AppState>,
    Json(req): Json<ExecuteRequest>,
) -> Result<Json<QueryResult>, ApiError> {
    let result = state.gateway.run_named(&req.query_name, &req.params).await?;
    Ok(Json(result))
}

pub async fn autocomplete(
    State(state): State<AppState>,
    Json(req): Json<AutocompleteRequest>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let suggestions = state.gateway.autocomplete(&req.source_query, &req.params).await?;
    Ok(Json(suggestions))
}
