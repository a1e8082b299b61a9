//! KcMapper Web Server
//!
//! Axum-based JSON API over the named-query catalogue.

pub mod routes;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};
use kcm_graph::QueryGateway;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/queries", get(routes::queries::list_queries))
        .route("/execute", post(routes::queries::execute))
        .route("/autocomplete", post(routes::queries::autocomplete))
        .with_state(state);

    Router::new()
        .route("/health", get(routes::health::health))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Run the web server.
pub async fn run_server(gateway: QueryGateway, host: &str, port: u16) -> anyhow::Result<()> {
    let app = create_router(AppState::new(gateway));

    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    tracing::info!("Web server listening on http://{}:{}", host, port);

    axum::serve(listener, app).await?;
    Ok(())
}
