pub mod config;
pub mod dispatcher;
pub mod errors;
pub mod models;
pub mod normalize;
pub mod routes;
pub mod store;
pub mod swagger;
pub mod titanic;

#[cfg(test)]
mod test_utils;


use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use config::Config;
use dispatcher::Dispatcher;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub dispatcher: Dispatcher,
}

/// Health check endpoint for monitoring
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "Store reachable"),
        (status = 503, description = "Store unreachable")
    )
)]
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    match state.dispatcher.store().ping().await {
        Ok(()) => Ok(Json(serde_json::json!({"status": "ok"}))),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .merge(routes::pages::router())
        .nest("/api/v1/mongo", routes::mongo::router())
        .merge(swagger::create_swagger_router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
