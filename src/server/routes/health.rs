use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::config::{APP_NAME, VERSION};
use crate::service::ChatService;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    name: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    api_key_configured: bool,
    backend: String,
    model: String,
}

pub fn router() -> Router<ChatService> {
    Router::new()
        .route("/health", get(health))
        .route("/api/status", get(status))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        name: APP_NAME,
        version: VERSION,
    })
}

async fn status(State(service): State<ChatService>) -> Json<StatusResponse> {
    let backend = service.backend();
    Json(StatusResponse {
        api_key_configured: backend.has_api_key(),
        backend: backend.name().to_string(),
        model: backend.default_model().to_string(),
    })
}
