use axum::body::Bytes;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use crate::importer::{INVALID_JSON_MESSAGE, SAMPLE_FILE_NAME, sample_json};
use crate::server::ServerError;
use crate::service::ChatService;

pub fn router() -> Router<ChatService> {
    Router::new()
        .route("/import", post(import_chat))
        .route("/import/sample", get(sample))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImportResponse {
    chat_id: String,
}

/// The body is read as raw text, so invalid JSON reaches the importer too.
async fn import_chat(
    State(service): State<ChatService>,
    body: Bytes,
) -> Result<(StatusCode, Json<ImportResponse>), ServerError> {
    let text = std::str::from_utf8(&body).map_err(|e| {
        log::debug!("Rejecting import body: {}", e);
        ServerError::BadRequest(INVALID_JSON_MESSAGE.to_string())
    })?;
    let chat_id = service
        .import_chat(text)
        .await
        .map_err(|e| ServerError::from_report(e, "Failed to import chat. Please try again."))?;
    Ok((StatusCode::CREATED, Json(ImportResponse { chat_id })))
}

async fn sample() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", SAMPLE_FILE_NAME),
            ),
        ],
        sample_json(),
    )
}
