use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::importer::ImportError;
use crate::service::ServiceError;

/// Error returned by every handler. Rendered as `{"error": "..."}`.
///
/// Internal failures keep the full report for the log; the client only
/// sees the fixed public message.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    Internal {
        message: String,
        report: eyre::Report,
    },
}

impl ServerError {
    /// Classify a service error. Anything unrecognised becomes an internal
    /// error reported to the client as `message`.
    pub fn from_report(err: eyre::Report, message: &str) -> Self {
        if let Some(import_err) = err.downcast_ref::<ImportError>() {
            return ServerError::BadRequest(import_err.to_string());
        }

        let kind = err.downcast_ref::<ServiceError>().cloned();
        match kind {
            Some(ServiceError::InvalidRequest) => {
                ServerError::BadRequest(ServiceError::InvalidRequest.to_string())
            }
            Some(ServiceError::StoreMessage) => ServerError::Internal {
                message: ServiceError::StoreMessage.to_string(),
                report: err,
            },
            None => ServerError::Internal {
                message: message.to_string(),
                report: err,
            },
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        if let ServerError::Internal { message, report } = &self {
            log::error!("{}: {:#}", message, report);
        }
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
