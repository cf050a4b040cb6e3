//! HTTP API.
//!
//! [`router`] wires every route onto a shared [`ChatService`]; [`serve`]
//! runs it until the given token is cancelled.

#[cfg(test)]
#[path = "server_test.rs"]
mod tests;

pub mod error;
mod routes;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use eyre::{Context, Result};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::config::constants::MAX_BODY_BYTES;
use crate::service::ChatService;

pub use error::ServerError;

pub fn router(service: ChatService) -> Router {
    Router::new()
        .merge(routes::health::router())
        .nest(
            "/api",
            Router::new()
                .merge(routes::chats::router())
                .merge(routes::import::router()),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(service)
}

pub async fn serve(service: ChatService, listen: &str, token: CancellationToken) -> Result<()> {
    let listener = TcpListener::bind(listen)
        .await
        .wrap_err(format!("binding {}", listen))?;
    serve_with_listener(listener, service, token).await
}

pub async fn serve_with_listener(
    listener: TcpListener,
    service: ChatService,
    token: CancellationToken,
) -> Result<()> {
    let addr = listener.local_addr().wrap_err("getting local address")?;
    log::info!("Listening on http://{}", addr);

    axum::serve(listener, router(service))
        .with_graceful_shutdown(async move {
            token.cancelled().await;
            log::info!("Shutting down server");
        })
        .await
        .wrap_err("serving http")?;
    Ok(())
}
