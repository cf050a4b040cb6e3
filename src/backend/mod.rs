pub mod openrouter;

pub use openrouter::{BackendError, OpenRouter};

#[cfg(test)]
use mockall::automock;

use crate::{
    config::BackendConfig,
    models::{BackendPrompt, BackendResponse},
};
use async_trait::async_trait;
use eyre::Result;
use std::sync::Arc;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Backend {
    fn name(&self) -> &str;
    fn default_model(&self) -> &str;
    /// Whether credentials are available for the remote API.
    fn has_api_key(&self) -> bool;
    async fn get_completion(&self, prompt: BackendPrompt) -> Result<BackendResponse>;
}

pub type ArcBackend = Arc<dyn Backend + Send + Sync>;

pub fn new_backend(config: &BackendConfig) -> ArcBackend {
    let backend = OpenRouter::from(config);
    if !backend.has_api_key() {
        log::warn!("No api key configured, completion requests will fail");
    }
    log::debug!(
        "Using completion endpoint {} with model {}",
        backend.endpoint(),
        backend.default_model()
    );
    Arc::new(backend)
}

/// Find a `BackendError` anywhere in the report's chain.
pub fn backend_error(err: &eyre::Report) -> Option<&BackendError> {
    err.chain().find_map(|e| e.downcast_ref::<BackendError>())
}

/// True when the remote API rejected our credentials.
pub fn is_unauthorized(err: &eyre::Report) -> bool {
    backend_error(err).is_some_and(BackendError::is_unauthorized)
}
