#[cfg(test)]
#[path = "openrouter_test.rs"]
mod tests;

use crate::backend::Backend;
use crate::config::{BackendConfig, user_agent};
use crate::models::{BackendPrompt, BackendResponse, BackendUsage, ChatTurn, Role};
use async_trait::async_trait;
use eyre::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::time;
use thiserror::Error;

pub struct OpenRouter {
    alias: String,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    timeout: Option<time::Duration>,
    referer: Option<String>,
    app_title: Option<String>,
}

#[async_trait]
impl Backend for OpenRouter {
    fn name(&self) -> &str {
        &self.alias
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    async fn get_completion(&self, prompt: BackendPrompt) -> Result<BackendResponse> {
        let token = match &self.api_key {
            Some(token) => token,
            None => bail!("API key not configured. Please add the API_KEY environment variable."),
        };

        let model = if prompt.model().is_empty() {
            self.model.as_str()
        } else {
            prompt.model()
        };

        let completion_req = CompletionRequest {
            model: model.to_string(),
            messages: prompt.messages().iter().map(MessageRequest::from).collect(),
            stream: false,
        };

        let mut req = reqwest::Client::new()
            .post(format!("{}/v1/chat/completions", self.endpoint))
            .header("Content-Type", "application/json")
            .header("User-Agent", user_agent())
            .bearer_auth(token);

        if let Some(referer) = &self.referer {
            req = req.header("HTTP-Referer", referer);
        }

        if let Some(title) = &self.app_title {
            req = req.header("X-Title", title);
        }

        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }

        log::trace!("Sending completion request: {:?}", completion_req);

        let res = req
            .json(&completion_req)
            .send()
            .await
            .wrap_err("sending completion request")?;

        if !res.status().is_success() {
            let http_code = res.status().as_u16();
            let resp = res.text().await.wrap_err("reading error response")?;
            log::error!("Error response ({}): {}", http_code, resp);
            let message = match serde_json::from_str::<ErrorResponse>(&resp) {
                Ok(err) => err.error.message,
                Err(_) => resp,
            };
            return Err(BackendError { http_code, message }.into());
        }

        let resp = res.text().await.wrap_err("reading completion response")?;
        log::trace!("Completion response: {}", resp);
        let data = serde_json::from_str::<CompletionResponse>(&resp)
            .wrap_err(format!("parsing completion response: {}", resp))?;

        let choice = match data.choices.into_iter().next() {
            Some(c) => c,
            None => bail!("completion response has no choices"),
        };

        let role = choice
            .message
            .role
            .as_deref()
            .and_then(Role::parse)
            .unwrap_or(Role::Assistant);

        Ok(BackendResponse {
            id: data.id,
            model: data.model.unwrap_or_else(|| model.to_string()),
            role,
            content: choice.message.content.unwrap_or_default(),
            usage: data.usage.map(|u| BackendUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
        })
    }
}

impl From<&BackendConfig> for OpenRouter {
    fn from(value: &BackendConfig) -> Self {
        let mut backend = OpenRouter::default()
            .with_endpoint(&value.endpoint)
            .with_model(&value.model);

        backend.api_key = value.api_key();
        backend.timeout = value.timeout();
        backend.referer = value.referer.clone();
        backend.app_title = value.app_title.clone();
        backend
    }
}

impl OpenRouter {
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = Some(api_key.to_string());
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_referer(mut self, referer: &str) -> Self {
        self.referer = Some(referer.to_string());
        self
    }

    pub fn with_app_title(mut self, title: &str) -> Self {
        self.app_title = Some(title.to_string());
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn timeout(&self) -> Option<time::Duration> {
        self.timeout
    }
}

impl Default for OpenRouter {
    fn default() -> Self {
        let config = BackendConfig::default();
        Self {
            alias: "OpenRouter".to_string(),
            endpoint: config.endpoint,
            api_key: None,
            model: config.model,
            timeout: None,
            referer: config.referer,
            app_title: config.app_title,
        }
    }
}

#[derive(Default, Debug, Clone, Serialize, Deserialize)]
struct MessageRequest {
    role: String,
    content: String,
}

#[derive(Default, Debug, Serialize, Deserialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<MessageRequest>,
    stream: bool,
}

#[derive(Default, Debug, Serialize, Deserialize)]
struct CompletionMessageResponse {
    role: Option<String>,
    content: Option<String>,
}

#[derive(Default, Debug, Serialize, Deserialize)]
struct CompletionChoiceResponse {
    message: CompletionMessageResponse,
    finish_reason: Option<String>,
}

#[derive(Default, Debug, Serialize, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    id: String,
    model: Option<String>,
    choices: Vec<CompletionChoiceResponse>,
    usage: Option<CompletionUsageResponse>,
}

#[derive(Default, Debug, Serialize, Deserialize)]
struct CompletionUsageResponse {
    prompt_tokens: usize,
    completion_tokens: usize,
    total_tokens: usize,
}

#[derive(Default, Debug, Serialize, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Default, Debug, Serialize, Deserialize)]
struct ErrorBody {
    message: String,
    code: Option<serde_json::Value>,
}

#[derive(Default, Error, Debug, Clone, PartialEq)]
#[error("OpenRouter error ({http_code}): {message}")]
pub struct BackendError {
    pub http_code: u16,
    pub message: String,
}

impl BackendError {
    pub fn is_unauthorized(&self) -> bool {
        self.http_code == 401
    }
}

impl From<&ChatTurn> for MessageRequest {
    fn from(turn: &ChatTurn) -> Self {
        Self {
            role: turn.role.as_str().to_string(),
            content: turn.content.clone(),
        }
    }
}
