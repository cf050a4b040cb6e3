//! Best-effort chat history import.
//!
//! Any JSON value is accepted: [`format`] works out which layout the payload
//! uses and pulls a title and a raw message list out of it, then
//! [`sanitizer`] coerces every message into a valid `{role, content}` turn.
//! Only malformed JSON is reported as an error; everything after parsing
//! always succeeds.

#[cfg(test)]
#[path = "importer_test.rs"]
mod tests;

pub mod format;
pub mod sanitizer;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::models::{ChatTurn, Role};

pub use format::{PayloadShape, RawImport, RawMessage};

pub const INVALID_JSON_MESSAGE: &str =
    "Invalid JSON format. Please ensure your data is valid JSON.";

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Please enter JSON data")]
    Empty,

    #[error("{}", INVALID_JSON_MESSAGE)]
    InvalidJson(#[from] serde_json::Error),
}

/// Canonical form of an imported chat. Always holds at least one message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatImport {
    pub title: String,
    pub messages: Vec<ChatTurn>,
}

pub fn parse_payload(text: &str) -> Result<Value, ImportError> {
    if text.trim().is_empty() {
        return Err(ImportError::Empty);
    }
    Ok(serde_json::from_str(text)?)
}

pub fn normalize(value: &Value) -> ChatImport {
    let raw = format::adapt(value);
    let messages = sanitizer::sanitize(raw.messages);
    log::debug!(
        "normalized import \"{}\" with {} messages",
        raw.title,
        messages.len()
    );
    ChatImport {
        title: raw.title,
        messages,
    }
}

/// Parse and normalize in one step.
pub fn normalize_text(text: &str) -> Result<ChatImport, ImportError> {
    let value = parse_payload(text)?;
    Ok(normalize(&value))
}

pub const SAMPLE_FILE_NAME: &str = "sample-chat.json";

/// A small canonical payload, handy for trying the importer end to end.
pub fn sample_payload() -> ChatImport {
    ChatImport {
        title: "Sample Chat".to_string(),
        messages: vec![
            ChatTurn::new(Role::User, "Hello, how are you?"),
            ChatTurn::new(
                Role::Assistant,
                "I'm doing well, thank you for asking! How can I help you today?",
            ),
            ChatTurn::new(Role::User, "Can you tell me about the weather?"),
            ChatTurn::new(
                Role::Assistant,
                "I don't have real-time weather data, but I'd be happy to discuss weather patterns or help you find a weather service!",
            ),
        ],
    }
}

pub fn sample_json() -> String {
    serde_json::to_string_pretty(&sample_payload()).unwrap_or_default()
}
