#[cfg(test)]
#[path = "sanitizer_test.rs"]
mod tests;

use serde_json::Value;

use super::format::{RawMessage, js_value};
use crate::models::{ChatTurn, Role};

pub const NO_MESSAGES: &str = "Imported chat with no messages";

/// Turn raw messages into valid turns. Unknown roles become `user`,
/// non-string content is replaced by its JSON text, and an empty input
/// yields a single placeholder turn.
pub fn sanitize(raw: Vec<RawMessage>) -> Vec<ChatTurn> {
    let mut turns = raw.into_iter().map(sanitize_message).collect::<Vec<_>>();
    if turns.is_empty() {
        turns.push(ChatTurn::new(Role::User, NO_MESSAGES));
    }
    turns
}

pub fn sanitize_message(raw: RawMessage) -> ChatTurn {
    let role = raw.role.as_str().and_then(Role::parse).unwrap_or_default();
    let content = match raw.content {
        Value::String(s) => s,
        other => js_value(&other).to_string(),
    };
    ChatTurn::new(role, content)
}
