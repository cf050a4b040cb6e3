#[cfg(test)]
#[path = "format_test.rs"]
mod tests;

use serde_json::{Map, Number, Value};

use crate::models::Role;

pub const MESSAGES_KEY: &str = "messages";
pub const CONVERSATION_KEY: &str = "conversation";
pub const TITLE_KEY: &str = "title";
pub const ROLE_KEY: &str = "role";
pub const CONTENT_KEY: &str = "content";
pub const TEXT_KEY: &str = "text";
pub const MESSAGE_KEY: &str = "message";
pub const SENDER_KEY: &str = "sender";
pub const FROM_KEY: &str = "from";
pub const IS_USER_KEY: &str = "isUser";

const USER_SENDERS: [&str; 2] = ["user", "human"];
const ASSISTANT_SENDERS: [&str; 3] = ["assistant", "ai", "bot"];
const USER_KEY_MARKERS: [&str; 2] = ["user", "human"];

/// Content lookup order for flat arrays and conversation wrappers
const CONTENT_KEYS: [&str; 3] = [CONTENT_KEY, TEXT_KEY, MESSAGE_KEY];
/// Content lookup order for objects found while scanning unstructured input
const SCANNED_CONTENT_KEYS: [&str; 3] = [TEXT_KEY, CONTENT_KEY, MESSAGE_KEY];

pub const NO_CONTENT: &str = "No content provided";
pub const IMPORTED_DATA_PREFIX: &str = "Imported data: ";
pub const DEFAULT_TITLE_PREFIX: &str = "Imported Chat ";

/// Largest magnitude below which every integral f64 prints as plain digits
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// A message as extracted from the payload, before sanitizing. Missing
/// fields are `Value::Null`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMessage {
    pub role: Value,
    pub content: Value,
}

impl RawMessage {
    fn new(role: impl Into<Value>, content: impl Into<Value>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawImport {
    pub title: String,
    pub messages: Vec<RawMessage>,
}

/// The payload layouts the importer understands. `detect` tries them in
/// declaration order and the first match wins.
#[derive(Debug, PartialEq)]
pub enum PayloadShape<'a> {
    /// `{"title": .., "messages": [..]}`
    Canonical {
        title: Option<&'a Value>,
        messages: &'a [Value],
    },
    /// `[{..}, {..}]`
    FlatArray(&'a [Value]),
    /// `{"title": .., "conversation": [..]}`
    ConversationWrapper {
        title: Option<&'a Value>,
        conversation: &'a [Value],
    },
    /// Any other object with at least one property
    Unstructured(&'a Map<String, Value>),
    /// Primitives, null and `{}`
    Degenerate,
}

impl<'a> PayloadShape<'a> {
    pub fn detect(value: &'a Value) -> Self {
        if let Some(messages) = array_field(value, MESSAGES_KEY) {
            return PayloadShape::Canonical {
                title: value.get(TITLE_KEY),
                messages,
            };
        }

        if let Value::Array(items) = value {
            return PayloadShape::FlatArray(items);
        }

        if let Some(conversation) = array_field(value, CONVERSATION_KEY) {
            return PayloadShape::ConversationWrapper {
                title: value.get(TITLE_KEY),
                conversation,
            };
        }

        match value {
            Value::Object(map) if !map.is_empty() => PayloadShape::Unstructured(map),
            _ => PayloadShape::Degenerate,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PayloadShape::Canonical { .. } => "canonical",
            PayloadShape::FlatArray(_) => "flat-array",
            PayloadShape::ConversationWrapper { .. } => "conversation",
            PayloadShape::Unstructured(_) => "unstructured",
            PayloadShape::Degenerate => "degenerate",
        }
    }

    /// Extract a title and the raw message list. The list may be empty.
    pub fn extract(&self) -> RawImport {
        match self {
            PayloadShape::Canonical { title, messages } => RawImport {
                title: title_or_default(*title),
                messages: messages.iter().map(canonical_message).collect(),
            },
            PayloadShape::FlatArray(items) => RawImport {
                title: default_title(),
                messages: items.iter().map(flat_message).collect(),
            },
            PayloadShape::ConversationWrapper {
                title,
                conversation,
            } => RawImport {
                title: title_or_default(*title),
                messages: conversation.iter().map(conversation_message).collect(),
            },
            PayloadShape::Unstructured(map) => RawImport {
                title: default_title(),
                messages: scan_object(map),
            },
            PayloadShape::Degenerate => RawImport {
                title: default_title(),
                messages: vec![],
            },
        }
    }
}

/// Classify `value` and extract its title and raw messages.
pub fn adapt(value: &Value) -> RawImport {
    let shape = PayloadShape::detect(value);
    log::debug!("detected import payload shape: {}", shape.name());
    shape.extract()
}

/// `"Imported Chat "` followed by the current local time.
pub fn default_title() -> String {
    format!(
        "{}{}",
        DEFAULT_TITLE_PREFIX,
        chrono::Local::now().format("%-m/%-d/%Y, %-I:%M:%S %p")
    )
}

/// `false`, `null`, `0` and `""` are falsy, everything else is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Rebuild `value` the way a browser holds parsed JSON, so that its text
/// form matches `JSON.stringify`: integral floats lose their fraction and
/// array-index keys lead every object in ascending order.
pub fn js_value(value: &Value) -> Value {
    match value {
        Value::Number(n) => js_number(n),
        Value::Array(items) => Value::Array(items.iter().map(js_value).collect()),
        Value::Object(map) => Value::Object(
            js_entries(map)
                .into_iter()
                .map(|(key, value)| (key.clone(), js_value(value)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn js_number(n: &Number) -> Value {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() <= MAX_EXACT_INTEGER => {
            Value::from(f as i64)
        }
        _ => Value::Number(n.clone()),
    }
}

/// Canonical decimal below `u32::MAX`, e.g. `"0"` or `"42"` but not `"07"`.
fn array_index(key: &str) -> Option<u32> {
    key.parse::<u32>()
        .ok()
        .filter(|i| *i != u32::MAX && i.to_string() == key)
}

/// Object entries in property order: array indices ascending, then the
/// remaining keys as written.
fn js_entries(map: &Map<String, Value>) -> Vec<(&String, &Value)> {
    let mut indexed = vec![];
    let mut named = vec![];
    for (key, value) in map {
        match array_index(key) {
            Some(i) => indexed.push((i, key, value)),
            None => named.push((key, value)),
        }
    }
    indexed.sort_by_key(|(i, _, _)| *i);
    indexed
        .into_iter()
        .map(|(_, key, value)| (key, value))
        .chain(named)
        .collect()
}

fn array_field<'a>(value: &'a Value, key: &str) -> Option<&'a [Value]> {
    value.get(key).and_then(Value::as_array).map(Vec::as_slice)
}

fn first_truthy<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| value.get(*key))
        .find(|v| is_truthy(v))
}

fn title_or_default(title: Option<&Value>) -> String {
    match title.filter(|t| is_truthy(t)) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => js_value(other).to_string(),
        None => default_title(),
    }
}

fn sender_role(sender: &Value) -> Role {
    match sender.as_str() {
        Some(s) if USER_SENDERS.contains(&s) => Role::User,
        Some(s) if ASSISTANT_SENDERS.contains(&s) => Role::Assistant,
        _ => Role::System,
    }
}

fn canonical_message(item: &Value) -> RawMessage {
    RawMessage {
        role: item.get(ROLE_KEY).cloned().unwrap_or(Value::Null),
        content: item.get(CONTENT_KEY).cloned().unwrap_or(Value::Null),
    }
}

fn flat_message(item: &Value) -> RawMessage {
    let role = match first_truthy(item, &[ROLE_KEY]) {
        Some(role) => role.clone(),
        None => {
            let role = first_truthy(item, &[SENDER_KEY, FROM_KEY])
                .map(sender_role)
                .unwrap_or(Role::User);
            Value::from(role.as_str())
        }
    };

    let content = first_truthy(item, &CONTENT_KEYS)
        .cloned()
        .unwrap_or_else(|| Value::from(NO_CONTENT));

    RawMessage { role, content }
}

fn conversation_message(item: &Value) -> RawMessage {
    let role = match first_truthy(item, &[ROLE_KEY]) {
        Some(role) => role.clone(),
        None if first_truthy(item, &[IS_USER_KEY]).is_some() => Value::from(Role::User.as_str()),
        None => Value::from(Role::Assistant.as_str()),
    };

    let content = first_truthy(item, &CONTENT_KEYS)
        .cloned()
        .unwrap_or_else(|| Value::from(NO_CONTENT));

    RawMessage { role, content }
}

fn scan_object(map: &Map<String, Value>) -> Vec<RawMessage> {
    let mut messages = vec![];

    for (key, value) in js_entries(map) {
        match value {
            Value::String(text) if !text.is_empty() => {
                let role = if USER_KEY_MARKERS.iter().any(|m| key.contains(m)) {
                    Role::User
                } else {
                    Role::Assistant
                };
                messages.push(RawMessage::new(role.as_str(), text.as_str()));
            }
            Value::Array(items) => messages.extend(items.iter().filter_map(scan_item)),
            _ => {}
        }
    }

    if messages.is_empty() {
        let object = js_value(&Value::Object(map.clone()));
        let dump = serde_json::to_string_pretty(&object).unwrap_or_else(|_| object.to_string());
        messages.push(RawMessage::new(
            Role::User.as_str(),
            format!("{}{}", IMPORTED_DATA_PREFIX, dump),
        ));
    }

    messages
}

fn scan_item(item: &Value) -> Option<RawMessage> {
    match item {
        Value::String(text) if !text.is_empty() => {
            Some(RawMessage::new(Role::User.as_str(), text.as_str()))
        }
        Value::Object(_) => {
            let content = first_truthy(item, &SCANNED_CONTENT_KEYS)?;
            let role = first_truthy(item, &[ROLE_KEY, SENDER_KEY])
                .cloned()
                .unwrap_or_else(|| Value::from(Role::User.as_str()));
            Some(RawMessage {
                role,
                content: content.clone(),
            })
        }
        _ => None,
    }
}
