#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;

use serde::{Deserialize, Serialize};

use crate::{config::constants::NEW_CHAT_TITLE, models::Message};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    id: String,
    title: String,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    messages: Vec<Message>,
}

impl Chat {
    pub fn new(title: impl Into<String>) -> Self {
        Self::default().with_title(title)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_created_at(mut self, timestamp: chrono::DateTime<chrono::Utc>) -> Self {
        self.created_at = timestamp;
        if self.updated_at.is_none() {
            self.updated_at = Some(timestamp);
        }
        self
    }

    pub fn with_updated_at(mut self, timestamp: chrono::DateTime<chrono::Utc>) -> Self {
        self.updated_at = Some(timestamp);
        self
    }

    /// Attach messages. The chat id of every message is overwritten and the
    /// list is kept ordered by creation time; equal timestamps keep their
    /// relative order.
    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = messages
            .into_iter()
            .map(|m| m.with_chat_id(&self.id))
            .collect();
        self.messages.sort_by_key(|m| m.created_at());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn created_at(&self) -> chrono::DateTime<chrono::Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> chrono::DateTime<chrono::Utc> {
        self.updated_at.unwrap_or(self.created_at)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }
}

impl Default for Chat {
    fn default() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: NEW_CHAT_TITLE.to_string(),
            created_at: chrono::Utc::now(),
            updated_at: None,
            messages: vec![],
        }
    }
}
