#[cfg(test)]
#[path = "service_test.rs"]
mod tests;

use chrono::{DateTime, Utc};
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    backend::{self, ArcBackend},
    config::constants::{AUTH_FAILED_ERROR, FALLBACK_MESSAGE, FALLBACK_MESSAGE_ID, NEW_CHAT_TITLE},
    importer,
    models::{BackendPrompt, Chat, ChatTurn, FilterChat, Message, Role},
    storage::{self, ArcStorage},
};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ServiceError {
    #[error("Invalid request body")]
    InvalidRequest,

    #[error("Failed to store message")]
    StoreMessage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Outcome of a send. `error` is only set for a degraded reply that was
/// not produced by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub message: ReplyMessage,
}

impl Reply {
    pub fn fallback() -> Self {
        Self {
            error: Some(AUTH_FAILED_ERROR.to_string()),
            message: ReplyMessage {
                id: FALLBACK_MESSAGE_ID.to_string(),
                role: Role::Assistant,
                content: FALLBACK_MESSAGE.to_string(),
                created_at: Utc::now(),
            },
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.message.id == FALLBACK_MESSAGE_ID
    }
}

impl From<&Message> for ReplyMessage {
    fn from(value: &Message) -> Self {
        Self {
            id: value.id().to_string(),
            role: value.role(),
            content: value.content().to_string(),
            created_at: value.created_at(),
        }
    }
}

#[derive(Clone)]
pub struct ChatService {
    storage: ArcStorage,
    backend: ArcBackend,
}

impl ChatService {
    pub fn new(storage: ArcStorage, backend: ArcBackend) -> Self {
        Self { storage, backend }
    }

    pub fn backend(&self) -> &ArcBackend {
        &self.backend
    }

    pub async fn create_chat(&self, title: Option<&str>) -> Result<Chat> {
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(NEW_CHAT_TITLE);
        let chat = Chat::new(title);
        self.storage
            .create_chat(chat.clone())
            .await
            .wrap_err("creating chat")?;
        log::info!("Created chat {}", chat.id());
        Ok(chat)
    }

    /// Chats matching `filter`, most recently updated first.
    pub async fn list_chats(&self, filter: FilterChat) -> Result<Vec<Chat>> {
        self.storage
            .get_chats(filter)
            .await
            .wrap_err("listing chats")
    }

    pub async fn get_chat(&self, id: &str) -> Result<Option<Chat>> {
        self.storage
            .get_chat(id)
            .await
            .wrap_err(format!("getting chat {}", id))
    }

    pub async fn delete_chat(&self, id: &str) -> Result<bool> {
        let deleted = self
            .storage
            .delete_chat(id)
            .await
            .wrap_err(format!("deleting chat {}", id))?;
        if deleted {
            log::info!("Deleted chat {}", id);
        }
        Ok(deleted)
    }

    /// Normalize an arbitrary JSON export and persist it as a new chat.
    /// Malformed input surfaces as an [`importer::ImportError`] and leaves
    /// storage untouched.
    pub async fn import_chat(&self, text: &str) -> Result<String> {
        let import = importer::normalize_text(text)?;
        let chat_id =
            storage::create_chat_with_messages(self.storage.as_ref(), &import.title, &import.messages)
                .await
                .wrap_err("importing chat")?;
        log::info!(
            "Imported chat {} \"{}\" with {} messages",
            chat_id,
            import.title,
            import.messages.len()
        );
        Ok(chat_id)
    }

    /// Ask the model for a reply to `turns`, the whole conversation so far
    /// ending with the new user turn. The new turn and the reply are stored
    /// under `chat_id`.
    pub async fn send_message(&self, chat_id: &str, turns: Vec<ChatTurn>) -> Result<Reply> {
        let last = match turns.last() {
            Some(last) if !chat_id.trim().is_empty() => last.clone(),
            _ => return Err(ServiceError::InvalidRequest.into()),
        };

        let prompt = BackendPrompt::new(turns).with_model(self.backend.default_model());
        let res = match self.backend.get_completion(prompt).await {
            Ok(res) => res,
            Err(err) if backend::is_unauthorized(&err) => {
                log::warn!("{} rejected the api key: {:#}", self.backend.name(), err);
                return Ok(Reply::fallback());
            }
            Err(err) => return Err(err.wrap_err("getting completion")),
        };
        match &res.usage {
            Some(usage) => log::debug!(
                "Got completion {} from {}, tokens: {} prompt, {} completion, {} total",
                res.id,
                res.model,
                usage.prompt_tokens,
                usage.completion_tokens,
                usage.total_tokens
            ),
            None => log::debug!("Got completion {} from {}", res.id, res.model),
        }

        let user_message = Message::new(last.role, last.content).with_chat_id(chat_id);
        if let Err(err) = self.storage.add_messages(chat_id, &[user_message]).await {
            log::warn!("Error storing user message for chat {}: {:#}", chat_id, err);
        }

        let reply = Message::new(res.role, res.content).with_chat_id(chat_id);
        if let Err(err) = self
            .storage
            .add_messages(chat_id, std::slice::from_ref(&reply))
            .await
        {
            log::error!("Error storing reply for chat {}: {:#}", chat_id, err);
            return Err(err.wrap_err(ServiceError::StoreMessage));
        }

        if let Err(err) = self.storage.touch_chat(chat_id, Utc::now()).await {
            log::warn!("Error updating chat {}: {:#}", chat_id, err);
        }

        Ok(Reply {
            error: None,
            message: ReplyMessage::from(&reply),
        })
    }
}
