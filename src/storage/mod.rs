pub mod bridge;
pub mod sqlite;

use std::sync::Arc;

use crate::{
    config::{
        StorageConfig,
        constants::{DEFAULT_DB_PATH, IN_MEMORY_DB},
        resolve_path,
    },
    models::{Chat, FilterChat, Message},
};
use async_trait::async_trait;
use eyre::{Context, Result};
use sqlite::Sqlite;

pub use bridge::create_chat_with_messages;

#[cfg(test)]
use mockall::automock;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Storage {
    /// Fetch a chat together with its messages.
    async fn get_chat(&self, id: &str) -> Result<Option<Chat>>;
    /// Chats matching `filter`, most recently updated first. Messages are
    /// not loaded.
    async fn get_chats(&self, filter: FilterChat) -> Result<Vec<Chat>>;
    async fn get_messages(&self, chat_id: &str) -> Result<Vec<Message>>;
    async fn create_chat(&self, chat: Chat) -> Result<()>;
    async fn touch_chat(&self, id: &str, at: chrono::DateTime<chrono::Utc>) -> Result<()>;
    /// Returns false when no chat had the given id.
    async fn delete_chat(&self, id: &str) -> Result<bool>;
    /// Insert all messages or none of them.
    async fn add_messages(&self, chat_id: &str, messages: &[Message]) -> Result<()>;
}

pub type ArcStorage = Arc<dyn Storage + Send + Sync>;

pub async fn new_storage(config: &StorageConfig) -> Result<ArcStorage> {
    let storage = match config {
        StorageConfig::Sqlite(sqlite_config) => {
            let path = match sqlite_config.path.as_deref().unwrap_or(DEFAULT_DB_PATH) {
                IN_MEMORY_DB => None,
                path => Some(
                    resolve_path(path).wrap_err(format!("resolving database path {}", path))?,
                ),
            };
            log::debug!("Opening sqlite database {}", path.as_deref().unwrap_or(IN_MEMORY_DB));
            Arc::new(Sqlite::new(path.as_deref()).await?)
        }
    };
    Ok(storage)
}
