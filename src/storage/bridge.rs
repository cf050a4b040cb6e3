#[cfg(test)]
#[path = "bridge_test.rs"]
mod tests;

use eyre::{Context, Result};

use crate::models::{Chat, ChatTurn, Message};
use crate::storage::Storage;

/// Create a chat and insert `turns` as its messages.
///
/// The two writes are not one transaction. When inserting the messages
/// fails the chat is deleted again so no empty chat is left behind; if
/// that delete fails as well it is only logged and the insert error is
/// returned.
pub async fn create_chat_with_messages(
    storage: &(dyn Storage + Send + Sync),
    title: &str,
    turns: &[ChatTurn],
) -> Result<String> {
    let chat = Chat::new(title);
    let chat_id = chat.id().to_string();
    let created_at = chat.created_at();

    storage
        .create_chat(chat)
        .await
        .wrap_err(format!("creating chat \"{}\"", title))?;

    if turns.is_empty() {
        return Ok(chat_id);
    }

    let messages = turns
        .iter()
        .map(|turn| {
            Message::new(turn.role, &turn.content)
                .with_chat_id(&chat_id)
                .with_created_at(created_at)
        })
        .collect::<Vec<_>>();

    if let Err(err) = storage.add_messages(&chat_id, &messages).await {
        log::error!("Error inserting messages for chat {}: {:#}", chat_id, err);
        match storage.delete_chat(&chat_id).await {
            Ok(_) => log::debug!("Removed chat {} after failed message insert", chat_id),
            Err(del_err) => log::error!(
                "Error removing chat {} after failed message insert: {:#}",
                chat_id,
                del_err
            ),
        }
        return Err(err.wrap_err(format!("inserting messages for chat {}", chat_id)));
    }

    log::debug!("Created chat {} with {} messages", chat_id, messages.len());
    Ok(chat_id)
}
