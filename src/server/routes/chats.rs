use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Chat, ChatTurn, FilterChat, Message, TimeRange};
use crate::server::ServerError;
use crate::service::{ChatService, Reply, ServiceError};

pub fn router() -> Router<ChatService> {
    Router::new()
        .route("/chats", get(list_chats).post(create_chat))
        .route("/chats/{id}", get(get_chat).delete(delete_chat))
        .route("/chat", post(send_message))
}

/// `GET /api/chats` query string. Times are RFC 3339.
#[derive(Debug, Default, Deserialize)]
struct ListChatsQuery {
    title: Option<String>,
    /// Substring of any message in the chat
    q: Option<String>,
    created_from: Option<DateTime<Utc>>,
    created_to: Option<DateTime<Utc>>,
    updated_from: Option<DateTime<Utc>>,
    updated_to: Option<DateTime<Utc>>,
}

impl From<ListChatsQuery> for FilterChat {
    fn from(query: ListChatsQuery) -> Self {
        let mut filter = FilterChat::default()
            .with_created(TimeRange::new(query.created_from, query.created_to))
            .with_updated(TimeRange::new(query.updated_from, query.updated_to));
        if let Some(title) = query.title.filter(|t| !t.is_empty()) {
            filter = filter.with_title(title);
        }
        if let Some(text) = query.q.filter(|t| !t.is_empty()) {
            filter = filter.with_message_contains(text);
        }
        filter
    }
}

#[derive(Debug, Default, Deserialize)]
struct CreateChatRequest {
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SendMessageRequest {
    #[serde(rename = "chatId", alias = "chat_id")]
    chat_id: String,
    messages: Vec<ChatTurn>,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    id: String,
    title: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct ChatDetailResponse {
    chat: ChatResponse,
    messages: Vec<Message>,
}

impl From<&Chat> for ChatResponse {
    fn from(chat: &Chat) -> Self {
        Self {
            id: chat.id().to_string(),
            title: chat.title().to_string(),
            created_at: chat.created_at(),
            updated_at: chat.updated_at(),
        }
    }
}

async fn list_chats(
    State(service): State<ChatService>,
    query: Result<Query<ListChatsQuery>, QueryRejection>,
) -> Result<Json<Vec<ChatResponse>>, ServerError> {
    let Query(query) = query.map_err(|e| ServerError::BadRequest(e.body_text()))?;
    let chats = service
        .list_chats(FilterChat::from(query))
        .await
        .map_err(|e| ServerError::from_report(e, "Failed to list chats"))?;
    Ok(Json(chats.iter().map(ChatResponse::from).collect()))
}

/// The body is optional; an empty one creates a chat with the default title.
async fn create_chat(
    State(service): State<ChatService>,
    body: Bytes,
) -> Result<(StatusCode, Json<ChatResponse>), ServerError> {
    let req = if body.iter().all(u8::is_ascii_whitespace) {
        CreateChatRequest::default()
    } else {
        serde_json::from_slice::<CreateChatRequest>(&body)
            .map_err(|_| ServerError::BadRequest(ServiceError::InvalidRequest.to_string()))?
    };

    let chat = service
        .create_chat(req.title.as_deref())
        .await
        .map_err(|e| ServerError::from_report(e, "Failed to create chat"))?;
    Ok((StatusCode::CREATED, Json(ChatResponse::from(&chat))))
}

async fn get_chat(
    State(service): State<ChatService>,
    Path(id): Path<String>,
) -> Result<Json<ChatDetailResponse>, ServerError> {
    let chat = service
        .get_chat(&id)
        .await
        .map_err(|e| ServerError::from_report(e, "Failed to get chat"))?
        .ok_or_else(|| ServerError::NotFound("Chat not found".to_string()))?;

    Ok(Json(ChatDetailResponse {
        chat: ChatResponse::from(&chat),
        messages: chat.into_messages(),
    }))
}

async fn delete_chat(
    State(service): State<ChatService>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServerError> {
    let deleted = service
        .delete_chat(&id)
        .await
        .map_err(|e| ServerError::from_report(e, "Failed to delete chat"))?;
    if !deleted {
        return Err(ServerError::NotFound("Chat not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn send_message(
    State(service): State<ChatService>,
    body: Bytes,
) -> Result<Json<Reply>, ServerError> {
    let req = serde_json::from_slice::<SendMessageRequest>(&body).map_err(|e| {
        log::debug!("Rejecting chat request: {}", e);
        ServerError::BadRequest(ServiceError::InvalidRequest.to_string())
    })?;

    let reply = service
        .send_message(&req.chat_id, req.messages)
        .await
        .map_err(|e| ServerError::from_report(e, "Failed to process chat request"))?;
    Ok(Json(reply))
}
