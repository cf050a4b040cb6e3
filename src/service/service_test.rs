use std::sync::{Arc, Mutex};

use super::*;
use crate::backend::{BackendError, MockBackend};
use crate::importer::ImportError;
use crate::models::{BackendResponse, BackendUsage};
use crate::storage::{MockStorage, Storage, sqlite::Sqlite};

fn completion(content: &str) -> BackendResponse {
    BackendResponse {
        id: "gen-1".to_string(),
        model: "test/model".to_string(),
        role: Role::Assistant,
        content: content.to_string(),
        usage: None,
    }
}

fn mock_backend() -> MockBackend {
    let mut backend = MockBackend::new();
    backend.expect_name().return_const("Mock".to_string());
    backend
        .expect_default_model()
        .return_const("test/model".to_string());
    backend
}

fn backend_replying(content: &'static str) -> ArcBackend {
    let mut backend = mock_backend();
    backend
        .expect_get_completion()
        .returning(move |_| Ok(completion(content)));
    Arc::new(backend)
}

async fn sqlite() -> Arc<Sqlite> {
    Arc::new(Sqlite::new(None).await.unwrap())
}

#[tokio::test]
async fn test_create_chat_default_title() {
    let db = sqlite().await;
    let service = ChatService::new(db.clone(), backend_replying("unused"));

    let chat = service.create_chat(None).await.unwrap();
    assert_eq!(chat.title(), "New Chat");
    let chat = service.create_chat(Some("  ")).await.unwrap();
    assert_eq!(chat.title(), "New Chat");
    let chat = service.create_chat(Some("Trip plans")).await.unwrap();
    assert_eq!(chat.title(), "Trip plans");

    assert_eq!(service.list_chats(FilterChat::default()).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_delete_chat() {
    let db = sqlite().await;
    let service = ChatService::new(db.clone(), backend_replying("unused"));
    let chat = service.create_chat(None).await.unwrap();

    assert!(service.delete_chat(chat.id()).await.unwrap());
    assert!(!service.delete_chat(chat.id()).await.unwrap());
    assert!(service.get_chat(chat.id()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_import_chat() {
    let db = sqlite().await;
    let service = ChatService::new(db.clone(), backend_replying("unused"));

    let chat_id = service
        .import_chat(r#"[{"sender":"human","text":"hi"},{"sender":"bot","text":"hello"}]"#)
        .await
        .unwrap();

    let chat = service.get_chat(&chat_id).await.unwrap().unwrap();
    assert!(chat.title().starts_with("Imported Chat "));
    let turns = chat.messages().iter().map(ChatTurn::from).collect::<Vec<_>>();
    assert_eq!(
        turns,
        vec![ChatTurn::user("hi"), ChatTurn::assistant("hello")]
    );
}

#[tokio::test]
async fn test_import_chat_invalid_json_writes_nothing() {
    let mut storage = MockStorage::new();
    storage.expect_create_chat().never();
    storage.expect_add_messages().never();
    let service = ChatService::new(Arc::new(storage), backend_replying("unused"));

    let err = service.import_chat("{not json").await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ImportError>(),
        Some(ImportError::InvalidJson(_))
    ));

    let err = service.import_chat("   ").await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ImportError>(),
        Some(ImportError::Empty)
    ));
}

#[tokio::test]
async fn test_import_chat_rolls_back_on_message_failure() {
    let created = Arc::new(Mutex::new(String::new()));

    let mut storage = MockStorage::new();
    let created_clone = created.clone();
    storage.expect_create_chat().times(1).returning(move |chat| {
        *created_clone.lock().unwrap() = chat.id().to_string();
        Ok(())
    });
    storage
        .expect_add_messages()
        .times(1)
        .returning(|_, _| Err(eyre::eyre!("disk I/O error")));
    let created_clone = created.clone();
    storage
        .expect_delete_chat()
        .times(1)
        .withf(move |id| *created_clone.lock().unwrap() == id)
        .returning(|_| Ok(true));

    let service = ChatService::new(Arc::new(storage), backend_replying("unused"));
    let err = service
        .import_chat(r#"{"title":"T","messages":[{"role":"user","content":"x"}]}"#)
        .await
        .unwrap_err();
    assert!(format!("{:#}", err).contains("disk I/O error"));
}

#[tokio::test]
async fn test_send_message() {
    let db = sqlite().await;
    let mut backend = mock_backend();
    backend
        .expect_get_completion()
        .times(1)
        .withf(|prompt| {
            prompt.model() == "test/model"
                && prompt.messages()
                    == [
                        ChatTurn::user("hi"),
                        ChatTurn::assistant("hello"),
                        ChatTurn::user("how are you?"),
                    ]
        })
        .returning(|_| Ok(completion("fine, thanks")));
    let service = ChatService::new(db.clone(), Arc::new(backend));

    let chat = Chat::new("Talk").with_created_at(Utc::now() - chrono::Duration::hours(1));
    db.create_chat(chat.clone()).await.unwrap();

    let reply = service
        .send_message(
            chat.id(),
            vec![
                ChatTurn::user("hi"),
                ChatTurn::assistant("hello"),
                ChatTurn::user("how are you?"),
            ],
        )
        .await
        .unwrap();

    assert!(reply.error.is_none());
    assert!(!reply.is_fallback());
    assert_eq!(reply.message.role, Role::Assistant);
    assert_eq!(reply.message.content, "fine, thanks");

    let stored = db.get_chat(chat.id()).await.unwrap().unwrap();
    let turns = stored
        .messages()
        .iter()
        .map(ChatTurn::from)
        .collect::<Vec<_>>();
    assert_eq!(
        turns,
        vec![
            ChatTurn::user("how are you?"),
            ChatTurn::assistant("fine, thanks")
        ]
    );
    assert_eq!(stored.messages()[1].id(), reply.message.id);
    assert!(stored.updated_at() > chat.updated_at());
}

#[tokio::test]
async fn test_send_message_invalid_request() {
    let mut backend = mock_backend();
    backend.expect_get_completion().never();
    let service = ChatService::new(sqlite().await, Arc::new(backend));

    let err = service.send_message("chat", vec![]).await.unwrap_err();
    assert_eq!(
        err.downcast_ref::<ServiceError>(),
        Some(&ServiceError::InvalidRequest)
    );

    let err = service
        .send_message("", vec![ChatTurn::user("hi")])
        .await
        .unwrap_err();
    assert_eq!(
        err.downcast_ref::<ServiceError>(),
        Some(&ServiceError::InvalidRequest)
    );
}

#[tokio::test]
async fn test_send_message_unauthorized_falls_back() {
    let mut backend = mock_backend();
    backend.expect_get_completion().returning(|_| {
        Err(BackendError {
            http_code: 401,
            message: "No auth credentials found".to_string(),
        }
        .into())
    });

    let mut storage = MockStorage::new();
    storage.expect_add_messages().never();
    storage.expect_touch_chat().never();

    let service = ChatService::new(Arc::new(storage), Arc::new(backend));
    let reply = service
        .send_message("chat", vec![ChatTurn::user("hi")])
        .await
        .unwrap();

    assert!(reply.is_fallback());
    assert_eq!(reply.message.id, "fallback");
    assert_eq!(reply.message.role, Role::Assistant);
    assert_eq!(
        reply.message.content,
        "I'm sorry, but there was an issue connecting to the AI service. Please check your API key configuration."
    );
    assert_eq!(
        reply.error.as_deref(),
        Some("Authentication failed with OpenRouter. Please check your API_KEY environment variable.")
    );
}

#[tokio::test]
async fn test_send_message_backend_failure_propagates() {
    let mut backend = mock_backend();
    backend.expect_get_completion().returning(|_| {
        Err(BackendError {
            http_code: 500,
            message: "boom".to_string(),
        }
        .into())
    });

    let mut storage = MockStorage::new();
    storage.expect_add_messages().never();

    let service = ChatService::new(Arc::new(storage), Arc::new(backend));
    let err = service
        .send_message("chat", vec![ChatTurn::user("hi")])
        .await
        .unwrap_err();
    assert_eq!(
        crate::backend::backend_error(&err).map(|e| e.http_code),
        Some(500)
    );
}

#[tokio::test]
async fn test_send_message_store_reply_failure() {
    let mut storage = MockStorage::new();
    let mut calls = 0;
    storage
        .expect_add_messages()
        .times(2)
        .returning(move |_, messages| {
            calls += 1;
            assert_eq!(messages.len(), 1);
            if calls == 1 {
                // user turn: logged and ignored
                Err(eyre::eyre!("busy"))
            } else {
                Err(eyre::eyre!("readonly"))
            }
        });
    storage.expect_touch_chat().never();

    let service = ChatService::new(Arc::new(storage), backend_replying("fine"));
    let err = service
        .send_message("chat", vec![ChatTurn::user("hi")])
        .await
        .unwrap_err();
    assert_eq!(
        err.downcast_ref::<ServiceError>(),
        Some(&ServiceError::StoreMessage)
    );
    assert!(format!("{:#}", err).contains("readonly"));
}

#[tokio::test]
async fn test_send_message_touch_failure_is_not_fatal() {
    let mut storage = MockStorage::new();
    storage.expect_add_messages().times(2).returning(|_, _| Ok(()));
    storage
        .expect_touch_chat()
        .times(1)
        .returning(|_, _| Err(eyre::eyre!("no chat")));

    let service = ChatService::new(Arc::new(storage), backend_replying("fine"));
    let reply = service
        .send_message("chat", vec![ChatTurn::user("hi")])
        .await
        .unwrap();
    assert_eq!(reply.message.content, "fine");
}

#[tokio::test]
async fn test_send_message_with_usage() {
    let mut backend = mock_backend();
    backend.expect_get_completion().returning(|_| {
        Ok(BackendResponse {
            usage: Some(BackendUsage {
                prompt_tokens: 12,
                completion_tokens: 3,
                total_tokens: 15,
            }),
            ..completion("sure")
        })
    });
    let db = sqlite().await;
    let service = ChatService::new(db.clone(), Arc::new(backend));
    let chat = service.create_chat(None).await.unwrap();

    let reply = service
        .send_message(chat.id(), vec![ChatTurn::user("hi")])
        .await
        .unwrap();
    assert_eq!(reply.message.content, "sure");
    assert_eq!(db.get_messages(chat.id()).await.unwrap().len(), 2);
}
