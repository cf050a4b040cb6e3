#[cfg(test)]
#[path = "sqlite_test.rs"]
mod tests;

use async_trait::async_trait;
use eyre::{Context, Result, bail};
use tokio_rusqlite::{Connection, OpenFlags, ToSql, named_params, params};

use crate::models::{Chat, FilterChat, Message, Role, TimeRange};
use crate::storage::Storage;

use super::migration::MIGRATION;

pub struct Sqlite {
    conn: Connection,
}

impl Sqlite {
    pub async fn new(path: Option<&str>) -> Result<Self> {
        let conn = match path {
            Some(path) => {
                if let Some(dir) = std::path::Path::new(path).parent() {
                    std::fs::create_dir_all(dir)
                        .wrap_err(format!("creating directory {}", dir.display()))?;
                }
                Connection::open_with_flags(
                    path,
                    OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
                )
                .await
                .wrap_err(format!("opening database path: {}", path))?
            }
            None => Connection::open_in_memory()
                .await
                .wrap_err("opening in-memory database")?,
        };

        let ret = Self { conn };
        ret.run_migration().await.wrap_err("running migration")?;
        Ok(ret)
    }

    async fn run_migration(&self) -> Result<()> {
        self.conn
            .call(|conn| Ok(conn.execute_batch(MIGRATION)?))
            .await
            .wrap_err("executing migration")?;
        Ok(())
    }
}

#[async_trait]
impl Storage for Sqlite {
    async fn get_chat(&self, id: &str) -> Result<Option<Chat>> {
        let chat = self
            .get_chats(FilterChat::default().with_id(id))
            .await
            .wrap_err("getting chat")?
            .into_iter()
            .next();

        let chat = match chat {
            Some(chat) => chat,
            None => return Ok(None),
        };
        let messages = self.get_messages(chat.id()).await?;
        Ok(Some(chat.with_messages(messages)))
    }

    async fn get_chats(&self, filter: FilterChat) -> Result<Vec<Chat>> {
        let chats = self
            .conn
            .call(move |conn| {
                let (query, params) = filter_to_query(&filter);
                let mut stmt = conn.prepare(&query)?;
                let params: Vec<(&str, &dyn ToSql)> =
                    params.iter().map(|(n, v)| (*n, v.as_ref())).collect();
                let mut rows = stmt.query(params.as_slice())?;

                let mut chats = vec![];
                while let Some(row) = rows.next()? {
                    let id: String = row.get(0)?;
                    let title: String = row.get(1)?;
                    let created_at: i64 = row.get(2)?;
                    let created_at = chrono::DateTime::from_timestamp_millis(created_at).ok_or(
                        tokio_rusqlite::Error::Other(eyre::eyre!("invalid created_at").into()),
                    )?;
                    let updated_at: i64 = row.get(3)?;
                    let updated_at = chrono::DateTime::from_timestamp_millis(updated_at).ok_or(
                        tokio_rusqlite::Error::Other(eyre::eyre!("invalid updated_at").into()),
                    )?;

                    chats.push(
                        Chat::default()
                            .with_id(id)
                            .with_title(title)
                            .with_created_at(created_at)
                            .with_updated_at(updated_at),
                    );
                }
                Ok(chats)
            })
            .await
            .wrap_err("querying chats")?;
        Ok(chats)
    }

    async fn get_messages(&self, chat_id: &str) -> Result<Vec<Message>> {
        let chat_id = chat_id.to_string();
        let messages = self.conn.call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, chat_id, role, content, created_at FROM messages WHERE chat_id = ? ORDER BY created_at ASC, rowid ASC",
            )?;

            let mut rows = stmt.query(params![chat_id])?;
            let mut messages = vec![];
            while let Some(row) = rows.next()? {
                let id: String = row.get(0)?;
                let chat_id: String = row.get(1)?;
                let role: String = row.get(2)?;
                let content: String = row.get(3)?;
                let created_at: i64 = row.get(4)?;

                let role = Role::parse(&role).ok_or(tokio_rusqlite::Error::Other(
                    eyre::eyre!("invalid role {}", role).into(),
                ))?;
                let created_at = chrono::DateTime::from_timestamp_millis(created_at).ok_or(
                    tokio_rusqlite::Error::Other(eyre::eyre!("invalid timestamp").into()),
                )?;

                messages.push(
                    Message::new(role, content)
                        .with_id(id)
                        .with_chat_id(chat_id)
                        .with_created_at(created_at),
                );
            }
            Ok(messages)
        })
        .await
        .wrap_err("querying messages")?;
        Ok(messages)
    }

    async fn create_chat(&self, chat: Chat) -> Result<()> {
        self.conn
            .call(move |conn| {
                Ok(conn.execute(
                    r#"INSERT INTO chats (id, title, created_at, updated_at)
                VALUES (:id, :title, :created_at, :updated_at)"#,
                    named_params! {
                        ":id": chat.id(),
                        ":title": chat.title(),
                        ":created_at": chat.created_at().timestamp_millis(),
                        ":updated_at": chat.updated_at().timestamp_millis(),
                    },
                )?)
            })
            .await
            .wrap_err("inserting chat")?;
        Ok(())
    }

    async fn touch_chat(&self, id: &str, at: chrono::DateTime<chrono::Utc>) -> Result<()> {
        let chat_id = id.to_string();
        let affected_rows = self
            .conn
            .call(move |conn| {
                Ok(conn.execute(
                    "UPDATE chats SET updated_at = ? WHERE id = ?",
                    params![at.timestamp_millis(), chat_id],
                )?)
            })
            .await
            .wrap_err("updating chat")?;

        if affected_rows == 0 {
            bail!("no chat with id {}", id);
        }
        Ok(())
    }

    async fn delete_chat(&self, id: &str) -> Result<bool> {
        let id = id.to_string();
        let affected_rows = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let affected = tx.execute("DELETE FROM chats WHERE id = ?", params![id])?;
                tx.commit()?;
                Ok(affected)
            })
            .await
            .wrap_err("deleting chat")?;
        Ok(affected_rows > 0)
    }

    async fn add_messages(&self, chat_id: &str, messages: &[Message]) -> Result<()> {
        let chat_id = chat_id.to_string();
        let messages = messages.to_vec();
        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                for message in messages {
                    tx.execute(
                        r#"INSERT INTO messages (id, chat_id, role, content, created_at)
            VALUES (:id, :chat_id, :role, :content, :created_at)"#,
                        named_params! {
                            ":id": message.id(),
                            ":chat_id": chat_id,
                            ":role": message.role().as_str(),
                            ":content": message.content(),
                            ":created_at": message.created_at().timestamp_millis(),
                        },
                    )?;
                }
                Ok(tx.commit()?)
            })
            .await
            .wrap_err("inserting messages")?;
        Ok(())
    }
}

type NamedParams = Vec<(&'static str, Box<dyn ToSql>)>;

fn filter_to_query(filter: &FilterChat) -> (String, NamedParams) {
    let mut conditions: Vec<&'static str> = vec![];
    let mut params: NamedParams = vec![];

    if let Some(id) = filter.id() {
        conditions.push("id = :id");
        params.push((":id", Box::new(id.to_string())));
    }

    if let Some(title) = filter.title() {
        conditions.push("title LIKE :title");
        params.push((":title", Box::new(format!("%{}%", title))));
    }

    if let Some(text) = filter.message_contains() {
        conditions.push(
            "EXISTS (SELECT 1 FROM messages WHERE chat_id = chats.id AND content LIKE :message_contains)",
        );
        params.push((":message_contains", Box::new(format!("%{}%", text))));
    }

    push_range(
        &mut conditions,
        &mut params,
        filter.created(),
        ("created_at >= :created_from", ":created_from"),
        ("created_at <= :created_to", ":created_to"),
    );
    push_range(
        &mut conditions,
        &mut params,
        filter.updated(),
        ("updated_at >= :updated_from", ":updated_from"),
        ("updated_at <= :updated_to", ":updated_to"),
    );

    let mut query = String::from("SELECT id, title, created_at, updated_at FROM chats");
    if !conditions.is_empty() {
        query.push_str(" WHERE ");
        query.push_str(&conditions.join(" AND "));
    }
    query.push_str(" ORDER BY updated_at DESC, created_at DESC");
    (query, params)
}

fn push_range(
    conditions: &mut Vec<&'static str>,
    params: &mut NamedParams,
    range: TimeRange,
    lower: (&'static str, &'static str),
    upper: (&'static str, &'static str),
) {
    if range.is_open() {
        return;
    }
    if let Some(from) = range.from {
        conditions.push(lower.0);
        params.push((lower.1, Box::new(from.timestamp_millis())));
    }
    if let Some(to) = range.to {
        conditions.push(upper.0);
        params.push((upper.1, Box::new(to.timestamp_millis())));
    }
}
