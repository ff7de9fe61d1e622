//! SQLite message repository implementation.
//!
//! Implements `MessageRepository` from `codefuse-core` using sqlx with split
//! read/write pools. `MessageRow` is also used by the conversation repository
//! to load nested messages.

use chrono::Utc;
use codefuse_core::repository::message::MessageRepository;
use codefuse_types::conversation::ConversationId;
use codefuse_types::error::RepositoryError;
use codefuse_types::message::{Message, MessageId, NewMessage};
use sqlx::Row;

use super::pool::DatabasePool;
use super::{db_error, format_datetime, parse_datetime};

/// SQLite-backed implementation of `MessageRepository`.
pub struct SqliteMessageRepository {
    pool: DatabasePool,
}

impl SqliteMessageRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row type for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

/// Internal row type for mapping SQLite rows to domain Message.
pub(super) struct MessageRow {
    id: i64,
    conversation_id: i64,
    content: String,
    is_user_message: bool,
    is_fav: bool,
    timestamp: String,
}

impl MessageRow {
    pub(super) fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            conversation_id: row.try_get("conversation_id")?,
            content: row.try_get("content")?,
            is_user_message: row.try_get("is_user_message")?,
            is_fav: row.try_get("is_fav")?,
            timestamp: row.try_get("timestamp")?,
        })
    }

    pub(super) fn into_message(self) -> Result<Message, RepositoryError> {
        Ok(Message {
            id: MessageId(self.id),
            conversation_id: ConversationId(self.conversation_id),
            content: self.content,
            is_user_message: self.is_user_message,
            is_fav: self.is_fav,
            timestamp: parse_datetime(&self.timestamp)?,
        })
    }
}

/// Map a batch of rows, failing on the first malformed one.
pub(super) fn rows_into_messages(
    rows: &[sqlx::sqlite::SqliteRow],
) -> Result<Vec<Message>, RepositoryError> {
    let mut messages = Vec::with_capacity(rows.len());
    for row in rows {
        let msg_row =
            MessageRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
        messages.push(msg_row.into_message()?);
    }
    Ok(messages)
}

// ---------------------------------------------------------------------------
// MessageRepository implementation
// ---------------------------------------------------------------------------

impl MessageRepository for SqliteMessageRepository {
    async fn list_by_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<Message>, RepositoryError> {
        // Chronological; on equal timestamps favorites come first, then
        // insertion order.
        let rows = sqlx::query(
            "SELECT * FROM messages WHERE conversation_id = ? ORDER BY timestamp ASC, is_fav DESC, id ASC",
        )
        .bind(conversation_id.0)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(db_error("message.list_by_conversation"))?;

        rows_into_messages(&rows)
    }

    async fn get(&self, id: MessageId) -> Result<Option<Message>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM messages WHERE id = ?")
            .bind(id.0)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(db_error("message.get"))?;

        match row {
            Some(row) => {
                let msg_row = MessageRow::from_row(&row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(msg_row.into_message()?))
            }
            None => Ok(None),
        }
    }

    async fn create(&self, message: &NewMessage) -> Result<Message, RepositoryError> {
        let timestamp = Utc::now();

        let result = sqlx::query(
            r#"INSERT INTO messages (conversation_id, content, is_user_message, is_fav, timestamp)
               VALUES (?, ?, ?, 0, ?)"#,
        )
        .bind(message.conversation_id.0)
        .bind(&message.content)
        .bind(message.is_user_message)
        .bind(format_datetime(&timestamp))
        .execute(&self.pool.writer)
        .await
        .map_err(db_error("message.create"))?;

        let id = MessageId(result.last_insert_rowid());
        tracing::debug!(message_id = %id, conversation_id = %message.conversation_id, "Message created");

        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    async fn update(&self, message: &Message) -> Result<Message, RepositoryError> {
        let is_fav = message.is_fav && message.can_be_favorite();
        if message.is_fav && !is_fav {
            tracing::debug!(message_id = %message.id, "Ignoring favorite flag on user message");
        }

        let result = sqlx::query(
            r#"UPDATE messages
               SET content = ?, timestamp = ?, is_user_message = ?, conversation_id = ?, is_fav = ?
               WHERE id = ?"#,
        )
        .bind(&message.content)
        .bind(format_datetime(&message.timestamp))
        .bind(message.is_user_message)
        .bind(message.conversation_id.0)
        .bind(is_fav)
        .bind(message.id.0)
        .execute(&self.pool.writer)
        .await
        .map_err(db_error("message.update"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.get(message.id).await?.ok_or(RepositoryError::NotFound)
    }

    async fn delete(&self, id: MessageId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM messages WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool.writer)
            .await
            .map_err(db_error("message.delete"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn toggle_favorite(&self, id: MessageId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE messages SET is_fav = 1 - is_fav WHERE id = ? AND is_user_message = 0",
        )
        .bind(id.0)
        .execute(&self.pool.writer)
        .await
        .map_err(db_error("message.toggle_favorite"))?;

        Ok(result.rows_affected() > 0)
    }
}
