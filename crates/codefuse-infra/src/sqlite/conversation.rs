//! SQLite conversation repository implementation.
//!
//! Implements `ConversationRepository` from `codefuse-core`. Conversations are
//! returned with their messages: single lookups issue a second query, list
//! queries fetch all relevant messages at once and group them in memory.

use std::collections::HashMap;

use codefuse_core::repository::conversation::ConversationRepository;
use codefuse_types::client::ClientId;
use codefuse_types::conversation::{Conversation, ConversationId, NewConversation};
use codefuse_types::error::RepositoryError;
use codefuse_types::message::Message;
use sqlx::Row;

use super::db_error;
use super::message::rows_into_messages;
use super::pool::DatabasePool;

const MESSAGES_CHRONOLOGICAL: &str = "m.timestamp ASC, m.id ASC";
const MESSAGES_FAVORITES_THEN_RECENT: &str = "m.is_fav DESC, m.timestamp DESC, m.id DESC";

/// SQLite-backed implementation of `ConversationRepository`.
pub struct SqliteConversationRepository {
    pool: DatabasePool,
}

impl SqliteConversationRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    async fn load_messages(&self, id: ConversationId) -> Result<Vec<Message>, RepositoryError> {
        let sql = format!(
            "SELECT m.* FROM messages m WHERE m.conversation_id = ? ORDER BY {MESSAGES_CHRONOLOGICAL}"
        );
        let rows = sqlx::query(&sql)
            .bind(id.0)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(db_error("conversation.load_messages"))?;

        rows_into_messages(&rows)
    }

    async fn fetch_one_where(
        &self,
        operation: &'static str,
        predicate: &str,
        bind: ConversationLookup<'_>,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let sql = format!("SELECT * FROM conversations WHERE {predicate} ORDER BY id LIMIT 1");
        let query = sqlx::query(&sql);
        let query = match bind {
            ConversationLookup::Id(id) => query.bind(id.0),
            ConversationLookup::Name(name) => query.bind(name),
        };

        let row = query
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(db_error(operation))?;

        match row {
            Some(row) => {
                let conversation = ConversationRow::from_row(&row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?
                    .into_conversation(Vec::new());
                let messages = self.load_messages(conversation.id).await?;
                Ok(Some(Conversation {
                    messages,
                    ..conversation
                }))
            }
            None => Ok(None),
        }
    }
}

enum ConversationLookup<'a> {
    Id(ConversationId),
    Name(&'a str),
}

// ---------------------------------------------------------------------------
// Private Row type for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

/// Internal row type for mapping SQLite rows to domain Conversation.
struct ConversationRow {
    id: i64,
    name: String,
    client_id: i64,
    context: String,
    system_message: Option<String>,
}

impl ConversationRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            client_id: row.try_get("client_id")?,
            context: row.try_get("context")?,
            system_message: row.try_get("system_message")?,
        })
    }

    fn into_conversation(self, messages: Vec<Message>) -> Conversation {
        Conversation {
            id: ConversationId(self.id),
            name: self.name,
            client_id: ClientId(self.client_id),
            context: self.context,
            system_message: self.system_message,
            messages,
        }
    }
}

/// Attach grouped messages to their conversations, preserving both orders.
fn assemble(
    rows: &[sqlx::sqlite::SqliteRow],
    messages: Vec<Message>,
) -> Result<Vec<Conversation>, RepositoryError> {
    let mut by_conversation: HashMap<ConversationId, Vec<Message>> = HashMap::new();
    for message in messages {
        by_conversation
            .entry(message.conversation_id)
            .or_default()
            .push(message);
    }

    let mut conversations = Vec::with_capacity(rows.len());
    for row in rows {
        let conv_row =
            ConversationRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
        let messages = by_conversation
            .remove(&ConversationId(conv_row.id))
            .unwrap_or_default();
        conversations.push(conv_row.into_conversation(messages));
    }
    Ok(conversations)
}

// ---------------------------------------------------------------------------
// ConversationRepository implementation
// ---------------------------------------------------------------------------

impl ConversationRepository for SqliteConversationRepository {
    async fn create(&self, conversation: &NewConversation) -> Result<Conversation, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO conversations (name, client_id, context, system_message) VALUES (?, ?, ?, ?)",
        )
        .bind(&conversation.name)
        .bind(conversation.client_id.0)
        .bind(&conversation.context)
        .bind(&conversation.system_message)
        .execute(&self.pool.writer)
        .await
        .map_err(db_error("conversation.create"))?;

        let id = ConversationId(result.last_insert_rowid());
        tracing::debug!(conversation_id = %id, client_id = %conversation.client_id, "Conversation created");

        Ok(Conversation {
            id,
            name: conversation.name.clone(),
            client_id: conversation.client_id,
            context: conversation.context.clone(),
            system_message: conversation.system_message.clone(),
            messages: Vec::new(),
        })
    }

    async fn get(&self, id: ConversationId) -> Result<Option<Conversation>, RepositoryError> {
        self.fetch_one_where("conversation.get", "id = ?", ConversationLookup::Id(id))
            .await
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Conversation>, RepositoryError> {
        self.fetch_one_where(
            "conversation.get_by_name",
            "name = ?",
            ConversationLookup::Name(name),
        )
        .await
    }

    async fn list(&self) -> Result<Vec<Conversation>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM conversations ORDER BY id")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(db_error("conversation.list"))?;

        let sql = format!("SELECT m.* FROM messages m ORDER BY {MESSAGES_CHRONOLOGICAL}");
        let message_rows = sqlx::query(&sql)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(db_error("conversation.list"))?;

        assemble(&rows, rows_into_messages(&message_rows)?)
    }

    async fn list_by_client(&self, client_id: ClientId) -> Result<Vec<Conversation>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM conversations WHERE client_id = ? ORDER BY id")
            .bind(client_id.0)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(db_error("conversation.list_by_client"))?;

        let sql = format!(
            r#"SELECT m.* FROM messages m
               JOIN conversations c ON c.id = m.conversation_id
               WHERE c.client_id = ?
               ORDER BY {MESSAGES_FAVORITES_THEN_RECENT}"#
        );
        let message_rows = sqlx::query(&sql)
            .bind(client_id.0)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(db_error("conversation.list_by_client"))?;

        assemble(&rows, rows_into_messages(&message_rows)?)
    }

    async fn update(&self, conversation: &Conversation) -> Result<Conversation, RepositoryError> {
        let result = sqlx::query(
            "UPDATE conversations SET name = ?, context = ?, system_message = ? WHERE id = ?",
        )
        .bind(&conversation.name)
        .bind(&conversation.context)
        .bind(&conversation.system_message)
        .bind(conversation.id.0)
        .execute(&self.pool.writer)
        .await
        .map_err(db_error("conversation.update"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.get(conversation.id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    async fn delete(&self, id: ConversationId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM conversations WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool.writer)
            .await
            .map_err(db_error("conversation.delete"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn belongs_to_client(
        &self,
        conversation_id: Option<ConversationId>,
        client_id: ClientId,
    ) -> Result<bool, RepositoryError> {
        let Some(id) = conversation_id else {
            return Ok(true);
        };

        let owner: Option<(i64,)> =
            sqlx::query_as("SELECT client_id FROM conversations WHERE id = ?")
                .bind(id.0)
                .fetch_optional(&self.pool.reader)
                .await
                .map_err(db_error("conversation.belongs_to_client"))?;

        Ok(owner.is_some_and(|(owner,)| owner == client_id.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::format_datetime;
    use crate::sqlite::test_support::test_pool;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use codefuse_types::message::MessageId;

    async fn seed_client(pool: &DatabasePool, name: &str) -> ClientId {
        let result = sqlx::query("INSERT INTO clients (name, date_created) VALUES (?, ?)")
            .bind(name)
            .bind(format_datetime(&Utc::now()))
            .execute(&pool.writer)
            .await
            .unwrap();
        ClientId(result.last_insert_rowid())
    }

    async fn insert_message(
        pool: &DatabasePool,
        conversation_id: ConversationId,
        content: &str,
        is_fav: bool,
        at: DateTime<Utc>,
    ) -> MessageId {
        let result = sqlx::query(
            "INSERT INTO messages (conversation_id, content, is_user_message, is_fav, timestamp) VALUES (?, ?, 0, ?, ?)",
        )
        .bind(conversation_id.0)
        .bind(content)
        .bind(is_fav)
        .bind(format_datetime(&at))
        .execute(&pool.writer)
        .await
        .unwrap();
        MessageId(result.last_insert_rowid())
    }

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap() + Duration::seconds(secs)
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let pool = test_pool().await;
        let repo = SqliteConversationRepository::new(pool.clone());
        let client = seed_client(&pool, "Acme").await;

        let mut req = NewConversation::new("Onboarding", client);
        req.system_message = Some("You are helpful.".to_string());
        let created = repo.create(&req).await.unwrap();
        assert!(created.messages.is_empty());

        let found = repo.get(created.id).await.unwrap().unwrap();
        assert_eq!(found, created);
        assert!(repo.get(ConversationId(999)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_for_missing_client_fails() {
        let pool = test_pool().await;
        let repo = SqliteConversationRepository::new(pool);
        let result = repo.create(&NewConversation::new("Lost", ClientId(404))).await;
        assert!(matches!(result, Err(RepositoryError::Query(_))));
    }

    #[tokio::test]
    async fn test_get_loads_messages_chronologically() {
        let pool = test_pool().await;
        let repo = SqliteConversationRepository::new(pool.clone());
        let client = seed_client(&pool, "Acme").await;
        let conv = repo.create(&NewConversation::new("c", client)).await.unwrap();

        let late = insert_message(&pool, conv.id, "late", true, t(10)).await;
        let early = insert_message(&pool, conv.id, "early", false, t(1)).await;

        let found = repo.get(conv.id).await.unwrap().unwrap();
        let ids: Vec<MessageId> = found.messages.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![early, late]);
    }

    #[tokio::test]
    async fn test_get_by_name_returns_first_match() {
        let pool = test_pool().await;
        let repo = SqliteConversationRepository::new(pool.clone());
        let client = seed_client(&pool, "Acme").await;
        let first = repo.create(&NewConversation::new("dup", client)).await.unwrap();
        repo.create(&NewConversation::new("dup", client)).await.unwrap();

        let found = repo.get_by_name("dup").await.unwrap().unwrap();
        assert_eq!(found.id, first.id);
        assert!(repo.get_by_name("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_all_groups_messages() {
        let pool = test_pool().await;
        let repo = SqliteConversationRepository::new(pool.clone());
        let acme = seed_client(&pool, "Acme").await;
        let globex = seed_client(&pool, "Globex").await;
        let a = repo.create(&NewConversation::new("a", acme)).await.unwrap();
        let b = repo.create(&NewConversation::new("b", globex)).await.unwrap();
        insert_message(&pool, a.id, "a1", false, t(0)).await;
        insert_message(&pool, b.id, "b1", false, t(0)).await;
        insert_message(&pool, b.id, "b2", false, t(1)).await;

        let all = repo.list().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].messages.len(), 1);
        assert_eq!(all[1].messages.len(), 2);
        assert_eq!(all[1].messages[0].content, "b1");
    }

    #[tokio::test]
    async fn test_list_by_client_orders_favorites_then_recent() {
        let pool = test_pool().await;
        let repo = SqliteConversationRepository::new(pool.clone());
        let acme = seed_client(&pool, "Acme").await;
        let other = seed_client(&pool, "Other").await;
        let conv = repo.create(&NewConversation::new("main", acme)).await.unwrap();
        repo.create(&NewConversation::new("foreign", other)).await.unwrap();

        let old = insert_message(&pool, conv.id, "old", false, t(0)).await;
        let old_fav = insert_message(&pool, conv.id, "old fav", true, t(1)).await;
        let new = insert_message(&pool, conv.id, "new", false, t(5)).await;
        let new_fav = insert_message(&pool, conv.id, "new fav", true, t(6)).await;

        let listed = repo.list_by_client(acme).await.unwrap();
        assert_eq!(listed.len(), 1);
        let ids: Vec<MessageId> = listed[0].messages.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![new_fav, old_fav, new, old]);
    }

    #[tokio::test]
    async fn test_update_only_touches_mutable_fields() {
        let pool = test_pool().await;
        let repo = SqliteConversationRepository::new(pool.clone());
        let acme = seed_client(&pool, "Acme").await;
        let globex = seed_client(&pool, "Globex").await;
        let conv = repo.create(&NewConversation::new("before", acme)).await.unwrap();

        let edited = Conversation {
            name: "after".to_string(),
            context: "User: hi\n".to_string(),
            system_message: Some("Reply in French.".to_string()),
            client_id: globex,
            ..conv.clone()
        };
        let updated = repo.update(&edited).await.unwrap();

        assert_eq!(updated.name, "after");
        assert_eq!(updated.context, "User: hi\n");
        assert_eq!(updated.system_message.as_deref(), Some("Reply in French."));
        assert_eq!(updated.client_id, acme);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let pool = test_pool().await;
        let repo = SqliteConversationRepository::new(pool.clone());
        let acme = seed_client(&pool, "Acme").await;
        let ghost = Conversation {
            id: ConversationId(42),
            name: "ghost".to_string(),
            client_id: acme,
            context: String::new(),
            system_message: None,
            messages: Vec::new(),
        };
        assert!(matches!(repo.update(&ghost).await, Err(RepositoryError::NotFound)));
    }

    #[tokio::test]
    async fn test_delete_cascades_messages() {
        let pool = test_pool().await;
        let repo = SqliteConversationRepository::new(pool.clone());
        let acme = seed_client(&pool, "Acme").await;
        let conv = repo.create(&NewConversation::new("doomed", acme)).await.unwrap();
        insert_message(&pool, conv.id, "bye", false, t(0)).await;

        repo.delete(conv.id).await.unwrap();
        assert!(repo.get(conv.id).await.unwrap().is_none());

        let (remaining,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM messages WHERE conversation_id = ?")
                .bind(conv.id.0)
                .fetch_one(&pool.reader)
                .await
                .unwrap();
        assert_eq!(remaining, 0);
        assert!(matches!(repo.delete(conv.id).await, Err(RepositoryError::NotFound)));
    }

    #[tokio::test]
    async fn test_belongs_to_client() {
        let pool = test_pool().await;
        let repo = SqliteConversationRepository::new(pool.clone());
        let acme = seed_client(&pool, "Acme").await;
        let globex = seed_client(&pool, "Globex").await;
        let conv = repo.create(&NewConversation::new("mine", acme)).await.unwrap();

        assert!(repo.belongs_to_client(Some(conv.id), acme).await.unwrap());
        assert!(!repo.belongs_to_client(Some(conv.id), globex).await.unwrap());
        assert!(!repo.belongs_to_client(Some(ConversationId(999)), acme).await.unwrap());
        assert!(repo.belongs_to_client(None, globex).await.unwrap());
        assert!(
            repo.belongs_to_client(ConversationId::from_raw(0), ClientId(12345))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_refresh_context_on_sqlite() {
        use crate::sqlite::message::SqliteMessageRepository;
        use codefuse_core::context::ContextBuilder;
        use codefuse_core::repository::message::MessageRepository;
        use codefuse_types::config::ContextConfig;
        use codefuse_types::error::ContextError;
        use codefuse_types::message::NewMessage;

        let pool = test_pool().await;
        let client = seed_client(&pool, "Acme").await;
        let conversations = SqliteConversationRepository::new(pool.clone());
        let conversation = conversations
            .create(&NewConversation::new("Support", client))
            .await
            .unwrap();

        let messages = SqliteMessageRepository::new(pool.clone());
        for i in 0..25 {
            messages
                .create(&NewMessage {
                    conversation_id: conversation.id,
                    content: format!("m{i:02}"),
                    is_user_message: i % 2 == 0,
                })
                .await
                .unwrap();
        }

        let builder = ContextBuilder::new(
            SqliteConversationRepository::new(pool.clone()),
            SqliteMessageRepository::new(pool.clone()),
            ContextConfig::default(),
        );

        let first = builder.refresh_context(conversation.id).await.unwrap();
        let second = builder.refresh_context(conversation.id).await.unwrap();
        assert_eq!(first.context, second.context);

        let lines: Vec<&str> = first.context.lines().collect();
        assert_eq!(lines.len(), 20);
        assert_eq!(lines[0], "Assistant: m05");
        assert_eq!(lines[19], "User: m24");
        assert!(!first.context.contains("m04"));

        let stored = conversations.get(conversation.id).await.unwrap().unwrap();
        assert_eq!(stored.context, first.context);
        assert_eq!(stored.messages.len(), 25);

        let missing = builder.refresh_context(ConversationId(999)).await;
        assert!(matches!(
            missing,
            Err(ContextError::NotFound(ConversationId(999)))
        ));
    }
}
