//! Message repository trait definition.

use codefuse_types::conversation::ConversationId;
use codefuse_types::error::RepositoryError;
use codefuse_types::message::{Message, MessageId, NewMessage};

/// Repository trait for chat message persistence.
pub trait MessageRepository: Send + Sync {
    /// List the messages of a conversation.
    ///
    /// Ordered by timestamp ascending. Messages sharing a timestamp list
    /// favorites first, then in insertion order.
    fn list_by_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> impl std::future::Future<Output = Result<Vec<Message>, RepositoryError>> + Send;

    /// Get a single message by ID.
    fn get(
        &self,
        id: MessageId,
    ) -> impl std::future::Future<Output = Result<Option<Message>, RepositoryError>> + Send;

    /// Append a message. The store assigns the timestamp; `is_fav` starts false.
    fn create(
        &self,
        message: &NewMessage,
    ) -> impl std::future::Future<Output = Result<Message, RepositoryError>> + Send;

    /// Correct an existing message (content, timestamp, speaker, favorite, owner).
    ///
    /// A favorite flag on a user message is not stored.
    fn update(
        &self,
        message: &Message,
    ) -> impl std::future::Future<Output = Result<Message, RepositoryError>> + Send;

    /// Permanently delete a message.
    fn delete(
        &self,
        id: MessageId,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Flip the favorite flag of an assistant message.
    ///
    /// Returns `false` without changing anything when the message does not
    /// exist or was written by the user.
    fn toggle_favorite(
        &self,
        id: MessageId,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;
}
