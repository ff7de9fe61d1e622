//! Conversation repository trait definition.

use codefuse_types::client::ClientId;
use codefuse_types::conversation::{Conversation, ConversationId, NewConversation};
use codefuse_types::error::RepositoryError;

/// Repository trait for conversation persistence.
///
/// Conversations are returned with their messages loaded. Unless stated
/// otherwise, nested messages are in chronological order.
pub trait ConversationRepository: Send + Sync {
    /// Create a new, empty conversation.
    fn create(
        &self,
        conversation: &NewConversation,
    ) -> impl std::future::Future<Output = Result<Conversation, RepositoryError>> + Send;

    /// Get a conversation by its ID.
    fn get(
        &self,
        id: ConversationId,
    ) -> impl std::future::Future<Output = Result<Option<Conversation>, RepositoryError>> + Send;

    /// Get the first conversation (lowest ID) with the given name.
    fn get_by_name(
        &self,
        name: &str,
    ) -> impl std::future::Future<Output = Result<Option<Conversation>, RepositoryError>> + Send;

    /// List all conversations.
    fn list(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<Conversation>, RepositoryError>> + Send;

    /// List a client's conversations.
    ///
    /// Nested messages are ordered favorites first, then most recent first.
    fn list_by_client(
        &self,
        client_id: ClientId,
    ) -> impl std::future::Future<Output = Result<Vec<Conversation>, RepositoryError>> + Send;

    /// Update the name, context, and system message of a conversation.
    ///
    /// Client ownership and messages are not touched. Returns the stored
    /// conversation, or `NotFound`.
    fn update(
        &self,
        conversation: &Conversation,
    ) -> impl std::future::Future<Output = Result<Conversation, RepositoryError>> + Send;

    /// Permanently delete a conversation and its messages.
    fn delete(
        &self,
        id: ConversationId,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Whether a conversation belongs to a client.
    ///
    /// `None` means the caller is not acting on a specific conversation and
    /// always authorizes. A conversation that does not exist never belongs.
    fn belongs_to_client(
        &self,
        conversation_id: Option<ConversationId>,
        client_id: ClientId,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;
}
