//! Context refresh for a single conversation.
//!
//! `Conversation::context` is a cache derived from the message set. The
//! builder recomputes it on demand and persists it through the regular
//! conversation update path. Two concurrent refreshes of the same
//! conversation race last-writer-wins; both write a value derived from the
//! store, so either result is acceptable.

use codefuse_types::config::ContextConfig;
use codefuse_types::conversation::{Conversation, ConversationId};
use codefuse_types::error::{ContextError, RepositoryError};
use tracing::{debug, info, warn};

use crate::context::window::{TrimmedContext, build_context};
use crate::repository::conversation::ConversationRepository;
use crate::repository::message::MessageRepository;

/// Recomputes and stores the rolling context of conversations.
///
/// Generic over the conversation and message repositories so it can run
/// against SQLite in production and in-memory stores in tests.
pub struct ContextBuilder<C: ConversationRepository, M: MessageRepository> {
    conversation_repo: C,
    message_repo: M,
    config: ContextConfig,
}

impl<C: ConversationRepository, M: MessageRepository> ContextBuilder<C, M> {
    pub fn new(conversation_repo: C, message_repo: M, config: ContextConfig) -> Self {
        Self {
            conversation_repo,
            message_repo,
            config,
        }
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Render the context of a conversation without storing it.
    pub async fn preview_context(&self, id: ConversationId) -> Result<TrimmedContext, ContextError> {
        let (_, trimmed) = self.load_and_render(id).await?;
        Ok(trimmed)
    }

    /// Recompute the conversation's context and persist it.
    ///
    /// Returns the updated conversation as stored.
    pub async fn refresh_context(&self, id: ConversationId) -> Result<Conversation, ContextError> {
        let (mut conversation, trimmed) = self.load_and_render(id).await?;

        if trimmed.evicted_lines > 0 {
            warn!(
                conversation_id = %id,
                evicted_lines = trimmed.evicted_lines,
                max_chars = self.config.max_context_chars,
                "Context over budget, oldest lines evicted"
            );
        }

        conversation.context = trimmed.text;

        let updated = self
            .conversation_repo
            .update(&conversation)
            .await
            .map_err(|e| match e {
                // Deleted between load and save.
                RepositoryError::NotFound => ContextError::NotFound(id),
                other => ContextError::Storage(other.to_string()),
            })?;

        info!(
            conversation_id = %id,
            messages = trimmed.messages_in_window,
            context_chars = updated.context.chars().count(),
            "Conversation context refreshed"
        );

        Ok(updated)
    }

    async fn load_and_render(
        &self,
        id: ConversationId,
    ) -> Result<(Conversation, TrimmedContext), ContextError> {
        let conversation = self
            .conversation_repo
            .get(id)
            .await
            .map_err(|e| ContextError::Storage(e.to_string()))?
            .ok_or(ContextError::NotFound(id))?;

        // The message store is the source of the window. Nested messages on
        // `conversation` are not used: lookups may nest them in a different
        // order (`list_by_client` puts favorites first).
        let messages = self
            .message_repo
            .list_by_conversation(id)
            .await
            .map_err(|e| ContextError::Storage(e.to_string()))?;

        debug!(conversation_id = %id, loaded = messages.len(), "Rendering context window");

        let trimmed = build_context(&messages, &self.config);
        Ok((conversation, trimmed))
    }
}
