use thiserror::Error;

use crate::conversation::ConversationId;

/// Errors from repository operations (used by trait definitions in codefuse-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,
}

/// Errors from refreshing a conversation's context window.
///
/// Unlike a bare "no result", callers can tell a missing conversation
/// apart from a storage failure and decide whether to retry.
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("conversation {0} not found")]
    NotFound(ConversationId),

    #[error("storage error: {0}")]
    Storage(String),
}

impl ContextError {
    /// Storage failures may be transient; a missing conversation is not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ContextError::Storage(_))
    }
}

/// Errors from loading `config.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}
