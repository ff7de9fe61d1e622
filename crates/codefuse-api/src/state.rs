//! Application state wiring repositories and the context builder together.
//!
//! The context builder is generic over its repositories; AppState pins it to
//! the SQLite implementations.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use codefuse_core::context::ContextBuilder;
use codefuse_infra::config::{
    load_global_config, resolve_context_config, resolve_data_dir, resolve_database_url,
};
use codefuse_infra::sqlite::client::SqliteClientRepository;
use codefuse_infra::sqlite::conversation::SqliteConversationRepository;
use codefuse_infra::sqlite::message::SqliteMessageRepository;
use codefuse_infra::sqlite::pool::DatabasePool;

/// Context builder pinned to the SQLite repositories.
pub type ConcreteContextBuilder =
    ContextBuilder<SqliteConversationRepository, SqliteMessageRepository>;

/// Command-line overrides layered on top of `config.toml`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextOverrides {
    pub window_size: Option<usize>,
    pub max_context_chars: Option<usize>,
}

/// Shared application state used by every CLI command.
#[derive(Clone)]
pub struct AppState {
    pub clients: Arc<SqliteClientRepository>,
    pub conversations: Arc<SqliteConversationRepository>,
    pub messages: Arc<SqliteMessageRepository>,
    pub context_builder: Arc<ConcreteContextBuilder>,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Initialize against the resolved data directory.
    pub async fn init(overrides: ContextOverrides) -> anyhow::Result<Self> {
        Self::init_in(resolve_data_dir(), overrides).await
    }

    /// Initialize against an explicit data directory: load config, open the
    /// database, wire repositories.
    pub async fn init_in(data_dir: PathBuf, overrides: ContextOverrides) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let config = load_global_config(&data_dir).await;
        let context_config = resolve_context_config(
            &config,
            overrides.window_size,
            overrides.max_context_chars,
        )?;

        let db_url = resolve_database_url(&config, &data_dir);
        let db_pool = DatabasePool::new(&db_url)
            .await
            .with_context(|| format!("failed to open database at {db_url}"))?;

        tracing::debug!(
            data_dir = %data_dir.display(),
            window_size = context_config.window_size,
            max_context_chars = context_config.max_context_chars,
            "Application state initialized"
        );

        let context_builder = ContextBuilder::new(
            SqliteConversationRepository::new(db_pool.clone()),
            SqliteMessageRepository::new(db_pool.clone()),
            context_config,
        );

        Ok(Self {
            clients: Arc::new(SqliteClientRepository::new(db_pool.clone())),
            conversations: Arc::new(SqliteConversationRepository::new(db_pool.clone())),
            messages: Arc::new(SqliteMessageRepository::new(db_pool.clone())),
            context_builder: Arc::new(context_builder),
            db_pool,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codefuse_core::repository::client::ClientRepository;
    use codefuse_types::client::NewClient;

    #[tokio::test]
    async fn test_init_in_creates_database_and_applies_overrides() {
        let tmp = tempfile::tempdir().unwrap();
        let data_dir = tmp.path().join("nested");

        let state = AppState::init_in(
            data_dir.clone(),
            ContextOverrides {
                window_size: Some(5),
                max_context_chars: None,
            },
        )
        .await
        .unwrap();

        assert!(data_dir.join("codefuse.db").exists());
        assert_eq!(state.context_builder.config().window_size, 5);
        assert_eq!(state.context_builder.config().max_context_chars, 30_000);

        let client = state.clients.create(&NewClient::named("Acme")).await.unwrap();
        assert_eq!(state.clients.list().await.unwrap()[0].id, client.id);
    }

    #[tokio::test]
    async fn test_init_in_rejects_zero_window() {
        let tmp = tempfile::tempdir().unwrap();
        let result = AppState::init_in(
            tmp.path().to_path_buf(),
            ContextOverrides {
                window_size: Some(0),
                max_context_chars: None,
            },
        )
        .await;
        assert!(result.is_err());
    }
}
