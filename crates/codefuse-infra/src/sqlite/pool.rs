//! SQLite connection pools.
//!
//! SQLite serializes writers, so the store keeps one writer connection and a
//! separate read-only pool for lookups. Both run in WAL mode with foreign
//! keys on; conversation and message deletes rely on the cascades.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

const READER_CONNECTIONS: u32 = 8;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Reader and writer pools over the same database file.
#[derive(Clone)]
pub struct DatabasePool {
    /// Read-only connections for SELECT queries.
    pub reader: SqlitePool,
    /// The single connection all INSERT/UPDATE/DELETE statements go through.
    pub writer: SqlitePool,
}

impl DatabasePool {
    /// Open the database, apply pending migrations, then open the readers.
    ///
    /// Migrations run before any reader exists so readers never observe a
    /// half-migrated schema.
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        let options = connect_options(database_url)?;

        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options.clone())
            .await?;
        sqlx::migrate!("../../migrations").run(&writer).await?;

        let reader = SqlitePoolOptions::new()
            .max_connections(READER_CONNECTIONS)
            .connect_with(options.read_only(true))
            .await?;

        tracing::debug!(database_url, readers = READER_CONNECTIONS, "Database pool ready");
        Ok(Self { reader, writer })
    }

    /// Close both pools, waiting for in-flight queries to finish.
    pub async fn close(&self) {
        self.reader.close().await;
        self.writer.close().await;
    }
}

fn connect_options(database_url: &str) -> Result<SqliteConnectOptions, sqlx::Error> {
    Ok(SqliteConnectOptions::from_str(database_url)?
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(BUSY_TIMEOUT)
        .create_if_missing(true))
}

/// Database URL for `{data_dir}/codefuse.db`, created on first use.
pub fn default_database_url(data_dir: &Path) -> String {
    format!("sqlite://{}?mode=rwc", data_dir.join("codefuse.db").display())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn open_temp() -> (tempfile::TempDir, DatabasePool) {
        let dir = tempfile::tempdir().unwrap();
        let pool = DatabasePool::new(&default_database_url(dir.path()))
            .await
            .unwrap();
        (dir, pool)
    }

    #[tokio::test]
    async fn test_migrations_create_schema() {
        let (_dir, pool) = open_temp().await;

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' AND name != '_sqlx_migrations' ORDER BY name",
        )
        .fetch_all(&pool.reader)
        .await
        .unwrap();

        let names: Vec<&str> = tables.iter().map(|t| t.0.as_str()).collect();
        assert_eq!(names, vec!["clients", "conversations", "messages"]);
    }

    #[tokio::test]
    async fn test_writer_pragmas() {
        let (_dir, pool) = open_temp().await;

        let (mode,): (String,) = sqlx::query_as("PRAGMA journal_mode")
            .fetch_one(&pool.writer)
            .await
            .unwrap();
        let (fk,): (i64,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(&pool.writer)
            .await
            .unwrap();

        assert_eq!(mode.to_lowercase(), "wal");
        assert_eq!(fk, 1);
    }

    #[tokio::test]
    async fn test_reader_rejects_writes() {
        let (_dir, pool) = open_temp().await;

        let result = sqlx::query("INSERT INTO clients (name, date_created) VALUES ('x', 'y')")
            .execute(&pool.reader)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_reopen_after_close() {
        let dir = tempfile::tempdir().unwrap();
        let url = default_database_url(dir.path());

        let first = DatabasePool::new(&url).await.unwrap();
        first.close().await;
        assert!(first.writer.is_closed());

        // Migrations already applied; reopening must not fail.
        assert!(DatabasePool::new(&url).await.is_ok());
    }

    #[test]
    fn test_default_database_url() {
        let url = default_database_url(Path::new("/var/lib/codefuse"));
        assert_eq!(url, "sqlite:///var/lib/codefuse/codefuse.db?mode=rwc");
    }
}
