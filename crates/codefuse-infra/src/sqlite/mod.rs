//! SQLite storage layer.
//!
//! Repository implementations backed by SQLite with WAL mode and split
//! read/write connection pools.

pub mod client;
pub mod conversation;
pub mod message;
pub mod pool;

use chrono::{DateTime, SecondsFormat, Utc};
use codefuse_types::error::RepositoryError;

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Build an error mapper that logs the failed operation before converting.
///
/// Pool exhaustion and I/O failures become `Connection`; everything else is
/// a `Query` error carrying the driver message.
pub(crate) fn db_error(operation: &'static str) -> impl Fn(sqlx::Error) -> RepositoryError {
    move |e| {
        tracing::error!(operation, error = %e, "SQLite operation failed");
        match e {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                RepositoryError::Connection
            }
            other => RepositoryError::Query(other.to_string()),
        }
    }
}

pub(crate) fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

/// Fixed-width RFC 3339 (microseconds, `Z` suffix) so that string order
/// matches time order in `ORDER BY`.
pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}
