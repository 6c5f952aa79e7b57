use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::error::StoreError;

/// Default bound on a single store operation.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(3);

pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Initialize database connection pool with recommended pragmas.
pub async fn init_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    init_pool_with(database_url, DEFAULT_MAX_CONNECTIONS).await
}

/// Initialize a pool with an explicit connection cap.
///
/// Every connection to `:memory:` opens its own empty database, so
/// in-memory pools are held to a single connection.
pub async fn init_pool_with(
    database_url: &str,
    max_connections: u32,
) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5))
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

    let max_connections = if is_in_memory(database_url) {
        1
    } else {
        max_connections.max(1)
    };

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

/// Create the schema if it does not exist yet.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(include_str!("../migrations/001_create_movies.sql"))
        .execute(pool)
        .await?;
    Ok(())
}

/// Run `op`, giving up with [`StoreError::Timeout`] once `limit` elapses.
///
/// The future is dropped on expiry. A write that was already handed to the
/// database may still complete, so callers re-read before retrying.
pub async fn with_timeout<T, F>(
    operation: &'static str,
    limit: Duration,
    op: F,
) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(limit, op).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(operation, ?limit, "store operation timed out");
            Err(StoreError::Timeout {
                operation,
                after: limit,
            })
        }
    }
}
