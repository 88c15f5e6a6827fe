//! Database connection pool.
//!
//! Uses diesel-async's SyncConnectionWrapper to provide an async interface
//! for SQLite. Since SQLite connections are lightweight, we create new
//! connections per request rather than pooling.

use std::path::Path;

use diesel::sqlite::SqliteConnection;
use diesel_async::sync_connection_wrapper::SyncConnectionWrapper;
use diesel_async::AsyncConnection;

use super::util::to_diesel_error;

/// Diesel error type alias.
pub type DbError = diesel::result::Error;

/// Async SQLite connection type.
pub type SqliteConn = SyncConnectionWrapper<SqliteConnection>;

/// SQLite connection pool (lightweight - creates connections on demand).
#[derive(Clone, Debug)]
pub struct DbPool {
    database_url: String,
}

impl DbPool {
    /// Create a pool from a database URL.
    ///
    /// Accepts `sqlite:` URLs or bare file paths. Server URLs are rejected
    /// because the rebuild queries are written for SQLite.
    pub fn from_url(url: &str) -> Result<Self, DbError> {
        super::util::validate_database_url(url).map_err(to_diesel_error)?;
        // Strip sqlite: prefix if present
        let url = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))
            .unwrap_or(url);
        Ok(Self {
            database_url: url.to_string(),
        })
    }

    /// Create pool from a file path.
    pub fn from_path(path: &Path) -> Self {
        Self {
            database_url: path.display().to_string(),
        }
    }

    /// Get a connection.
    pub async fn get(&self) -> Result<SqliteConn, DbError> {
        SqliteConn::establish(&self.database_url)
            .await
            .map_err(to_diesel_error)
    }

    /// Get the database URL.
    pub fn database_url(&self) -> &str {
        &self.database_url
    }
}

/// Macro for running database operations on a pooled connection.
///
/// # Example
/// ```ignore
/// with_conn!(self.pool, conn => {
///     recentchanges::table.count().get_result::<i64>(&mut conn).await
/// })
/// ```
#[macro_export]
macro_rules! with_conn {
    ($pool:expr, $conn:ident => $body:expr) => {{
        let mut $conn = $pool.get().await?;
        $body
    }};
}

#[allow(unused_imports)]
pub use with_conn;
