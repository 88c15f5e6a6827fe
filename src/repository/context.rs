//! Database context for managing connections and repository access.
//!
//! The DbContext is the primary entry point for all database operations.
//! It holds the connection pool and provides access to all repositories.

use std::path::Path;

use diesel_async::SimpleAsyncConnection;

use super::logging::LoggingRepository;
use super::pool::{DbError, DbPool};
use super::recent_changes::RecentChangesRepository;
use super::revisions::RevisionRepository;
use super::users::UserRepository;
use crate::with_conn;

/// Database context that manages the connection pool and provides repository access.
///
/// # Example
/// ```ignore
/// let ctx = DbContext::from_url("sqlite:/var/lib/wiki/wiki.db")?;
/// let entries = ctx.recent_changes().count().await?;
/// ```
#[derive(Clone, Debug)]
pub struct DbContext {
    pool: DbPool,
}

impl DbContext {
    /// Create a context from a database file path.
    pub fn new(db_path: &Path) -> Self {
        Self {
            pool: DbPool::from_path(db_path),
        }
    }

    /// Create a context from a database URL (`sqlite:` URL or file path).
    pub fn from_url(url: &str) -> Result<Self, DbError> {
        Ok(Self {
            pool: DbPool::from_url(url)?,
        })
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Get the feed table repository.
    pub fn recent_changes(&self) -> RecentChangesRepository {
        RecentChangesRepository::new(self.pool.clone())
    }

    /// Get a revision repository.
    pub fn revisions(&self) -> RevisionRepository {
        RevisionRepository::new(self.pool.clone())
    }

    /// Get a logging repository.
    pub fn logging(&self) -> LoggingRepository {
        LoggingRepository::new(self.pool.clone())
    }

    /// Get a user repository.
    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }

    /// Initialize database schema.
    pub async fn init_schema(&self) -> Result<(), DbError> {
        self.batch_execute(include_str!("schema_sqlite.sql")).await
    }

    /// Run a batch of semicolon-separated statements.
    pub async fn batch_execute(&self, sql: &str) -> Result<(), DbError> {
        with_conn!(self.pool, conn => {
            conn.batch_execute(sql).await
        })
    }
}
