//! Diesel-based repository for the read-only `logging` and `log_search` tables.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::pool::{DbError, DbPool};
use crate::schema::{log_search, logging};
use crate::with_conn;

/// A `log_search` association of a log record to a raw value.
#[derive(Queryable, Debug, Clone, PartialEq, Eq)]
pub struct LogAssociation {
    pub log_id: i32,
    pub value: String,
}

/// Diesel-based logging repository.
#[derive(Clone)]
pub struct LoggingRepository {
    pool: DbPool,
}

impl LoggingRepository {
    /// Create a new repository with an existing pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Values stored under `field` for logs of type `log_type`, by log id.
    pub async fn associations(
        &self,
        log_type: &str,
        field: &str,
    ) -> Result<Vec<LogAssociation>, DbError> {
        with_conn!(self.pool, conn => {
            logging::table
                .inner_join(log_search::table.on(log_search::ls_log_id.eq(logging::log_id)))
                .filter(logging::log_type.eq(log_type))
                .filter(log_search::ls_field.eq(field))
                .order((logging::log_id.asc(), log_search::ls_value.asc()))
                .select((logging::log_id, log_search::ls_value))
                .load::<LogAssociation>(&mut conn)
                .await
        })
    }
}
