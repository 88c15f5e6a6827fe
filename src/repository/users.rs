//! Diesel-based repository for the read-only `user` and `user_groups` tables.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::pool::{DbError, DbPool};
use crate::schema::{user, user_groups};
use crate::with_conn;

/// Diesel-based user repository.
#[derive(Clone)]
pub struct UserRepository {
    pool: DbPool,
}

impl UserRepository {
    /// Create a new repository with an existing pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Distinct names of users belonging to any of `groups`, sorted.
    pub async fn names_in_groups(&self, groups: &[String]) -> Result<Vec<String>, DbError> {
        if groups.is_empty() {
            return Ok(Vec::new());
        }

        with_conn!(self.pool, conn => {
            user_groups::table
                .inner_join(user::table.on(user::user_id.eq(user_groups::ug_user)))
                .filter(user_groups::ug_group.eq_any(groups.to_vec()))
                .select(user::user_name)
                .distinct()
                .order(user::user_name.asc())
                .load::<String>(&mut conn)
                .await
        })
    }
}
