//! Object cache stored in the wiki's own `objectcache` table.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::backend::{CacheResult, ObjectCache};
use crate::models::timestamp::format_timestamp;
use crate::repository::models::{NewObjectCacheEntry, ObjectCacheRecord};
use crate::repository::pool::DbPool;
use crate::schema::objectcache;
use crate::with_conn;

/// Diesel-backed object cache.
#[derive(Clone)]
pub struct DatabaseCache {
    pool: DbPool,
}

impl DatabaseCache {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Whether a row with the given expiry is still live at `now`.
fn is_live(exptime: Option<&str>, now: &str) -> bool {
    match exptime {
        Some(exptime) => exptime > now,
        None => true,
    }
}

#[async_trait]
impl ObjectCache for DatabaseCache {
    fn name(&self) -> &'static str {
        "database"
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let record = with_conn!(self.pool, conn => {
            objectcache::table
                .filter(objectcache::keyname.eq(key))
                .select(ObjectCacheRecord::as_select())
                .first::<ObjectCacheRecord>(&mut conn)
                .await
                .optional()
        })?;

        let now = format_timestamp(Utc::now());
        Ok(record
            .filter(|r| is_live(r.exptime.as_deref(), &now))
            .and_then(|r| r.value))
    }

    async fn set(&self, key: &str, value: &str) -> CacheResult<()> {
        let entry = NewObjectCacheEntry {
            keyname: key,
            value: Some(value),
            exptime: None,
        };

        with_conn!(self.pool, conn => {
            diesel::replace_into(objectcache::table)
                .values(&entry)
                .execute(&mut conn)
                .await
        })?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        let removed = with_conn!(self.pool, conn => {
            diesel::delete(objectcache::table.filter(objectcache::keyname.eq(key)))
                .execute(&mut conn)
                .await
        })?;
        Ok(removed > 0)
    }
}
