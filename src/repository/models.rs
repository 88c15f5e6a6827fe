//! Diesel ORM models for database tables.
//!
//! These models provide compile-time type checking for database operations.

use diesel::prelude::*;

use crate::models::timestamp::parse_timestamp_or_epoch;
use crate::models::{ChangeSource, ChangeType, FeedEntry};
use crate::schema;

/// Recent changes row from the database.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::recentchanges)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RecentChangeRecord {
    pub rc_id: i32,
    pub rc_timestamp: String,
    pub rc_user: i32,
    pub rc_user_text: String,
    pub rc_namespace: i32,
    pub rc_title: String,
    pub rc_comment: String,
    pub rc_minor: i32,
    pub rc_bot: i32,
    pub rc_new: i32,
    pub rc_patrolled: i32,
    pub rc_cur_id: i32,
    pub rc_this_oldid: i32,
    pub rc_last_oldid: i32,
    pub rc_type: i32,
    pub rc_source: String,
    pub rc_old_len: Option<i32>,
    pub rc_new_len: Option<i32>,
    pub rc_deleted: i32,
    pub rc_logid: i32,
    pub rc_log_type: Option<String>,
    pub rc_log_action: Option<String>,
    pub rc_params: Option<String>,
}

/// Convert a database record to a domain model.
impl TryFrom<RecentChangeRecord> for FeedEntry {
    type Error = diesel::result::Error;

    fn try_from(record: RecentChangeRecord) -> Result<Self, Self::Error> {
        let change_type = ChangeType::from_i32(record.rc_type).ok_or_else(|| {
            diesel::result::Error::DeserializationError(
                format!("Invalid rc_type: {}", record.rc_type).into(),
            )
        })?;
        let change_source = ChangeSource::from_str(&record.rc_source).ok_or_else(|| {
            diesel::result::Error::DeserializationError(
                format!("Invalid rc_source: '{}'", record.rc_source).into(),
            )
        })?;

        Ok(FeedEntry {
            id: record.rc_id,
            timestamp: parse_timestamp_or_epoch(&record.rc_timestamp),
            actor_id: record.rc_user,
            actor_name: record.rc_user_text,
            namespace: record.rc_namespace,
            title: record.rc_title,
            comment: record.rc_comment,
            is_minor: record.rc_minor != 0,
            is_bot: record.rc_bot != 0,
            is_new: record.rc_new != 0,
            is_patrolled: record.rc_patrolled != 0,
            change_type,
            change_source,
            subject_id: record.rc_cur_id,
            current_revision_id: record.rc_this_oldid,
            previous_revision_id: record.rc_last_oldid,
            old_size: record.rc_old_len,
            new_size: record.rc_new_len,
            visibility_mask: record.rc_deleted,
            log_id: record.rc_logid,
            log_type: record.rc_log_type,
            log_action: record.rc_log_action,
            log_params: record.rc_params,
        })
    }
}

/// Row of the linkage scan: one revision-derived feed entry.
#[derive(Queryable, Debug, Clone, PartialEq, Eq)]
pub struct LinkageScanRow {
    pub subject_id: i32,
    pub revision_id: i32,
    pub timestamp: String,
}

/// Object cache entry from the database.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::objectcache)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ObjectCacheRecord {
    pub keyname: String,
    pub value: Option<String>,
    pub exptime: Option<String>,
}

/// New object cache entry for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::objectcache)]
pub struct NewObjectCacheEntry<'a> {
    pub keyname: &'a str,
    pub value: Option<&'a str>,
    pub exptime: Option<&'a str>,
}
