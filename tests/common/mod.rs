//! Shared fixtures: a temporary wiki database populated through rusqlite.

#![allow(dead_code)]

use std::path::PathBuf;

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection};
use tempfile::TempDir;

use rcrebuild::models::FeedEntry;
use rcrebuild::repository::DbContext;

/// Reference "now" for every test: 2024-04-01 12:00:00 UTC.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, 1, 12, 0, 0).unwrap()
}

/// Timestamp inside the default 90 day window, `day` of March 2024.
pub fn march(day: u32, hour: u32) -> String {
    format!("202403{:02}{:02}0000", day, hour)
}

/// Timestamp well before the default window.
pub fn last_year(day: u32) -> String {
    format!("202306{:02}000000", day)
}

pub struct TestWiki {
    pub ctx: DbContext,
    pub path: PathBuf,
    _dir: TempDir,
}

impl TestWiki {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wiki.db");
        let ctx = DbContext::new(&path);
        ctx.init_schema().await.unwrap();
        Self {
            ctx,
            path,
            _dir: dir,
        }
    }

    fn conn(&self) -> Connection {
        Connection::open(&self.path).unwrap()
    }

    pub fn page(&self, page_id: i32, namespace: i32, title: &str) {
        self.conn()
            .execute(
                "INSERT INTO page (page_id, page_namespace, page_title) VALUES (?1, ?2, ?3)",
                params![page_id, namespace, title],
            )
            .unwrap();
    }

    pub fn user(&self, user_id: i32, name: &str) {
        self.conn()
            .execute(
                "INSERT INTO \"user\" (user_id, user_name) VALUES (?1, ?2)",
                params![user_id, name],
            )
            .unwrap();
    }

    pub fn group(&self, user_id: i32, group: &str) {
        self.conn()
            .execute(
                "INSERT INTO user_groups (ug_user, ug_group) VALUES (?1, ?2)",
                params![user_id, group],
            )
            .unwrap();
    }

    pub fn revision(
        &self,
        rev_id: i32,
        page_id: i32,
        timestamp: &str,
        user: (i32, &str),
        len: Option<i32>,
    ) {
        self.conn()
            .execute(
                "INSERT INTO revision (rev_id, rev_page, rev_timestamp, rev_user, rev_user_text, \
                 rev_comment, rev_len) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    rev_id,
                    page_id,
                    timestamp,
                    user.0,
                    user.1,
                    format!("edit {}", rev_id),
                    len
                ],
            )
            .unwrap();
    }

    /// Set the minor-edit flag and deletion bits of an inserted revision.
    pub fn revision_flags(&self, rev_id: i32, minor: bool, deleted: i32) {
        self.conn()
            .execute(
                "UPDATE revision SET rev_minor_edit = ?1, rev_deleted = ?2 WHERE rev_id = ?3",
                params![minor as i32, deleted, rev_id],
            )
            .unwrap();
    }

    #[allow(clippy::too_many_arguments)]
    pub fn log(
        &self,
        log_id: i32,
        log_type: &str,
        action: &str,
        timestamp: &str,
        user_id: i32,
        namespace: i32,
        title: &str,
    ) {
        self.conn()
            .execute(
                "INSERT INTO logging (log_id, log_type, log_action, log_timestamp, log_user, \
                 log_namespace, log_title, log_comment, log_params) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    log_id,
                    log_type,
                    action,
                    timestamp,
                    user_id,
                    namespace,
                    title,
                    format!("{} {}", action, title),
                    format!("params-{}", log_id)
                ],
            )
            .unwrap();
    }

    pub fn log_deleted(&self, log_id: i32, deleted: i32) {
        self.conn()
            .execute(
                "UPDATE logging SET log_deleted = ?1 WHERE log_id = ?2",
                params![deleted, log_id],
            )
            .unwrap();
    }

    pub fn log_search(&self, field: &str, value: &str, log_id: i32) {
        self.conn()
            .execute(
                "INSERT INTO log_search (ls_field, ls_value, ls_log_id) VALUES (?1, ?2, ?3)",
                params![field, value, log_id],
            )
            .unwrap();
    }

    /// Insert a raw feed row, bypassing the passes.
    pub fn feed_row(&self, subject_id: i32, revision_id: i32, timestamp: &str) {
        self.conn()
            .execute(
                "INSERT INTO recentchanges (rc_timestamp, rc_cur_id, rc_this_oldid, rc_source) \
                 VALUES (?1, ?2, ?3, 'mw.edit')",
                params![timestamp, subject_id, revision_id],
            )
            .unwrap();
    }

    pub async fn entries(&self) -> Vec<FeedEntry> {
        self.ctx.recent_changes().get_all().await.unwrap()
    }

    /// The single revision-derived entry for `revision_id`.
    pub async fn revision_entry(&self, revision_id: i32) -> FeedEntry {
        let matches: Vec<FeedEntry> = self
            .entries()
            .await
            .into_iter()
            .filter(|e| e.current_revision_id == revision_id && e.log_id == 0)
            .collect();
        assert_eq!(matches.len(), 1, "expected one entry for revision {}", revision_id);
        matches.into_iter().next().unwrap()
    }

    pub async fn log_entry(&self, log_id: i32) -> FeedEntry {
        self.entries()
            .await
            .into_iter()
            .find(|e| e.log_id == log_id)
            .unwrap_or_else(|| panic!("no entry for log {}", log_id))
    }
}
