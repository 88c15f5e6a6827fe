//! Diesel-based repository for the `recentchanges` feed table.
//!
//! Holds the set-based statements the rebuild passes are made of. Seeding
//! uses `INSERT ... SELECT` so rows never round-trip through the process.

use diesel::prelude::*;
use diesel::sql_types::{BigInt, Text};
use diesel::sqlite::Sqlite;
use diesel_async::{AsyncConnection, RunQueryDsl};

use super::models::{LinkageScanRow, RecentChangeRecord};
use super::pool::{DbError, DbPool};
use super::util::MAX_BIND_PARAMS;
use crate::models::{ChangeSource, ChangeType, FeedEntry};
use crate::schema::recentchanges;
use crate::with_conn;

/// Linkage values computed for one revision-derived feed entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkageUpdate {
    pub subject_id: i32,
    pub revision_id: i32,
    pub previous_revision_id: i32,
    pub is_new: bool,
    pub change_type: ChangeType,
    pub old_size: Option<i32>,
    pub new_size: Option<i32>,
}

/// An upload log linked to the revision it created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevisionLink {
    pub log_id: i32,
    pub revision_id: i32,
}

/// Outcome of merging duplicate upload entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeCounts {
    pub relinked: usize,
    pub removed: usize,
}

/// Per-actor flag set by role classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorFlag {
    Bot,
    Patrolled,
}

/// Diesel-based recent changes repository.
#[derive(Clone)]
pub struct RecentChangesRepository {
    pool: DbPool,
}

impl RecentChangesRepository {
    /// Create a new repository with an existing pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Delete every feed entry.
    pub async fn truncate(&self) -> Result<usize, DbError> {
        with_conn!(self.pool, conn => {
            diesel::delete(recentchanges::table).execute(&mut conn).await
        })
    }

    /// Seed entries from revisions newer than `cutoff`, newest first.
    pub async fn insert_from_revisions(&self, cutoff: &str, limit: i64) -> Result<usize, DbError> {
        let sql = revision_seed_sql();

        with_conn!(self.pool, conn => {
            diesel::sql_query(sql)
                .bind::<Text, _>(cutoff)
                .bind::<BigInt, _>(limit)
                .execute(&mut conn)
                .await
        })
    }

    /// Seed entries from log records newer than `cutoff` whose type is in `log_types`.
    pub async fn insert_from_logs(
        &self,
        cutoff: &str,
        log_types: &[String],
        limit: i64,
    ) -> Result<usize, DbError> {
        if log_types.is_empty() {
            return Ok(0);
        }

        let sql = log_seed_sql(log_types.len());

        with_conn!(self.pool, conn => {
            let mut query = diesel::sql_query(sql)
                .into_boxed::<Sqlite>()
                .bind::<Text, _>(cutoff.to_string());
            for log_type in log_types {
                query = query.bind::<Text, _>(log_type.clone());
            }
            query.bind::<BigInt, _>(limit).execute(&mut conn).await
        })
    }

    /// Revision-derived entries ordered for the linkage scan.
    ///
    /// Ties on timestamp within a subject are broken by revision id.
    pub async fn linkage_scan(&self) -> Result<Vec<LinkageScanRow>, DbError> {
        with_conn!(self.pool, conn => {
            recentchanges::table
                .filter(recentchanges::rc_logid.eq(0))
                .order((
                    recentchanges::rc_cur_id.asc(),
                    recentchanges::rc_timestamp.asc(),
                    recentchanges::rc_this_oldid.asc(),
                ))
                .select((
                    recentchanges::rc_cur_id,
                    recentchanges::rc_this_oldid,
                    recentchanges::rc_timestamp,
                ))
                .load::<LinkageScanRow>(&mut conn)
                .await
        })
    }

    /// Write linkage updates in a single transaction.
    pub async fn apply_linkage(&self, updates: Vec<LinkageUpdate>) -> Result<usize, DbError> {
        if updates.is_empty() {
            return Ok(0);
        }

        with_conn!(self.pool, conn => {
            conn.transaction(move |conn| {
                Box::pin(async move {
                    let mut applied = 0;
                    for update in &updates {
                        applied += diesel::update(
                            recentchanges::table
                                .filter(recentchanges::rc_cur_id.eq(update.subject_id))
                                .filter(recentchanges::rc_this_oldid.eq(update.revision_id))
                                .filter(recentchanges::rc_logid.eq(0)),
                        )
                        .set((
                            recentchanges::rc_last_oldid.eq(update.previous_revision_id),
                            recentchanges::rc_new.eq(i32::from(update.is_new)),
                            recentchanges::rc_type.eq(update.change_type.as_i32()),
                            recentchanges::rc_source.eq(update.change_type.source().as_str()),
                            recentchanges::rc_old_len.eq(update.old_size),
                            recentchanges::rc_new_len.eq(update.new_size),
                        ))
                        .execute(conn)
                        .await?;
                    }
                    Ok::<_, DbError>(applied)
                })
            })
            .await
        })
    }

    /// Set a flag on every entry authored by one of `actor_names`.
    pub async fn flag_actors(&self, actor_names: &[String], flag: ActorFlag) -> Result<usize, DbError> {
        if actor_names.is_empty() {
            return Ok(0);
        }

        with_conn!(self.pool, conn => {
            let mut updated = 0;
            for chunk in actor_names.chunks(MAX_BIND_PARAMS) {
                let target = recentchanges::table
                    .filter(recentchanges::rc_user_text.eq_any(chunk.to_vec()));
                updated += match flag {
                    ActorFlag::Bot => {
                        diesel::update(target)
                            .set(recentchanges::rc_bot.eq(1))
                            .execute(&mut conn)
                            .await?
                    }
                    ActorFlag::Patrolled => {
                        diesel::update(target)
                            .set(recentchanges::rc_patrolled.eq(1))
                            .execute(&mut conn)
                            .await?
                    }
                };
            }
            Ok(updated)
        })
    }

    /// Collapse upload entries that exist both as a log row and a revision row.
    ///
    /// For each link the log-derived entry takes over the revision id and the
    /// revision-derived entry (the one with `rc_logid = 0`) is deleted.
    pub async fn merge_revision_links(&self, links: Vec<RevisionLink>) -> Result<MergeCounts, DbError> {
        if links.is_empty() {
            return Ok(MergeCounts::default());
        }

        with_conn!(self.pool, conn => {
            conn.transaction(move |conn| {
                Box::pin(async move {
                    let mut counts = MergeCounts::default();
                    for link in &links {
                        counts.relinked += diesel::update(
                            recentchanges::table.filter(recentchanges::rc_logid.eq(link.log_id)),
                        )
                        .set(recentchanges::rc_this_oldid.eq(link.revision_id))
                        .execute(conn)
                        .await?;

                        counts.removed += diesel::delete(
                            recentchanges::table
                                .filter(recentchanges::rc_this_oldid.eq(link.revision_id))
                                .filter(recentchanges::rc_logid.eq(0)),
                        )
                        .execute(conn)
                        .await?;
                    }
                    Ok::<_, DbError>(counts)
                })
            })
            .await
        })
    }

    /// Get all feed entries, newest first.
    pub async fn get_all(&self) -> Result<Vec<FeedEntry>, DbError> {
        with_conn!(self.pool, conn => {
            recentchanges::table
                .order((recentchanges::rc_timestamp.desc(), recentchanges::rc_id.desc()))
                .select(RecentChangeRecord::as_select())
                .load::<RecentChangeRecord>(&mut conn)
                .await
                .and_then(|records| records.into_iter().map(FeedEntry::try_from).collect())
        })
    }

    /// Count feed entries.
    pub async fn count(&self) -> Result<i64, DbError> {
        with_conn!(self.pool, conn => {
            recentchanges::table
                .count()
                .get_result::<i64>(&mut conn)
                .await
        })
    }
}

/// `INSERT ... SELECT` seeding one entry per revision.
///
/// A revision is its page's first when no revision of the same page sorts
/// before it by (timestamp, id).
fn revision_seed_sql() -> String {
    format!(
        r#"INSERT INTO recentchanges (
               rc_timestamp, rc_user, rc_user_text, rc_namespace, rc_title, rc_comment,
               rc_minor, rc_bot, rc_new, rc_patrolled, rc_cur_id, rc_this_oldid,
               rc_last_oldid, rc_type, rc_source, rc_deleted, rc_logid
           )
           SELECT
               rev_timestamp, rev_user, rev_user_text, page_namespace, page_title, rev_comment,
               rev_minor_edit, 0, first_rev, 0, page_id, rev_id,
               0,
               CASE WHEN first_rev = 1 THEN {new_type} ELSE {edit_type} END,
               CASE WHEN first_rev = 1 THEN '{new_source}' ELSE '{edit_source}' END,
               rev_deleted, 0
           FROM (
               SELECT r.rev_timestamp, r.rev_user, r.rev_user_text, r.rev_comment,
                      r.rev_minor_edit, r.rev_deleted, r.rev_id,
                      p.page_id, p.page_namespace, p.page_title,
                      CASE WHEN EXISTS (
                          SELECT 1 FROM revision earlier
                          WHERE earlier.rev_page = r.rev_page
                            AND (earlier.rev_timestamp < r.rev_timestamp
                                 OR (earlier.rev_timestamp = r.rev_timestamp
                                     AND earlier.rev_id < r.rev_id))
                      ) THEN 0 ELSE 1 END AS first_rev
               FROM revision r
               JOIN page p ON p.page_id = r.rev_page
               WHERE r.rev_timestamp > ?
               ORDER BY r.rev_timestamp DESC, r.rev_id DESC
               LIMIT ?
           ) AS seeded"#,
        new_type = ChangeType::New.as_i32(),
        edit_type = ChangeType::Edit.as_i32(),
        new_source = ChangeSource::New.as_str(),
        edit_source = ChangeSource::Edit.as_str(),
    )
}

/// `INSERT ... SELECT` seeding one entry per log record.
///
/// Logs about pages that no longer exist get subject id 0: SQLite does not
/// cascade page deletions into the logging table.
fn log_seed_sql(type_count: usize) -> String {
    let placeholders = vec!["?"; type_count].join(", ");
    format!(
        r#"INSERT INTO recentchanges (
               rc_timestamp, rc_user, rc_user_text, rc_namespace, rc_title, rc_comment,
               rc_minor, rc_bot, rc_new, rc_patrolled, rc_cur_id, rc_this_oldid,
               rc_last_oldid, rc_type, rc_source, rc_deleted, rc_logid,
               rc_log_type, rc_log_action, rc_params
           )
           SELECT
               l.log_timestamp, l.log_user, u.user_name, l.log_namespace, l.log_title,
               l.log_comment, 0, 0, 0, 1, COALESCE(p.page_id, 0), 0,
               0, {log_type}, '{log_source}', l.log_deleted, l.log_id,
               l.log_type, l.log_action, l.log_params
           FROM logging l
           JOIN "user" u ON u.user_id = l.log_user
           LEFT JOIN page p ON p.page_namespace = l.log_namespace AND p.page_title = l.log_title
           WHERE l.log_timestamp > ?
             AND l.log_type IN ({placeholders})
           ORDER BY l.log_timestamp DESC, l.log_id DESC
           LIMIT ?"#,
        log_type = ChangeType::Log.as_i32(),
        log_source = ChangeSource::Log.as_str(),
        placeholders = placeholders,
    )
}
