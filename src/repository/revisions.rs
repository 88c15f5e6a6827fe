//! Diesel-based repository for the read-only `revision` table.

use std::collections::HashMap;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::pool::{DbError, DbPool};
use super::util::MAX_BIND_PARAMS;
use crate::schema::revision;
use crate::with_conn;

/// The latest revision of a subject before some point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorRevision {
    pub revision_id: i32,
    pub size: Option<i32>,
}

/// First scanned revision of a subject: where the earlier-revision lookup
/// starts from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectStart {
    pub subject_id: i32,
    pub timestamp: String,
    pub revision_id: i32,
}

/// Diesel-based revision repository.
#[derive(Clone)]
pub struct RevisionRepository {
    pool: DbPool,
}

impl RevisionRepository {
    /// Create a new repository with an existing pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Previous revision for each subject start.
    ///
    /// A revision sharing the start's timestamp counts as earlier when its id
    /// is lower. Subjects with no earlier revision are absent from the map.
    pub async fn previous_revisions(
        &self,
        subjects: &[SubjectStart],
    ) -> Result<HashMap<i32, PriorRevision>, DbError> {
        let mut found = HashMap::new();
        if subjects.is_empty() {
            return Ok(found);
        }

        with_conn!(self.pool, conn => {
            for start in subjects {
                if let Some(prior) = lookup_previous(&mut conn, start).await? {
                    found.insert(start.subject_id, prior);
                }
            }
            Ok(found)
        })
    }

    /// Stored sizes for the given revision ids.
    ///
    /// Unknown ids are absent from the map; known ids without a recorded
    /// size map to `None`.
    pub async fn sizes(&self, revision_ids: &[i32]) -> Result<HashMap<i32, Option<i32>>, DbError> {
        let mut sizes = HashMap::with_capacity(revision_ids.len());
        if revision_ids.is_empty() {
            return Ok(sizes);
        }

        with_conn!(self.pool, conn => {
            for chunk in revision_ids.chunks(MAX_BIND_PARAMS) {
                let rows: Vec<(i32, Option<i32>)> = revision::table
                    .filter(revision::rev_id.eq_any(chunk.to_vec()))
                    .select((revision::rev_id, revision::rev_len))
                    .load(&mut conn)
                    .await?;
                sizes.extend(rows);
            }
            Ok(sizes)
        })
    }
}

async fn lookup_previous(
    conn: &mut super::pool::SqliteConn,
    start: &SubjectStart,
) -> Result<Option<PriorRevision>, DbError> {
    let before = start.timestamp.as_str();
    revision::table
        .filter(revision::rev_page.eq(start.subject_id))
        .filter(
            revision::rev_timestamp.lt(before).or(revision::rev_timestamp
                .eq(before)
                .and(revision::rev_id.lt(start.revision_id))),
        )
        .order((revision::rev_timestamp.desc(), revision::rev_id.desc()))
        .select((revision::rev_id, revision::rev_len))
        .first::<(i32, Option<i32>)>(conn)
        .await
        .optional()
        .map(|row| {
            row.map(|(revision_id, size)| PriorRevision { revision_id, size })
        })
}
