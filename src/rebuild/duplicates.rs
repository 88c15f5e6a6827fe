//! Pass 5: collapse uploads recorded both as a revision and a log entry.

use tracing::{info, warn};

use super::progress::Progress;
use crate::repository::{
    DbContext, DbError, LogAssociation, LoggingRepository, RecentChangesRepository, RevisionLink,
};

/// Log type whose records may duplicate a revision entry.
pub const UPLOAD_LOG_TYPE: &str = "upload";
/// `log_search` field linking a log record to the revision it created.
pub const ASSOCIATED_REV_FIELD: &str = "associated_rev_id";

/// Counters reported by duplicate resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuplicateStats {
    /// Usable log to revision links found.
    pub links: usize,
    /// Log entries that took over a revision id.
    pub relinked: usize,
    /// Revision entries deleted as duplicates.
    pub removed: usize,
    /// Associations whose value is not a revision id.
    pub skipped: Vec<LogAssociation>,
}

/// Split associations into revision links and unusable values.
pub fn parse_links(associations: Vec<LogAssociation>) -> (Vec<RevisionLink>, Vec<LogAssociation>) {
    let mut links = Vec::with_capacity(associations.len());
    let mut skipped = Vec::new();
    for association in associations {
        match association.value.trim().parse::<i32>() {
            Ok(revision_id) if revision_id > 0 => links.push(RevisionLink {
                log_id: association.log_id,
                revision_id,
            }),
            _ => skipped.push(association),
        }
    }
    (links, skipped)
}

/// Keeps the log entry of each upload and drops its revision twin.
pub struct DuplicateResolver {
    feed: RecentChangesRepository,
    logging: LoggingRepository,
    progress: Progress,
}

impl DuplicateResolver {
    pub fn new(ctx: &DbContext, progress: Progress) -> Self {
        Self {
            feed: ctx.recent_changes(),
            logging: ctx.logging(),
            progress,
        }
    }

    pub async fn run(&self) -> Result<DuplicateStats, DbError> {
        self.progress
            .step("Removing duplicate revision and logging entries...");

        let associations = self
            .logging
            .associations(UPLOAD_LOG_TYPE, ASSOCIATED_REV_FIELD)
            .await?;
        let (links, skipped) = parse_links(associations);

        for association in &skipped {
            warn!(
                "Log {} has non-numeric {} '{}', skipping",
                association.log_id, ASSOCIATED_REV_FIELD, association.value
            );
            self.progress.warn(&format!(
                "Log {} has invalid {} '{}', skipped",
                association.log_id, ASSOCIATED_REV_FIELD, association.value
            ));
        }

        let link_count = links.len();
        let merged = self.feed.merge_revision_links(links).await?;
        info!(
            "Resolved {} upload links: {} relinked, {} duplicates removed",
            link_count, merged.relinked, merged.removed
        );

        Ok(DuplicateStats {
            links: link_count,
            relinked: merged.relinked,
            removed: merged.removed,
            skipped,
        })
    }
}
