//! Pass 2: link each revision entry to its predecessor and record sizes.
//!
//! The scan walks revision-derived entries ordered by subject, then time,
//! carrying a [`LinkageState`] from one entry to the next. Lookups against
//! the revision table are batched up front so the fold itself is pure.

use std::collections::HashMap;

use tracing::{info, warn};

use super::progress::Progress;
use crate::models::ChangeType;
use crate::repository::{
    DbContext, DbError, LinkageScanRow, LinkageUpdate, PriorRevision, RecentChangesRepository,
    RevisionRepository, SubjectStart,
};

/// Carried-forward state of the linkage scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkageState {
    pub subject_id: i32,
    pub previous_revision_id: i32,
    pub previous_size: Option<i32>,
}

impl LinkageState {
    /// State at the start of a subject, seeded from its last earlier revision.
    fn enter(subject_id: i32, prior: Option<&PriorRevision>) -> Self {
        Self {
            subject_id,
            previous_revision_id: prior.map_or(0, |p| p.revision_id),
            previous_size: prior.and_then(|p| p.size),
        }
    }
}

/// Counters reported by the linkage pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkageStats {
    /// Entries updated.
    pub entries: usize,
    /// Distinct subjects visited.
    pub subjects: usize,
    /// Subjects whose first entry had no earlier revision.
    pub new_subjects: usize,
    /// Revision ids of entries skipped for lacking a subject.
    pub skipped: Vec<i32>,
}

/// Result of folding the scan: the updates to write and what was seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkagePlan {
    pub updates: Vec<LinkageUpdate>,
    pub stats: LinkageStats,
}

/// First entry of every subject in scan order.
pub fn subject_starts(rows: &[LinkageScanRow]) -> Vec<SubjectStart> {
    let mut starts: Vec<SubjectStart> = Vec::new();
    for row in rows.iter().filter(|r| r.subject_id != 0) {
        if starts.last().map(|s| s.subject_id) != Some(row.subject_id) {
            starts.push(SubjectStart {
                subject_id: row.subject_id,
                timestamp: row.timestamp.clone(),
                revision_id: row.revision_id,
            });
        }
    }
    starts
}

/// Fold the ordered scan into linkage updates.
///
/// `priors` holds the last revision before each subject's first entry;
/// `sizes` holds the stored size of every scanned revision.
pub fn plan_linkage(
    rows: &[LinkageScanRow],
    priors: &HashMap<i32, PriorRevision>,
    sizes: &HashMap<i32, Option<i32>>,
) -> LinkagePlan {
    let mut plan = LinkagePlan::default();
    let mut state: Option<LinkageState> = None;

    for row in rows {
        if row.subject_id == 0 {
            plan.stats.skipped.push(row.revision_id);
            continue;
        }

        let (current, is_new) = match state {
            Some(s) if s.subject_id == row.subject_id => (s, false),
            _ => {
                let prior = priors.get(&row.subject_id);
                plan.stats.subjects += 1;
                if prior.is_none() {
                    plan.stats.new_subjects += 1;
                }
                (LinkageState::enter(row.subject_id, prior), prior.is_none())
            }
        };

        let size = sizes.get(&row.revision_id).copied().flatten();
        plan.updates.push(LinkageUpdate {
            subject_id: row.subject_id,
            revision_id: row.revision_id,
            previous_revision_id: current.previous_revision_id,
            is_new,
            change_type: ChangeType::for_revision(is_new),
            old_size: current.previous_size,
            new_size: size,
        });

        state = Some(LinkageState {
            subject_id: row.subject_id,
            previous_revision_id: row.revision_id,
            previous_size: size,
        });
    }

    plan.stats.entries = plan.updates.len();
    plan
}

/// Backfills `rc_last_oldid`, new-page flags and sizes.
pub struct LinkageBuilder {
    feed: RecentChangesRepository,
    revisions: RevisionRepository,
    progress: Progress,
}

impl LinkageBuilder {
    pub fn new(ctx: &DbContext, progress: Progress) -> Self {
        Self {
            feed: ctx.recent_changes(),
            revisions: ctx.revisions(),
            progress,
        }
    }

    pub async fn run(&self) -> Result<LinkageStats, DbError> {
        self.progress.step("Updating links and size differences...");

        let rows = self.feed.linkage_scan().await?;
        let priors = self.revisions.previous_revisions(&subject_starts(&rows)).await?;
        let revision_ids: Vec<i32> = rows.iter().map(|r| r.revision_id).collect();
        let sizes = self.revisions.sizes(&revision_ids).await?;

        let plan = plan_linkage(&rows, &priors, &sizes);
        for revision_id in &plan.stats.skipped {
            warn!("Feed entry for revision {} has no subject id, skipping", revision_id);
            self.progress
                .warn(&format!("No subject id for revision {}, skipped", revision_id));
        }

        self.feed.apply_linkage(plan.updates).await?;
        info!(
            "Linked {} entries across {} subjects ({} new)",
            plan.stats.entries, plan.stats.subjects, plan.stats.new_subjects
        );
        Ok(plan.stats)
    }
}
