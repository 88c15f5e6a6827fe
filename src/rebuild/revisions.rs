//! Pass 1: seed feed entries from revision history.

use tracing::info;

use super::progress::Progress;
use crate::config::RebuildConfig;
use crate::repository::{DbContext, DbError, RecentChangesRepository};

/// Wipes the feed table and reseeds it from recent revisions.
pub struct RevisionSeeder {
    feed: RecentChangesRepository,
    progress: Progress,
}

impl RevisionSeeder {
    pub fn new(ctx: &DbContext, progress: Progress) -> Self {
        Self {
            feed: ctx.recent_changes(),
            progress,
        }
    }

    /// Truncate `recentchanges`, then insert one entry per revision newer
    /// than `cutoff`. Returns the number of seeded entries.
    pub async fn run(&self, config: &RebuildConfig, cutoff: &str) -> Result<usize, DbError> {
        let cleared = self.feed.truncate().await?;
        info!("Cleared {} existing feed entries", cleared);

        self.progress.step("Loading from page and revision tables...");
        self.progress.detail(&config.max_age_description());

        let seeded = self
            .feed
            .insert_from_revisions(cutoff, config.batch_limit)
            .await?;
        info!("Seeded {} entries from revisions after {}", seeded, cutoff);
        Ok(seeded)
    }
}
