//! Pass 3: seed feed entries from the action log.

use tracing::info;

use super::progress::Progress;
use crate::config::RebuildConfig;
use crate::repository::{DbContext, DbError, RecentChangesRepository};

/// Inserts one entry per eligible log record.
pub struct LogSeeder {
    feed: RecentChangesRepository,
    progress: Progress,
}

impl LogSeeder {
    pub fn new(ctx: &DbContext, progress: Progress) -> Self {
        Self {
            feed: ctx.recent_changes(),
            progress,
        }
    }

    /// Returns the number of seeded entries. Restricted log types never
    /// enter the feed; with none left the pass does nothing.
    pub async fn run(&self, config: &RebuildConfig, cutoff: &str) -> Result<usize, DbError> {
        self.progress
            .step("Loading from user, page, and logging tables...");

        let log_types = config.eligible_log_types();
        if log_types.is_empty() {
            info!("No unrestricted log types configured, skipping log entries");
            return Ok(0);
        }

        let seeded = self
            .feed
            .insert_from_logs(cutoff, &log_types, config.batch_limit)
            .await?;
        info!("Seeded {} entries from {} log types", seeded, log_types.len());
        Ok(seeded)
    }
}
