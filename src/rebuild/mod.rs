//! The rebuild pipeline.
//!
//! Five passes run in a fixed order over the `recentchanges` table, each
//! depending on the previous ones having completed:
//!
//! 1. [`RevisionSeeder`] wipes the table and seeds it from revisions
//! 2. [`LinkageBuilder`] links entries to their predecessors
//! 3. [`LogSeeder`] seeds entries from the action log
//! 4. [`RoleClassifier`] flags bot and autopatrolled entries
//! 5. [`DuplicateResolver`] merges uploads seeded from both sources
//!
//! Afterwards [`FeedPurger`] drops cached feed timestamps.

mod duplicates;
mod feeds;
mod linkage;
mod logs;
mod progress;
mod roles;
mod revisions;

pub use duplicates::{parse_links, DuplicateResolver, DuplicateStats};
pub use feeds::{feed_timestamp_key, FeedPurger};
pub use linkage::{plan_linkage, subject_starts, LinkageBuilder, LinkagePlan, LinkageState, LinkageStats};
pub use logs::LogSeeder;
pub use progress::{Progress, ProgressBuffer};
pub use revisions::RevisionSeeder;
pub use roles::{RoleClassifier, RoleStats, AUTOPATROL_RIGHT, BOT_RIGHT};

use chrono::{DateTime, Utc};
use tracing::info;

use crate::cache::{CacheError, ObjectCache};
use crate::config::RebuildConfig;
use crate::permissions::PermissionLookup;
use crate::repository::{DbContext, DbError};

/// Errors that abort a rebuild.
#[derive(Debug, thiserror::Error)]
pub enum RebuildError {
    #[error("{0}")]
    Database(#[from] DbError),
    #[error("{0}")]
    Cache(#[from] CacheError),
}

/// What one rebuild did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebuildReport {
    pub cutoff: String,
    pub revision_entries: usize,
    pub linkage: LinkageStats,
    pub log_entries: usize,
    pub roles: RoleStats,
    pub duplicates: DuplicateStats,
    pub purged_feeds: usize,
}

/// Drives the passes in order against one database.
pub struct Rebuilder<'a> {
    ctx: DbContext,
    config: &'a RebuildConfig,
    permissions: &'a dyn PermissionLookup,
    cache: &'a dyn ObjectCache,
    progress: Progress,
    now: DateTime<Utc>,
}

impl<'a> Rebuilder<'a> {
    pub fn new(
        ctx: DbContext,
        config: &'a RebuildConfig,
        permissions: &'a dyn PermissionLookup,
        cache: &'a dyn ObjectCache,
    ) -> Self {
        Self {
            ctx,
            config,
            permissions,
            cache,
            progress: Progress::stdout(),
            now: Utc::now(),
        }
    }

    /// Send progress lines somewhere other than stdout.
    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = progress;
        self
    }

    /// Evaluate the lookback window relative to `now` instead of the wall clock.
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Run every pass, then purge feed caches.
    ///
    /// A failure in any pass aborts the run; the table is left partially
    /// rebuilt and the next run starts over from scratch.
    pub async fn run(&self) -> Result<RebuildReport, RebuildError> {
        let cutoff = self.config.cutoff(self.now);
        info!("Rebuilding recent changes newer than {}", cutoff);

        let revision_entries = RevisionSeeder::new(&self.ctx, self.progress.clone())
            .run(self.config, &cutoff)
            .await?;
        let linkage = LinkageBuilder::new(&self.ctx, self.progress.clone())
            .run()
            .await?;
        let log_entries = LogSeeder::new(&self.ctx, self.progress.clone())
            .run(self.config, &cutoff)
            .await?;
        let roles = RoleClassifier::new(&self.ctx, self.permissions, self.progress.clone())
            .run(self.config)
            .await?;
        let duplicates = DuplicateResolver::new(&self.ctx, self.progress.clone())
            .run()
            .await?;
        let purged_feeds = FeedPurger::new(self.cache, self.progress.clone())
            .run(self.config)
            .await?;

        self.progress.done();

        Ok(RebuildReport {
            cutoff,
            revision_entries,
            linkage,
            log_entries,
            roles,
            duplicates,
            purged_feeds,
        })
    }
}
