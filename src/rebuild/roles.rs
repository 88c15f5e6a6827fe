//! Pass 4: flag entries by bot and autopatrol accounts.

use tracing::info;

use super::progress::Progress;
use crate::config::RebuildConfig;
use crate::permissions::PermissionLookup;
use crate::repository::{ActorFlag, DbContext, DbError, RecentChangesRepository, UserRepository};

/// Right whose holders' entries are hidden as bot edits.
pub const BOT_RIGHT: &str = "bot";
/// Right whose holders' entries count as already patrolled.
pub const AUTOPATROL_RIGHT: &str = "autopatrol";

/// Counters reported by role classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoleStats {
    pub bot_actors: usize,
    pub bot_entries: usize,
    pub patrol_actors: usize,
    pub patrol_entries: usize,
}

/// Applies role-based flags with set-based updates.
pub struct RoleClassifier<'a> {
    feed: RecentChangesRepository,
    users: UserRepository,
    permissions: &'a dyn PermissionLookup,
    progress: Progress,
}

impl<'a> RoleClassifier<'a> {
    pub fn new(ctx: &DbContext, permissions: &'a dyn PermissionLookup, progress: Progress) -> Self {
        Self {
            feed: ctx.recent_changes(),
            users: ctx.users(),
            permissions,
            progress,
        }
    }

    /// Idempotent: flags are only ever set, never cleared.
    pub async fn run(&self, config: &RebuildConfig) -> Result<RoleStats, DbError> {
        let mut stats = RoleStats::default();

        let bot_groups = self.permissions.groups_with_permission(BOT_RIGHT);
        if !bot_groups.is_empty() {
            self.progress.step("Flagging bot account edits...");
            (stats.bot_actors, stats.bot_entries) =
                self.flag_groups(&bot_groups, ActorFlag::Bot).await?;
        }

        if config.use_rc_patrol && !config.miser_mode {
            let patrol_groups = self.permissions.groups_with_permission(AUTOPATROL_RIGHT);
            if !patrol_groups.is_empty() {
                self.progress.step("Flagging auto-patrolled edits...");
                (stats.patrol_actors, stats.patrol_entries) =
                    self.flag_groups(&patrol_groups, ActorFlag::Patrolled).await?;
            }
        }

        info!(
            "Flagged {} bot entries ({} actors), {} patrolled entries ({} actors)",
            stats.bot_entries, stats.bot_actors, stats.patrol_entries, stats.patrol_actors
        );
        Ok(stats)
    }

    async fn flag_groups(&self, groups: &[String], flag: ActorFlag) -> Result<(usize, usize), DbError> {
        let names = self.users.names_in_groups(groups).await?;
        if names.is_empty() {
            return Ok((0, 0));
        }
        let entries = self.feed.flag_actors(&names, flag).await?;
        Ok((names.len(), entries))
    }
}
