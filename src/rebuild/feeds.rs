//! Cache invalidation: drop cached feed timestamps after the rebuild.

use tracing::info;

use super::progress::Progress;
use crate::cache::{CacheResult, ObjectCache};
use crate::config::RebuildConfig;

/// Cache key holding the last-generated timestamp of a syndication feed.
pub fn feed_timestamp_key(key_prefix: &str, feed: &str) -> String {
    format!("{}:rcfeed:{}:timestamp", key_prefix, feed)
}

/// Purges one timestamp key per configured feed.
pub struct FeedPurger<'a> {
    cache: &'a dyn ObjectCache,
    progress: Progress,
}

impl<'a> FeedPurger<'a> {
    pub fn new(cache: &'a dyn ObjectCache, progress: Progress) -> Self {
        Self { cache, progress }
    }

    /// Returns how many keys were actually present.
    pub async fn run(&self, config: &RebuildConfig) -> CacheResult<usize> {
        self.progress.step("Deleting feed timestamps.");

        let mut purged = 0;
        for feed in config.feed_classes.keys() {
            let key = feed_timestamp_key(&config.key_prefix, feed);
            if self.cache.delete(&key).await? {
                purged += 1;
            }
            info!("Purged {} from {} cache", key, self.cache.name());
        }
        Ok(purged)
    }
}
