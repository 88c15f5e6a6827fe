//! The rebuild command.

use chrono::{DateTime, Utc};
use console::style;

use crate::cache::{self, CacheBackend};
use crate::config::{Config, Settings};
use crate::rebuild::Rebuilder;

/// Rebuild the feed table in the configured database.
pub async fn cmd_rebuild(
    settings: &Settings,
    config: &Config,
    init_schema: bool,
    now: Option<DateTime<Utc>>,
) -> anyhow::Result<()> {
    tracing::info!("Using database {}", settings.display_database_url());
    let ctx = settings.create_db_context()?;

    if init_schema {
        ctx.init_schema().await?;
        println!("{} Schema initialized", style("✓").green());
    }

    let backend = CacheBackend::parse(&config.rebuild.cache)?;
    let cache = cache::open(&backend, ctx.pool()).await?;
    let permissions = config.rebuild.permissions();

    let mut rebuilder = Rebuilder::new(ctx, &config.rebuild, &permissions, cache.as_ref());
    if let Some(now) = now {
        rebuilder = rebuilder.with_now(now);
    }

    let report = rebuilder.run().await?;
    tracing::info!(
        "Rebuilt feed: {} revision entries, {} log entries, {} duplicates removed",
        report.revision_entries,
        report.log_entries,
        report.duplicates.removed
    );
    Ok(())
}
