//! End-to-end rebuild tests against temporary SQLite wikis.

mod common;

use common::{last_year, march, now, TestWiki};

use rcrebuild::cache::{MemoryCache, ObjectCache};
use rcrebuild::config::RebuildConfig;
use rcrebuild::models::{ChangeSource, ChangeType};
use rcrebuild::permissions::default_group_permissions;
use rcrebuild::rebuild::{
    feed_timestamp_key, DuplicateResolver, LinkageBuilder, Progress, RebuildReport, Rebuilder,
    RevisionSeeder, RoleClassifier,
};

const ALICE: (i32, &str) = (1, "Alice");
const ROBOT: (i32, &str) = (2, "Robot");
const ADMIN: (i32, &str) = (3, "Admin");

async fn rebuild(wiki: &TestWiki, config: &RebuildConfig) -> RebuildReport {
    let permissions = default_group_permissions();
    let cache = MemoryCache::new();
    Rebuilder::new(wiki.ctx.clone(), config, &permissions, &cache)
        .with_progress(Progress::silent())
        .with_now(now())
        .run()
        .await
        .unwrap()
}

fn users(wiki: &TestWiki) {
    wiki.user(ALICE.0, ALICE.1);
    wiki.user(ROBOT.0, ROBOT.1);
    wiki.user(ADMIN.0, ADMIN.1);
}

#[tokio::test]
async fn test_seeds_every_revision_in_window() {
    let wiki = TestWiki::new().await;
    users(&wiki);
    wiki.page(1, 0, "Alpha");
    wiki.page(2, 0, "Beta");
    wiki.revision(10, 1, &last_year(1), ALICE, Some(10));
    wiki.revision(11, 1, &march(1, 0), ALICE, Some(20));
    wiki.revision(12, 2, &march(2, 0), ALICE, Some(30));
    wiki.revision(13, 2, &march(3, 0), ALICE, Some(40));
    // Stale row from a previous run must not survive.
    wiki.feed_row(2, 999, &march(4, 0));

    let report = rebuild(&wiki, &RebuildConfig::default()).await;

    assert_eq!(report.revision_entries, 3);
    let entries = wiki.entries().await;
    assert_eq!(entries.len(), 3);
    for (subject, revision) in [(1, 11), (2, 12), (2, 13)] {
        let entry = wiki.revision_entry(revision).await;
        assert_eq!(entry.subject_id, subject);
        assert_eq!(entry.actor_name, "Alice");
        assert_eq!(entry.comment, format!("edit {}", revision));
    }
    assert!(entries.iter().all(|e| e.current_revision_id != 10));
    assert!(entries.iter().all(|e| e.current_revision_id != 999));
}

#[tokio::test]
async fn test_batch_limit_keeps_newest() {
    let wiki = TestWiki::new().await;
    users(&wiki);
    wiki.page(1, 0, "Alpha");
    wiki.revision(1, 1, &march(1, 0), ALICE, None);
    wiki.revision(2, 1, &march(2, 0), ALICE, None);
    wiki.revision(3, 1, &march(3, 0), ALICE, None);

    let config = RebuildConfig {
        batch_limit: 2,
        ..Default::default()
    };
    let report = rebuild(&wiki, &config).await;

    assert_eq!(report.revision_entries, 2);
    let mut ids: Vec<i32> = wiki
        .entries()
        .await
        .iter()
        .map(|e| e.current_revision_id)
        .collect();
    ids.sort();
    assert_eq!(ids, vec![2, 3]);
}

#[tokio::test]
async fn test_two_revision_linkage() {
    let wiki = TestWiki::new().await;
    users(&wiki);
    wiki.page(1, 0, "Alpha");
    wiki.revision(100, 1, &march(5, 10), ALICE, Some(100));
    wiki.revision(101, 1, &march(5, 11), ALICE, Some(150));

    rebuild(&wiki, &RebuildConfig::default()).await;

    let first = wiki.revision_entry(100).await;
    assert_eq!(first.previous_revision_id, 0);
    assert!(first.is_new);
    assert_eq!(first.change_type, ChangeType::New);
    assert_eq!(first.change_source, ChangeSource::New);
    assert_eq!(first.old_size, None);
    assert_eq!(first.new_size, Some(100));

    let second = wiki.revision_entry(101).await;
    assert_eq!(second.previous_revision_id, 100);
    assert!(!second.is_new);
    assert_eq!(second.change_type, ChangeType::Edit);
    assert_eq!(second.change_source, ChangeSource::Edit);
    assert_eq!(second.old_size, Some(100));
    assert_eq!(second.new_size, Some(150));
    assert_eq!(second.size_delta(), Some(50));
}

#[tokio::test]
async fn test_linkage_reaches_before_window() {
    let wiki = TestWiki::new().await;
    users(&wiki);
    wiki.page(2, 0, "Beta");
    wiki.revision(30, 2, &last_year(1), ALICE, Some(40));
    wiki.revision(31, 2, &last_year(2), ALICE, Some(50));
    wiki.revision(32, 2, &march(7, 0), ALICE, Some(60));

    let report = rebuild(&wiki, &RebuildConfig::default()).await;

    let entry = wiki.revision_entry(32).await;
    assert_eq!(entry.previous_revision_id, 31);
    assert_eq!(entry.old_size, Some(50));
    assert!(!entry.is_new);
    assert_eq!(entry.change_type, ChangeType::Edit);
    assert_eq!(report.linkage.new_subjects, 0);
}

#[tokio::test]
async fn test_same_timestamp_orders_by_revision_id() {
    let wiki = TestWiki::new().await;
    users(&wiki);
    wiki.page(3, 0, "Gamma");
    wiki.revision(21, 3, &march(9, 0), ALICE, Some(5));
    wiki.revision(20, 3, &march(9, 0), ALICE, Some(3));

    rebuild(&wiki, &RebuildConfig::default()).await;

    let first = wiki.revision_entry(20).await;
    assert!(first.is_new);
    assert_eq!(first.previous_revision_id, 0);

    let second = wiki.revision_entry(21).await;
    assert!(!second.is_new);
    assert_eq!(second.previous_revision_id, 20);
    assert_eq!(second.old_size, Some(3));
}

#[tokio::test]
async fn test_same_timestamp_predecessor_outside_batch() {
    let wiki = TestWiki::new().await;
    users(&wiki);
    wiki.page(3, 0, "Gamma");
    wiki.revision(20, 3, &march(9, 0), ALICE, Some(3));
    wiki.revision(21, 3, &march(9, 0), ALICE, Some(5));

    let config = RebuildConfig {
        batch_limit: 1,
        ..Default::default()
    };
    let report = rebuild(&wiki, &config).await;

    assert_eq!(report.revision_entries, 1);
    let entry = wiki.revision_entry(21).await;
    assert!(!entry.is_new);
    assert_eq!(entry.previous_revision_id, 20);
    assert_eq!(entry.old_size, Some(3));
    assert_eq!(entry.change_type, ChangeType::Edit);
}

#[tokio::test]
async fn test_minor_and_visibility_flags() {
    let wiki = TestWiki::new().await;
    users(&wiki);
    wiki.page(1, 0, "Alpha");
    wiki.revision(5, 1, &march(1, 0), ALICE, Some(1));
    wiki.revision(6, 1, &march(1, 1), ALICE, Some(2));
    wiki.revision_flags(6, true, 4);
    wiki.log(1, "delete", "delete", &march(2, 0), ADMIN.0, 0, "Alpha");
    wiki.log_deleted(1, 1);

    rebuild(&wiki, &RebuildConfig::default()).await;

    let plain = wiki.revision_entry(5).await;
    assert!(!plain.is_minor);
    assert_eq!(plain.visibility_mask, 0);

    let flagged = wiki.revision_entry(6).await;
    assert!(flagged.is_minor);
    assert_eq!(flagged.visibility_mask, 4);

    let log = wiki.log_entry(1).await;
    assert!(!log.is_minor);
    assert_eq!(log.visibility_mask, 1);
}

#[tokio::test]
async fn test_linkage_skips_rows_without_subject() {
    let wiki = TestWiki::new().await;
    users(&wiki);
    wiki.page(1, 0, "Alpha");
    wiki.revision(5, 1, &march(1, 0), ALICE, Some(1));
    wiki.feed_row(0, 77, &march(1, 0));
    wiki.feed_row(1, 5, &march(1, 0));

    let (progress, output) = Progress::buffer();
    let stats = LinkageBuilder::new(&wiki.ctx, progress).run().await.unwrap();

    assert_eq!(stats.skipped, vec![77]);
    assert_eq!(stats.entries, 1);
    assert!(output.contents().contains("No subject id for revision 77"));
    assert!(wiki.revision_entry(5).await.is_new);
}

#[tokio::test]
async fn test_log_entries() {
    let wiki = TestWiki::new().await;
    users(&wiki);
    wiki.page(1, 0, "Alpha");
    wiki.log(1, "block", "block", &march(2, 0), ALICE.0, 2, "Vandal");
    wiki.log(2, "suppress", "event", &march(2, 1), ADMIN.0, 0, "Alpha");
    wiki.log(3, "protect", "protect", &march(2, 2), ADMIN.0, 0, "Alpha");
    wiki.log(4, "move", "move", &last_year(3), ADMIN.0, 0, "Alpha");

    let report = rebuild(&wiki, &RebuildConfig::default()).await;

    assert_eq!(report.log_entries, 2);

    let protect = wiki.log_entry(3).await;
    assert_eq!(protect.change_type, ChangeType::Log);
    assert_eq!(protect.change_source, ChangeSource::Log);
    assert!(protect.is_patrolled);
    assert!(!protect.is_new);
    assert_eq!(protect.subject_id, 1);
    assert_eq!(protect.current_revision_id, 0);
    assert_eq!(protect.actor_name, "Admin");
    assert_eq!(protect.log_type.as_deref(), Some("protect"));
    assert_eq!(protect.log_action.as_deref(), Some("protect"));
    assert_eq!(protect.log_params.as_deref(), Some("params-3"));

    // No such page: subject falls back to 0.
    let block = wiki.log_entry(1).await;
    assert_eq!(block.subject_id, 0);
    assert_eq!(block.title, "Vandal");

    let entries = wiki.entries().await;
    assert!(entries.iter().all(|e| e.log_id != 2 && e.log_id != 4));
    assert!(entries.iter().all(|e| e.is_consistent()));
}

#[tokio::test]
async fn test_no_eligible_log_types() {
    let wiki = TestWiki::new().await;
    users(&wiki);
    wiki.log(1, "suppress", "event", &march(2, 0), ADMIN.0, 0, "Alpha");

    let config = RebuildConfig {
        log_types: vec!["suppress".to_string()],
        ..Default::default()
    };
    let report = rebuild(&wiki, &config).await;

    assert_eq!(report.log_entries, 0);
    assert!(wiki.entries().await.is_empty());
}

#[tokio::test]
async fn test_role_flags_are_idempotent() {
    let wiki = TestWiki::new().await;
    users(&wiki);
    wiki.group(ROBOT.0, "bot");
    wiki.group(ADMIN.0, "sysop");
    wiki.page(1, 0, "Alpha");
    wiki.revision(1, 1, &march(1, 0), ALICE, None);
    wiki.revision(2, 1, &march(1, 1), ROBOT, None);
    wiki.revision(3, 1, &march(1, 2), ADMIN, None);

    let report = rebuild(&wiki, &RebuildConfig::default()).await;
    assert_eq!(report.roles.bot_actors, 1);
    assert_eq!(report.roles.bot_entries, 1);
    assert_eq!(report.roles.patrol_actors, 2);
    assert_eq!(report.roles.patrol_entries, 2);

    let flags = |entries: Vec<rcrebuild::models::FeedEntry>| {
        let mut flags: Vec<(i32, bool, bool)> = entries
            .iter()
            .map(|e| (e.current_revision_id, e.is_bot, e.is_patrolled))
            .collect();
        flags.sort();
        flags
    };
    let expected = vec![(1, false, false), (2, true, true), (3, false, true)];
    assert_eq!(flags(wiki.entries().await), expected);

    let permissions = default_group_permissions();
    let again = RoleClassifier::new(&wiki.ctx, &permissions, Progress::silent())
        .run(&RebuildConfig::default())
        .await
        .unwrap();
    assert_eq!(again, report.roles);
    assert_eq!(flags(wiki.entries().await), expected);
}

#[tokio::test]
async fn test_miser_mode_skips_autopatrol() {
    let wiki = TestWiki::new().await;
    users(&wiki);
    wiki.group(ADMIN.0, "sysop");
    wiki.group(ROBOT.0, "bot");
    wiki.page(1, 0, "Alpha");
    wiki.revision(1, 1, &march(1, 0), ADMIN, None);
    wiki.revision(2, 1, &march(1, 1), ROBOT, None);

    let config = RebuildConfig {
        miser_mode: true,
        ..Default::default()
    };
    let report = rebuild(&wiki, &config).await;

    assert_eq!(report.roles.patrol_entries, 0);
    assert!(!wiki.revision_entry(1).await.is_patrolled);
    let bot = wiki.revision_entry(2).await;
    assert!(bot.is_bot);
    assert!(!bot.is_patrolled);
}

#[tokio::test]
async fn test_upload_deduplication() {
    let wiki = TestWiki::new().await;
    users(&wiki);
    wiki.page(9, 6, "Photo.jpg");
    wiki.revision(500, 9, &march(10, 0), ALICE, Some(2048));
    wiki.log(40, "upload", "upload", &march(10, 0), ALICE.0, 6, "Photo.jpg");
    wiki.log_search("associated_rev_id", "500", 40);

    let report = rebuild(&wiki, &RebuildConfig::default()).await;

    assert_eq!(report.duplicates.links, 1);
    assert_eq!(report.duplicates.relinked, 1);
    assert_eq!(report.duplicates.removed, 1);

    let entries = wiki.entries().await;
    let for_revision: Vec<_> = entries
        .iter()
        .filter(|e| e.current_revision_id == 500)
        .collect();
    assert_eq!(for_revision.len(), 1);
    assert_eq!(for_revision[0].log_id, 40);
    assert_eq!(for_revision[0].subject_id, 9);
    assert!(entries.iter().all(|e| !(e.current_revision_id == 500 && e.log_id == 0)));
}

#[tokio::test]
async fn test_invalid_association_is_skipped() {
    let wiki = TestWiki::new().await;
    users(&wiki);
    wiki.page(9, 6, "Photo.jpg");
    wiki.revision(500, 9, &march(10, 0), ALICE, Some(2048));
    wiki.log(40, "upload", "upload", &march(10, 0), ALICE.0, 6, "Photo.jpg");
    wiki.log_search("associated_rev_id", "not-a-number", 40);
    // Only upload logs take part.
    wiki.log(41, "move", "move", &march(10, 1), ALICE.0, 6, "Photo.jpg");
    wiki.log_search("associated_rev_id", "500", 41);

    let (progress, output) = Progress::buffer();
    RevisionSeeder::new(&wiki.ctx, Progress::silent())
        .run(&RebuildConfig::default(), &RebuildConfig::default().cutoff(now()))
        .await
        .unwrap();
    let stats = DuplicateResolver::new(&wiki.ctx, progress).run().await.unwrap();

    assert_eq!(stats.links, 0);
    assert_eq!(stats.skipped.len(), 1);
    assert_eq!(stats.skipped[0].log_id, 40);
    assert!(output.contents().contains("not-a-number"));
    assert_eq!(wiki.revision_entry(500).await.log_id, 0);
}

#[tokio::test]
async fn test_progress_output_and_feed_purge() {
    let wiki = TestWiki::new().await;
    users(&wiki);
    wiki.group(ROBOT.0, "bot");
    wiki.page(1, 0, "Alpha");
    wiki.revision(1, 1, &march(1, 0), ROBOT, Some(1));

    let config = RebuildConfig::default();
    let cache = MemoryCache::new();
    for feed in ["rss", "atom"] {
        cache
            .set(&feed_timestamp_key(&config.key_prefix, feed), "20240301000000")
            .await
            .unwrap();
    }
    let permissions = default_group_permissions();
    let (progress, output) = Progress::buffer();

    let report = Rebuilder::new(wiki.ctx.clone(), &config, &permissions, &cache)
        .with_progress(progress)
        .with_now(now())
        .run()
        .await
        .unwrap();

    assert_eq!(report.purged_feeds, 2);
    assert!(cache.is_empty().await);

    let lines = output.lines();
    let expected = [
        "Loading from page and revision tables...",
        "max_age=7776000 (90 days)",
        "Updating links and size differences...",
        "Loading from user, page, and logging tables...",
        "Flagging bot account edits...",
        "Flagging auto-patrolled edits...",
        "Removing duplicate revision and logging entries...",
        "Deleting feed timestamps.",
    ];
    let mut position = 0;
    for message in expected {
        let found = lines[position..]
            .iter()
            .position(|l| l.contains(message))
            .unwrap_or_else(|| panic!("missing progress line: {}", message));
        position += found + 1;
    }
    assert_eq!(lines.last().map(String::as_str), Some("Done."));
}

#[tokio::test]
async fn test_rerun_is_stable() {
    let wiki = TestWiki::new().await;
    users(&wiki);
    wiki.group(ROBOT.0, "bot");
    wiki.page(1, 0, "Alpha");
    wiki.page(9, 6, "Photo.jpg");
    wiki.revision(1, 1, &march(1, 0), ALICE, Some(10));
    wiki.revision(2, 1, &march(2, 0), ROBOT, Some(12));
    wiki.revision(3, 9, &march(3, 0), ALICE, Some(99));
    wiki.log(7, "upload", "upload", &march(3, 0), ALICE.0, 6, "Photo.jpg");
    wiki.log_search("associated_rev_id", "3", 7);

    let config = RebuildConfig::default();
    let first = rebuild(&wiki, &config).await;
    let first_count = wiki.ctx.recent_changes().count().await.unwrap();
    let second = rebuild(&wiki, &config).await;

    assert_eq!(first, second);
    assert_eq!(first_count, 3);
    assert_eq!(wiki.ctx.recent_changes().count().await.unwrap(), first_count);
}
