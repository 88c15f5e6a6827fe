//! Data models for the recent changes feed.

mod feed_entry;
pub mod timestamp;

pub use feed_entry::{ChangeSource, ChangeType, FeedEntry};
