//! Repository layer for database persistence.
//!
//! All database access uses Diesel ORM over SQLite. The source tables
//! (`page`, `revision`, `logging`, `user`...) are only ever read; the
//! `recentchanges` feed table is the single write target.

pub mod context;
pub mod models;
pub mod pool;

// Repositories
pub mod logging;
pub mod recent_changes;
pub mod revisions;
pub mod users;

// Utilities
pub mod util;

pub use context::DbContext;
pub use logging::{LogAssociation, LoggingRepository};
pub use pool::{DbError, DbPool};
pub use recent_changes::{
    ActorFlag, LinkageUpdate, MergeCounts, RecentChangesRepository, RevisionLink,
};
pub use revisions::{PriorRevision, RevisionRepository, SubjectStart};
pub use users::UserRepository;

#[allow(unused_imports)]
pub use models::{LinkageScanRow, NewObjectCacheEntry, ObjectCacheRecord, RecentChangeRecord};
