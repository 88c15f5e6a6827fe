//! Feed entry models for the rebuilt `recentchanges` table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of change a feed entry represents.
///
/// The discriminants are the integers stored in `rc_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Edit,
    New,
    Log,
}

impl ChangeType {
    pub fn as_i32(&self) -> i32 {
        match self {
            Self::Edit => 0,
            Self::New => 1,
            Self::Log => 3,
        }
    }

    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Edit),
            1 => Some(Self::New),
            3 => Some(Self::Log),
            _ => None,
        }
    }

    /// The only source a row of this type may carry.
    pub fn source(&self) -> ChangeSource {
        match self {
            Self::Edit => ChangeSource::Edit,
            Self::New => ChangeSource::New,
            Self::Log => ChangeSource::Log,
        }
    }

    /// Type for a revision-derived entry.
    pub fn for_revision(is_new: bool) -> Self {
        if is_new {
            Self::New
        } else {
            Self::Edit
        }
    }
}

/// Origin tag stored in `rc_source`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeSource {
    #[serde(rename = "mw.edit")]
    Edit,
    #[serde(rename = "mw.new")]
    New,
    #[serde(rename = "mw.log")]
    Log,
}

impl ChangeSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Edit => "mw.edit",
            Self::New => "mw.new",
            Self::Log => "mw.log",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "mw.edit" => Some(Self::Edit),
            "mw.new" => Some(Self::New),
            "mw.log" => Some(Self::Log),
            _ => None,
        }
    }
}

/// One row of the rebuilt feed: a single user-visible change event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedEntry {
    pub id: i32,
    pub timestamp: DateTime<Utc>,
    pub actor_id: i32,
    pub actor_name: String,
    pub namespace: i32,
    pub title: String,
    pub comment: String,
    pub is_minor: bool,
    pub is_bot: bool,
    pub is_new: bool,
    pub is_patrolled: bool,
    pub change_type: ChangeType,
    pub change_source: ChangeSource,
    /// Page the change applies to (0 when the page no longer exists).
    pub subject_id: i32,
    pub current_revision_id: i32,
    /// Revision immediately preceding this one, 0 when there is none.
    pub previous_revision_id: i32,
    pub old_size: Option<i32>,
    pub new_size: Option<i32>,
    /// Suppression/deletion bits carried from the source row.
    pub visibility_mask: i32,
    /// Originating log id, 0 for revision-derived entries.
    pub log_id: i32,
    pub log_type: Option<String>,
    pub log_action: Option<String>,
    pub log_params: Option<String>,
}

impl FeedEntry {
    /// Size delta in bytes, when both sizes are known.
    pub fn size_delta(&self) -> Option<i32> {
        match (self.old_size, self.new_size) {
            (Some(old), Some(new)) => Some(new - old),
            (None, Some(new)) if self.previous_revision_id == 0 => Some(new),
            _ => None,
        }
    }

    /// Check that `change_source` agrees with `change_type`.
    pub fn is_consistent(&self) -> bool {
        self.change_type.source() == self.change_source
    }
}
