//! Group permission lookup.
//!
//! Role classification only needs to know which groups carry a right; the
//! membership itself lives in the `user_groups` table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Resolves which user groups hold a named right.
pub trait PermissionLookup: Send + Sync {
    /// Groups granted `right`, sorted by name.
    fn groups_with_permission(&self, right: &str) -> Vec<String>;
}

/// Group to right grants, as in a wiki's group permission table.
///
/// A right that is granted and also revoked for a group does not count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupPermissions {
    #[serde(default)]
    pub grants: BTreeMap<String, BTreeMap<String, bool>>,
    #[serde(default)]
    pub revokes: BTreeMap<String, BTreeMap<String, bool>>,
}

impl GroupPermissions {
    /// Grant `right` to `group`.
    pub fn grant(mut self, group: &str, right: &str) -> Self {
        self.grants
            .entry(group.to_string())
            .or_default()
            .insert(right.to_string(), true);
        self
    }

    /// Revoke `right` from `group`.
    pub fn revoke(mut self, group: &str, right: &str) -> Self {
        self.revokes
            .entry(group.to_string())
            .or_default()
            .insert(right.to_string(), true);
        self
    }

    fn is_revoked(&self, group: &str, right: &str) -> bool {
        self.revokes
            .get(group)
            .and_then(|rights| rights.get(right))
            .copied()
            .unwrap_or(false)
    }
}

impl PermissionLookup for GroupPermissions {
    fn groups_with_permission(&self, right: &str) -> Vec<String> {
        self.grants
            .iter()
            .filter(|(_, rights)| rights.get(right).copied().unwrap_or(false))
            .filter(|(group, _)| !self.is_revoked(group, right))
            .map(|(group, _)| group.clone())
            .collect()
    }
}

/// Default grants of a stock MediaWiki install, limited to the rights the
/// rebuild consults.
pub fn default_group_permissions() -> GroupPermissions {
    GroupPermissions::default()
        .grant("bot", "bot")
        .grant("bot", "autopatrol")
        .grant("sysop", "autopatrol")
}
