//! Configurable relationship policy.

use serde::Deserialize;

/// Policy flags for behavior that differs between deployments.
///
/// The choice is made explicit in configuration instead of being
/// baked into the transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RelationshipPolicy {
    /// Accepting a friend request also creates the mutual follow
    /// edges (default: true).
    #[serde(default = "default_follow_on_accept")]
    pub follow_on_accept: bool,

    /// Blocking a user dissolves any existing friendship and follow
    /// edges between the pair on both records (default: false; a
    /// block leaves existing edges intact and never touches the
    /// target's record).
    #[serde(default = "default_dissolve_on_block")]
    pub dissolve_on_block: bool,
}

fn default_follow_on_accept() -> bool {
    true
}

fn default_dissolve_on_block() -> bool {
    false
}

impl Default for RelationshipPolicy {
    fn default() -> Self {
        Self {
            follow_on_accept: default_follow_on_accept(),
            dissolve_on_block: default_dissolve_on_block(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_flags() {
        let policy = RelationshipPolicy::default();
        assert!(policy.follow_on_accept);
        assert!(!policy.dissolve_on_block);
    }
}
