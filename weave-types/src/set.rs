//! Ordered-insertion set for relationship edges.

use crate::UserId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A set of user ids with stable insertion order.
///
/// Relationship edges are semantically sets (membership matters, order
/// does not) but are stored and surfaced as ordered sequences. All
/// mutation goes through add/remove-by-value: insertion is idempotent,
/// removal splices out the first matching entry and preserves the
/// relative order of the rest. Duplicate entries arriving from storage
/// are tolerated rather than assumed away; `remove` then drops one
/// occurrence per call.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdSet(Vec<UserId>);

impl IdSet {
    /// Create an empty IdSet.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Whether the given id is a member.
    pub fn contains(&self, id: UserId) -> bool {
        self.0.contains(&id)
    }

    /// Insert an id. Returns false (and leaves the set unchanged) if
    /// the id is already a member.
    pub fn insert(&mut self, id: UserId) -> bool {
        if self.contains(id) {
            return false;
        }
        self.0.push(id);
        true
    }

    /// Remove the first occurrence of an id by value.
    ///
    /// Returns false if the id is not a member; absent ids are a
    /// no-op, not an error.
    pub fn remove(&mut self, id: UserId) -> bool {
        match self.0.iter().position(|member| *member == id) {
            Some(index) => {
                self.0.remove(index);
                true
            }
            None => false,
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate members in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = UserId> + '_ {
        self.0.iter().copied()
    }

    /// Encode as a simple-array column value: decimal ids joined by
    /// commas, empty string for the empty set.
    pub fn to_simple_array(&self) -> String {
        self.0
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Decode a simple-array column value.
    ///
    /// Empty segments are skipped; non-numeric segments are dropped
    /// (the store never writes them, but a hand-edited row must not
    /// poison the whole record).
    pub fn from_simple_array(raw: &str) -> Self {
        Self(
            raw.split(',')
                .filter(|segment| !segment.is_empty())
                .filter_map(|segment| segment.parse::<UserId>().ok())
                .collect(),
        )
    }
}

impl fmt::Debug for IdSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.iter()).finish()
    }
}

impl FromIterator<UserId> for IdSet {
    fn from_iter<I: IntoIterator<Item = UserId>>(iter: I) -> Self {
        let mut set = Self::new();
        for id in iter {
            set.insert(id);
        }
        set
    }
}
