//! Transition results as per-user field deltas.

use weave_types::UserRecord;

/// A mutable relationship field of a user record.
///
/// The storage layer maps each variant to its column; a transition
/// names exactly the fields it changed so the coordinator writes
/// nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserField {
    /// `following` edge set.
    Following,
    /// `followers` edge set.
    Followers,
    /// `friends` edge set.
    Friends,
    /// Outgoing pending requests.
    RequestsSent,
    /// Incoming pending requests.
    RequestsReceived,
    /// Block list.
    Blocked,
    /// Mute list.
    Muted,
    /// Derived friend counter.
    TotalFriends,
}

/// The updated record of one endpoint plus the fields that changed.
#[derive(Debug, Clone, PartialEq)]
pub struct UserDelta {
    /// The record with the transition applied.
    pub user: UserRecord,
    /// Which fields differ from the pre-transition record. Empty when
    /// the transition was an idempotent no-op for this endpoint.
    pub fields: Vec<UserField>,
}

impl UserDelta {
    /// A delta that changes nothing for this endpoint.
    pub fn unchanged(user: UserRecord) -> Self {
        Self {
            user,
            fields: Vec::new(),
        }
    }

    /// Whether this delta carries any change to persist.
    pub fn is_dirty(&self) -> bool {
        !self.fields.is_empty()
    }
}

/// The full result of one validated transition.
///
/// `actor` is always present; `target` is present exactly when the
/// transition touches the other endpoint's record. The coordinator
/// persists every dirty delta of one effect in a single storage
/// transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionEffect {
    /// The authenticated caller's side.
    pub actor: UserDelta,
    /// The other endpoint, when the transition mutates it.
    pub target: Option<UserDelta>,
}

impl TransitionEffect {
    /// Effect touching only the actor's record.
    pub fn actor_only(actor: UserDelta) -> Self {
        Self {
            actor,
            target: None,
        }
    }

    /// Effect touching both endpoints.
    pub fn pair(actor: UserDelta, target: UserDelta) -> Self {
        Self {
            actor,
            target: Some(target),
        }
    }

    /// Iterate the deltas that actually changed.
    pub fn dirty_deltas(&self) -> impl Iterator<Item = &UserDelta> {
        std::iter::once(&self.actor)
            .chain(self.target.iter())
            .filter(|delta| delta.is_dirty())
    }
}
