//! Typed rejections for relationship transitions.

use thiserror::Error;

/// A relationship transition was refused by a business rule.
///
/// These are legitimate state-machine rejections, not faults: the
/// service surfaces them to the caller unchanged and never retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The actor targeted their own account.
    #[error("cannot target your own account")]
    SelfRequest,

    /// The actor is blocked by the target.
    #[error("you are blocked by this user")]
    Blocked,

    /// A friend request between the two users is already pending.
    #[error("a friend request between these users is pending")]
    RequestPending,

    /// The two users are already friends.
    #[error("you are already friends with this user")]
    AlreadyFriends,

    /// The actor already sent this target a friend request.
    #[error("you already sent a friend request to this user")]
    DuplicateRequest,

    /// The target already sent the actor a friend request; it must be
    /// accepted or rejected, not answered with a new request.
    #[error("you have a pending friend request from this user")]
    RequestAlreadyReceived,

    /// No pending request from the named user exists.
    #[error("no pending friend request from this user")]
    NoSuchRequest,
}
