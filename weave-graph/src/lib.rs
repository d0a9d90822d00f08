//! # weave-graph
//!
//! The relationship state machine for the weave social backend.
//!
//! This crate is pure logic: every transition takes the current
//! records of the two endpoints and returns either the mutated
//! records with their dirty fields, or a typed rejection. No I/O
//! happens here. The service layer is responsible for loading the
//! records under the pair lock, calling a transition, and persisting
//! the resulting deltas atomically.
//!
//! ## Transitions
//!
//! - [`toggle_follow`] - follow or unfollow (one call toggles)
//! - [`send_friend_request`] / [`accept_friend_request`] /
//!   [`reject_friend_request`] - the pending-request lifecycle
//! - [`block_user`] / [`unblock_user`] - one-directional block edges
//! - [`mute_user`] / [`unmute_user`] - one-directional mute edges
//!
//! All pair transitions mutate both endpoints together or not at all,
//! and every rejection is a business-rule violation surfaced to the
//! caller, never retried.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod delta;
mod error;
mod policy;
mod transition;

pub use delta::{TransitionEffect, UserDelta, UserField};
pub use error::TransitionError;
pub use policy::RelationshipPolicy;
pub use transition::{
    accept_friend_request, block_user, mute_user, reject_friend_request, send_friend_request,
    toggle_follow, unblock_user, unmute_user,
};
