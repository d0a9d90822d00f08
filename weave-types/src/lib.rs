//! # weave-types
//!
//! Foundational types for the weave social backend:
//! - [`UserId`], [`SessionToken`] - Identity types
//! - [`IdSet`] - Ordered-insertion set used for relationship edges
//! - [`UserRecord`], [`NewUser`] - The user data model

#![warn(missing_docs)]
#![warn(clippy::all)]

mod ids;
mod set;
mod user;

pub use ids::{ParseUserIdError, SessionToken, UserId};
pub use set::IdSet;
pub use user::{NewUser, UserRecord};
