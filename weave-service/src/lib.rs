//! # weave-service
//!
//! The async service layer of the weave social backend.
//!
//! This crate wires the pure relationship state machine from
//! `weave-graph` to the outside world:
//! - a SQLite user repository behind the [`storage::UserStore`] trait
//! - a per-token session store (the authentication gate)
//! - the mutation coordinator: per-user locks plus single-transaction
//!   persistence, so concurrent transitions over the same users
//!   serialize instead of losing updates
//! - the full public operation surface on [`SocialService`]
//!
//! ## Control flow
//!
//! ```text
//! caller ──► auth gate (resolve actor from session token)
//!        ──► pair lock  (ascending-id order, held to the end)
//!        ──► weave-graph transition (pure validate + compute)
//!        ──► storage transaction (both records, all or nothing)
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod credentials;
pub mod error;
pub mod locks;
pub mod service;
pub mod session;
pub mod storage;

pub use config::Config;
pub use error::{ServiceError, ServiceResult};
pub use service::{MetricsSnapshot, SocialService};
