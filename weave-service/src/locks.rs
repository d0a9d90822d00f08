//! Per-user locks for mutation serialization.
//!
//! Every relationship transition is a read-modify-write over one or
//! two user records. Transitions that share a user must not
//! interleave, or one side's update is lost. The lock table keeps one
//! async mutex per user id; a pair transition takes both endpoint
//! locks in ascending id order, which also serializes overlapping
//! pairs ({A,B} vs {A,C}) and cannot deadlock.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use weave_types::UserId;

/// Lock table keyed by user id.
///
/// Entries are created on first use and never evicted; one mutex per
/// user ever locked.
#[derive(Debug, Default)]
pub struct PairLocks {
    locks: DashMap<UserId, Arc<Mutex<()>>>,
}

/// Guard over one or both endpoints of a transition. Dropping it
/// releases the locks.
#[derive(Debug)]
pub struct PairGuard {
    _first: OwnedMutexGuard<()>,
    _second: Option<OwnedMutexGuard<()>>,
}

impl PairLocks {
    /// Create an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, id: UserId) -> Arc<Mutex<()>> {
        // Clone out of the map entry before awaiting anywhere; a held
        // dashmap shard guard across an await would block other keys.
        self.locks.entry(id).or_default().clone()
    }

    /// Lock a single user record.
    pub async fn lock_single(&self, id: UserId) -> PairGuard {
        PairGuard {
            _first: self.handle(id).lock_owned().await,
            _second: None,
        }
    }

    /// Lock both endpoints of a pair transition.
    ///
    /// Acquisition is in ascending id order regardless of which side
    /// is the actor. Equal ids collapse to a single lock.
    pub async fn lock_pair(&self, a: UserId, b: UserId) -> PairGuard {
        if a == b {
            return self.lock_single(a).await;
        }
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let first = self.handle(lo).lock_owned().await;
        let second = self.handle(hi).lock_owned().await;
        PairGuard {
            _first: first,
            _second: Some(second),
        }
    }

    /// Number of user ids ever locked.
    pub fn tracked_users(&self) -> usize {
        self.locks.len()
    }
}
