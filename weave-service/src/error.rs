//! Error types for weave-service.

use weave_graph::TransitionError;
use weave_types::UserId;

/// Main error type for service operations.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// No active session for the presented token.
    #[error("not authenticated")]
    Unauthenticated,

    /// User id does not resolve to an account.
    #[error("user not found: {user_id}")]
    UserNotFound {
        /// The id that failed to resolve.
        user_id: UserId,
    },

    /// Username does not resolve to an account.
    #[error("no user with username {username:?}")]
    UsernameNotFound {
        /// The username that failed to resolve.
        username: String,
    },

    /// Malformed or missing input.
    #[error("validation failed: {reason}")]
    Validation {
        /// What was wrong with the input.
        reason: String,
    },

    /// Username is already registered.
    #[error("username already taken: {username}")]
    UsernameTaken {
        /// The conflicting username.
        username: String,
    },

    /// Password verification failed.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Caller is authenticated but not allowed to do this.
    #[error("forbidden: {reason}")]
    Forbidden {
        /// Why the operation was refused.
        reason: String,
    },

    /// A relationship transition was refused by a business rule.
    #[error(transparent)]
    Rejected(#[from] TransitionError),

    /// Credential hashing failed.
    #[error("credential hashing failed: {0}")]
    Hashing(#[from] crate::credentials::CredentialError),

    /// The backing store failed (after the bounded retry).
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[source] StorageError),
}

/// Storage layer errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Row for a user id was expected but absent.
    #[error("user row missing: {user_id}")]
    UserMissing {
        /// The absent user id.
        user_id: UserId,
    },

    /// Unique constraint on username violated.
    #[error("username already taken: {username}")]
    UsernameTaken {
        /// The conflicting username.
        username: String,
    },
}

impl StorageError {
    /// Whether this failure class may be retried transparently.
    ///
    /// Only database faults qualify; everything else is a stable
    /// answer that retrying cannot change.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::UserMissing { user_id } => Self::UserNotFound { user_id },
            StorageError::UsernameTaken { username } => Self::UsernameTaken { username },
            other => Self::StorageUnavailable(other),
        }
    }
}

/// Result type alias for service operations.
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Result type alias for storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_rejections_pass_through_display() {
        let err = ServiceError::from(TransitionError::AlreadyFriends);
        assert_eq!(err.to_string(), TransitionError::AlreadyFriends.to_string());
    }

    #[test]
    fn storage_not_found_maps_to_user_not_found() {
        let err = ServiceError::from(StorageError::UserMissing {
            user_id: UserId::new(7),
        });
        assert!(matches!(
            err,
            ServiceError::UserNotFound { user_id } if user_id == UserId::new(7)
        ));
    }

    #[test]
    fn only_database_errors_are_transient() {
        assert!(!StorageError::UserMissing {
            user_id: UserId::new(1)
        }
        .is_transient());
        assert!(!StorageError::UsernameTaken {
            username: "ann".into()
        }
        .is_transient());
        assert!(StorageError::Database(sqlx::Error::PoolClosed).is_transient());
    }
}
