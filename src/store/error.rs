//! Error types for remote store calls.
//!
//! Every failure is either transient (worth retrying) or permanent. The
//! coordinator's retry policy only ever looks at [`StoreError::is_transient`].

use sea_orm::DbErr;
use thiserror::Error;

/// Errors a remote store can report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store could not be reached at all
    #[error("store unreachable: {0}")]
    Unreachable(String),

    /// An attempt exceeded its deadline
    #[error("{operation} timed out after {duration_ms}ms")]
    Timeout {
        /// Operation that timed out
        operation: String,
        /// Deadline that was exceeded
        duration_ms: u64,
    },

    /// Server-side failure (5xx equivalent)
    #[error("store unavailable ({status}): {message}")]
    Unavailable {
        /// Status code reported by the store
        status: u16,
        /// Reason reported by the store
        message: String,
    },

    /// The store refused the payload
    #[error("rejected by store: {message}")]
    Rejected {
        /// Reason reported by the store
        message: String,
    },

    /// The target record does not exist remotely
    #[error("not found: {id}")]
    NotFound {
        /// Missing identifier
        id: String,
    },

    /// The caller may not perform this operation
    #[error("permission denied: {message}")]
    PermissionDenied {
        /// Reason reported by the store
        message: String,
    },

    /// Any other storage failure
    #[error("storage failure: {0}")]
    Database(String),
}

impl StoreError {
    /// True for network, timeout and 5xx-style failures.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Unreachable(_) | Self::Timeout { .. } | Self::Unavailable { .. }
        )
    }
}

impl From<DbErr> for StoreError {
    fn from(err: DbErr) -> Self {
        match err {
            DbErr::Conn(e) => Self::Unreachable(e.to_string()),
            DbErr::ConnectionAcquire(e) => Self::Unreachable(e.to_string()),
            DbErr::RecordNotFound(id) => Self::NotFound { id },
            other => Self::Database(other.to_string()),
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(StoreError::Unreachable("dns".to_string()).is_transient());
        assert!(
            StoreError::Unavailable {
                status: 503,
                message: "maintenance".to_string()
            }
            .is_transient()
        );
        assert!(
            !StoreError::Rejected {
                message: "bad price".to_string()
            }
            .is_transient()
        );
        assert!(
            !StoreError::NotFound {
                id: "1".to_string()
            }
            .is_transient()
        );
    }

    #[test]
    fn test_db_error_conversion() {
        let err: StoreError = DbErr::RecordNotFound("abc".to_string()).into();
        assert_eq!(
            err,
            StoreError::NotFound {
                id: "abc".to_string()
            }
        );

        let err: StoreError = DbErr::Custom("boom".to_string()).into();
        assert!(matches!(err, StoreError::Database(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_error_display() {
        let err = StoreError::Timeout {
            operation: "update".to_string(),
            duration_ms: 250,
        };
        assert_eq!(err.to_string(), "update timed out after 250ms");
    }
}
