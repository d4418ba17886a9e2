//! Unified error types for the subscription core.
//!
//! Variants follow the mutation taxonomy: validation failures block a mutation
//! before any state change, transient failures are retried, permanent failures
//! and conflicts surface immediately.

use crate::core::validation::FieldError;
use crate::store::StoreError;
use thiserror::Error;

/// Errors produced by the coordinator, configuration and database layers.
#[derive(Debug, Error)]
pub enum Error {
    /// Input failed validation; every violated field is listed
    #[error("Validation failed: {}", format_field_errors(.errors))]
    Validation {
        /// All violated fields
        errors: Vec<FieldError>,
    },

    /// Remote call kept failing with retryable errors until attempts ran out
    #[error("{operation} failed after {attempts} attempts: {message}")]
    Transient {
        /// Operation label, e.g. `update`
        operation: String,
        /// Number of attempts made
        attempts: u32,
        /// Last error reported by the store
        message: String,
    },

    /// Remote store rejected the call; not retried
    #[error("{operation} rejected: {message}")]
    Permanent {
        /// Operation label, e.g. `delete`
        operation: String,
        /// Reason reported by the store
        message: String,
    },

    /// Another mutation for the same subscription is still in flight
    #[error("Subscription {id} has a change in progress")]
    Conflict {
        /// Busy subscription identifier
        id: String,
    },

    /// No subscription with this identifier exists locally
    #[error("Subscription not found: {id}")]
    SubscriptionNotFound {
        /// Missing identifier
        id: String,
    },

    /// The coordinator was torn down while the operation was running
    #[error("Coordinator was torn down")]
    TornDown,

    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the problem
        message: String,
    },

    /// Database error from `SeaORM`
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Builds the error for a store failure after the retry policy gave up.
    #[must_use]
    pub fn from_store(operation: &str, attempts: u32, error: &StoreError) -> Self {
        if error.is_transient() {
            Self::Transient {
                operation: operation.to_string(),
                attempts,
                message: error.to_string(),
            }
        } else {
            Self::Permanent {
                operation: operation.to_string(),
                message: error.to_string(),
            }
        }
    }
}

fn format_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_lists_every_field() {
        let err = Error::Validation {
            errors: vec![
                FieldError::new("name", "is required"),
                FieldError::new("price", "must not be negative"),
            ],
        };
        let message = err.to_string();
        assert!(message.contains("name: is required"));
        assert!(message.contains("price: must not be negative"));
    }

    #[test]
    fn test_from_store_classifies_transient_and_permanent() {
        let timeout = StoreError::Timeout {
            operation: "update".to_string(),
            duration_ms: 50,
        };
        assert!(matches!(
            Error::from_store("update", 3, &timeout),
            Error::Transient { attempts: 3, .. }
        ));

        let denied = StoreError::PermissionDenied {
            message: "read only".to_string(),
        };
        assert!(matches!(
            Error::from_store("delete", 1, &denied),
            Error::Permanent { .. }
        ));
    }
}
