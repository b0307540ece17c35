//! Domain error types.

use thiserror::Error;
use validator::{ValidationError, ValidationErrors};

use crate::models::AmbulanceAvailability;
use crate::services::store::StoreError;

/// Errors returned by the ledger and request lifecycle operations.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The ledger refused a decrement. Carries the ledger as read after the
    /// refusal so callers can show current counts.
    #[error("No ambulances available at this time")]
    NoUnitsAvailable { availability: AmbulanceAvailability },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("{0} not found")]
    NotFound(&'static str),

    /// The request moved on before this transition applied.
    #[error("Request is {actual}, expected {expected}")]
    StaleTransition { expected: String, actual: String },

    #[error("Rejecting a request requires confirmation")]
    ConfirmationRequired,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LifecycleError {
    /// Wraps a single field error into `Validation`.
    pub fn field(field: &'static str, error: ValidationError) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add(field, error);
        LifecycleError::Validation(errors)
    }

    pub fn stale(expected: impl ToString, actual: impl ToString) -> Self {
        LifecycleError::StaleTransition {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}

/// Validates a hospital identifier as a lifecycle error.
pub fn check_hospital_id(hospital_id: &str) -> Result<(), LifecycleError> {
    shared::validation::validate_hospital_id(hospital_id)
        .map_err(|e| LifecycleError::field("hospital_id", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_hospital_id() {
        assert!(check_hospital_id("saniat-rmel").is_ok());
        let err = check_hospital_id("").unwrap_err();
        match err {
            LifecycleError::Validation(errors) => {
                assert!(errors.field_errors().contains_key("hospital_id"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_stale_message() {
        let err = LifecycleError::stale("pending", "in-progress");
        assert_eq!(err.to_string(), "Request is in-progress, expected pending");
    }

    #[test]
    fn test_store_error_is_transparent() {
        let err: LifecycleError = StoreError::Query("boom".to_string()).into();
        assert_eq!(err.to_string(), "Store query failed: boom");
    }
}
