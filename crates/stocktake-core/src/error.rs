//! # Error Types
//!
//! Domain-specific error types for stocktake-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stocktake-core errors (this file)                                      │
//! │  ├── CoreError        - Wire shapes, gating rules, missing lines        │
//! │  └── ValidationError  - Input validation failures                       │
//! │                                                                         │
//! │  stocktake-client errors (separate crate)                               │
//! │  └── ClientError      - HTTP, status, confirmation, bulk failures       │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ClientError → Notification         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::types::SessionStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Core domain errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A backend payload did not have a shape we recognize.
    ///
    /// ## When This Occurs
    /// - A required field is missing (`id`, `product_id`, ...)
    /// - A quantity is not a number, or is negative where it can't be
    /// - A status string is not one we know
    ///
    /// Never defaulted silently: the caller must see the bad payload.
    #[error("Unrecognized {field} in backend payload: {reason}")]
    Wire { field: String, reason: String },

    /// The line item is not in the ledger.
    #[error("Stock-take item not found: {0}")]
    ItemNotFound(String),

    /// The session is finalized and rejects further edits.
    #[error("Stock-take {session_id} is {status}, counts can no longer change")]
    SessionCompleted {
        session_id: String,
        status: SessionStatus,
    },

    /// Completion requested with no counted items.
    #[error("Nothing has been counted yet")]
    NothingCounted,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Shorthand for a wire-shape error.
    pub fn wire(field: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::Wire {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Invalid format (e.g., barcode with spaces).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::SessionCompleted {
            session_id: "st-1".to_string(),
            status: SessionStatus::Completed,
        };
        assert_eq!(
            err.to_string(),
            "Stock-take st-1 is COMPLETED, counts can no longer change"
        );

        let err = CoreError::wire("counted_quantity", "expected a number");
        assert_eq!(
            err.to_string(),
            "Unrecognized counted_quantity in backend payload: expected a number"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "barcode".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
