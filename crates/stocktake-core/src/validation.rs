//! # Validation Module
//!
//! Input validation and session gating rules.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Controls (UI / CLI)                                           │
//! │  ├── Disable edit inputs on a COMPLETED session                         │
//! │  └── Disable "complete" while nothing is counted                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Session controller (Rust)                                     │
//! │  └── THIS MODULE: same rules, checked before any network call           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Inventory backend                                             │
//! │  └── Authoritative: rejects writes it doesn't accept                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::ledger::Ledger;
use crate::types::StockTakeSession;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest barcode we accept from a scanner.
pub const MAX_BARCODE_LEN: usize = 64;

/// Longest search text we filter with.
pub const MAX_SEARCH_LEN: usize = 100;

// =============================================================================
// Input Validators
// =============================================================================

/// Validates a scanned barcode and returns it trimmed.
///
/// ## Example
/// ```rust
/// use stocktake_core::validation::validate_barcode;
///
/// assert_eq!(validate_barcode(" 123456\n").unwrap(), "123456");
/// assert!(validate_barcode("").is_err());
/// assert!(validate_barcode("12 34").is_err());
/// ```
pub fn validate_barcode(code: &str) -> ValidationResult<String> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "barcode".to_string(),
        });
    }

    if code.len() > MAX_BARCODE_LEN {
        return Err(ValidationError::TooLong {
            field: "barcode".to_string(),
            max: MAX_BARCODE_LEN,
        });
    }

    if code.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidFormat {
            field: "barcode".to_string(),
            reason: "must not contain whitespace".to_string(),
        });
    }

    Ok(code.to_string())
}

/// Validates search text. Empty text is allowed (no text filter).
pub fn validate_search_text(text: &str) -> ValidationResult<String> {
    let text = text.trim();

    if text.chars().count() > MAX_SEARCH_LEN {
        return Err(ValidationError::TooLong {
            field: "search".to_string(),
            max: MAX_SEARCH_LEN,
        });
    }

    Ok(text.to_string())
}

/// Validates a line id passed in from a control.
pub fn validate_item_id(item_id: &str) -> ValidationResult<()> {
    if item_id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "item_id".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Session Gating
// =============================================================================

/// Edits are only allowed while the session is running.
pub fn ensure_editable(session: &StockTakeSession) -> CoreResult<()> {
    if session.is_editable() {
        Ok(())
    } else {
        Err(CoreError::SessionCompleted {
            session_id: session.id.clone(),
            status: session.status,
        })
    }
}

/// Completion needs a running session with at least one counted line.
pub fn ensure_completable(session: &StockTakeSession, ledger: &Ledger) -> CoreResult<()> {
    ensure_editable(session)?;

    if ledger.counted_count() == 0 {
        return Err(CoreError::NothingCounted);
    }

    Ok(())
}
