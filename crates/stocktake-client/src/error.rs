//! # Client Error Types
//!
//! Error types for every operation of the reconciliation flow.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Client Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Network       │  │     Backend             │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  ConnectionFail │  │  Status {status, msg}   │ │
//! │  │  InvalidUrl     │  │  Timeout        │  │  InvalidResponse        │ │
//! │  │  ConfigLoad/Save│  │  Http           │  │  Core (wire shape)      │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │    Gating       │  │     Bulk        │  │      Internal           │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  NotConfirmed   │  │  BulkFailed     │  │  ChannelError           │ │
//! │  │  AlreadyInProg. │  │                 │  │                         │ │
//! │  │  Core(Completed)│  │                 │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! None of these carry a machine-readable code for the operator: they end up
//! as human-readable notification text via [`ClientError::user_message`].

use stocktake_core::{CoreError, ValidationError};
use thiserror::Error;

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Shown when nothing more specific is available.
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

/// Client error type covering all failures of the flow.
#[derive(Debug, Error)]
pub enum ClientError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid client configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Backend URL doesn't parse or has the wrong scheme.
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Network Errors
    // =========================================================================
    /// Backend unreachable.
    #[error("Cannot reach inventory backend: {0}")]
    ConnectionFailed(String),

    /// Request timed out.
    #[error("Inventory backend timed out: {0}")]
    Timeout(String),

    /// Any other HTTP client failure.
    #[error("HTTP error: {0}")]
    Http(String),

    // =========================================================================
    // Backend Errors
    // =========================================================================
    /// Backend answered with a non-success status.
    ///
    /// `message` is the most specific text found in the response body.
    #[error("Backend rejected the request (HTTP {status}): {message}")]
    Status { status: u16, message: String },

    /// Response body could not be read as JSON.
    #[error("Invalid response from backend: {0}")]
    InvalidResponse(String),

    /// Domain error: unrecognized payload shape or a gating rule.
    #[error(transparent)]
    Core(#[from] CoreError),

    // =========================================================================
    // Gating Errors (no request was sent)
    // =========================================================================
    /// The operator declined (or was never asked to confirm) an irreversible action.
    #[error("{action} was not confirmed")]
    NotConfirmed { action: String },

    /// The same operation is already running.
    #[error("{0} is already in progress")]
    AlreadyInProgress(&'static str),

    // =========================================================================
    // Bulk Errors
    // =========================================================================
    /// A bulk operation stopped at its first failing request.
    #[error("{operation} failed after dispatching {attempted} request(s): {reason}")]
    BulkFailed {
        operation: &'static str,
        attempted: usize,
        reason: String,
    },

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// Channel send/receive failed.
    #[error("Channel error: {0}")]
    ChannelError(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout(err.to_string())
        } else if err.is_connect() {
            ClientError::ConnectionFailed(err.to_string())
        } else if err.is_decode() {
            ClientError::InvalidResponse(err.to_string())
        } else {
            ClientError::Http(err.to_string())
        }
    }
}

impl From<ValidationError> for ClientError {
    fn from(err: ValidationError) -> Self {
        ClientError::Core(CoreError::Validation(err))
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::InvalidResponse(err.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ClientError {
    fn from(err: toml::de::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ClientError {
    fn from(err: toml::ser::Error) -> Self {
        ClientError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Categorization
// =============================================================================

impl ClientError {
    /// The text an operator should see.
    ///
    /// Prefers the backend's own detail message, then this error's text, and
    /// falls back to [`GENERIC_FAILURE`] when neither says anything.
    pub fn user_message(&self) -> String {
        let text = match self {
            ClientError::Status { message, .. } => message.trim().to_string(),
            ClientError::BulkFailed { reason, .. } => reason.trim().to_string(),
            other => other.to_string(),
        };

        if text.is_empty() {
            GENERIC_FAILURE.to_string()
        } else {
            text
        }
    }

    /// Returns true if the error was raised before any request went out.
    pub fn is_gating(&self) -> bool {
        matches!(
            self,
            ClientError::NotConfirmed { .. }
                | ClientError::AlreadyInProgress(_)
                | ClientError::Core(CoreError::SessionCompleted { .. })
                | ClientError::Core(CoreError::NothingCounted)
                | ClientError::Core(CoreError::Validation(_))
        )
    }

    /// Returns true for transport-level failures.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            ClientError::ConnectionFailed(_) | ClientError::Timeout(_) | ClientError::Http(_)
        )
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ClientError::InvalidConfig(_)
                | ClientError::InvalidUrl(_)
                | ClientError::ConfigLoadFailed(_)
                | ClientError::ConfigSaveFailed(_)
        )
    }
}
