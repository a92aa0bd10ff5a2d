//! # Operator Notifications
//!
//! Every operation boundary of the flow ends in exactly one notification:
//! a success toast, an informational hint, or a failure carrying the most
//! specific message available.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Notification Routing                                │
//! │                                                                         │
//! │   controllers ──► Arc<dyn Notifier> ──┬──► TracingNotifier (logs)       │
//! │                                       ├──► ConsoleNotifier (CLI)        │
//! │                                       └──► NoOpNotifier (tests)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Notifications are plain human-readable text. Nothing downstream is
//! expected to parse them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{error, info, warn};

/// How a notification should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Success,
    Info,
    Failure,
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tone::Success => write!(f, "success"),
            Tone::Info => write!(f, "info"),
            Tone::Failure => write!(f, "failure"),
        }
    }
}

/// A single toast-style message for the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub tone: Tone,
    pub title: String,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl Notification {
    pub fn new(tone: Tone, title: impl Into<String>, message: impl Into<String>) -> Self {
        Notification {
            tone,
            title: title.into(),
            message: message.into(),
            at: Utc::now(),
        }
    }

    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Tone::Success, title, message)
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Tone::Info, title, message)
    }

    pub fn failure(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Tone::Failure, title, message)
    }
}

// =============================================================================
// Notifier Trait
// =============================================================================

/// Sink for operator notifications (implemented by each frontend).
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Discards everything.
pub struct NoOpNotifier;

impl Notifier for NoOpNotifier {
    fn notify(&self, _notification: Notification) {}
}

/// Writes notifications to the log at a level matching their tone.
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, n: Notification) {
        match n.tone {
            Tone::Success => info!(title = %n.title, "{}", n.message),
            Tone::Info => warn!(title = %n.title, "{}", n.message),
            Tone::Failure => error!(title = %n.title, "{}", n.message),
        }
    }
}
