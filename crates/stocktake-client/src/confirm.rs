//! # Confirmation Capability
//!
//! Irreversible or bulk actions (complete, delete, auto-complete) ask the
//! operator first. How the question is asked belongs to the frontend; the
//! controllers only see a yes/no answer. A "no" means no request is sent.

use async_trait::async_trait;

/// What the operator is being asked to confirm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmPrompt {
    /// Short name of the action, e.g. "Complete stock-take".
    pub action: String,
    /// Consequence spelled out for the operator.
    pub message: String,
}

impl ConfirmPrompt {
    pub fn new(action: impl Into<String>, message: impl Into<String>) -> Self {
        ConfirmPrompt {
            action: action.into(),
            message: message.into(),
        }
    }
}

/// Asks the operator a yes/no question.
#[async_trait]
pub trait Confirmer: Send + Sync {
    async fn confirm(&self, prompt: &ConfirmPrompt) -> bool;
}

/// Says yes to everything (`--yes`, scripted runs).
pub struct AutoConfirm;

#[async_trait]
impl Confirmer for AutoConfirm {
    async fn confirm(&self, _prompt: &ConfirmPrompt) -> bool {
        true
    }
}

/// Says no to everything (read-only frontends).
pub struct DenyAll;

#[async_trait]
impl Confirmer for DenyAll {
    async fn confirm(&self, _prompt: &ConfirmPrompt) -> bool {
        false
    }
}
