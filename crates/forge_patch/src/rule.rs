//! The patch rule abstraction.

use std::fmt;

use serde::Serialize;

use crate::error::PatchResult;

/// Outcome of applying one rule to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fixup {
    /// The rule changed the content.
    Applied(String),
    /// The rule's marker was already present; nothing to do.
    Unchanged,
    /// The rule could not find its anchor and was left unapplied.
    Skipped(String),
}

impl Fixup {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    /// `Applied` if `patched` differs from `original`, else `Unchanged`.
    pub fn compare(original: &str, patched: String) -> Self {
        if patched == original {
            Self::Unchanged
        } else {
            Self::Applied(patched)
        }
    }
}

/// A named, idempotent textual fixup for a single file.
///
/// Applying a rule to its own output must return [`Fixup::Unchanged`].
/// Errors are reserved for content that cannot be understood at all.
pub trait PatchRule: Send + Sync {
    fn name(&self) -> &str;

    fn apply(&self, content: &str) -> PatchResult<Fixup>;
}

/// Non-fatal diagnostic produced while patching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchWarning {
    pub target: String,
    pub rule: Option<String>,
    pub message: String,
}

impl PatchWarning {
    pub fn missing_target(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            rule: None,
            message: "file not found, fixups skipped".to_string(),
        }
    }

    pub fn skipped(
        target: impl Into<String>,
        rule: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            target: target.into(),
            rule: Some(rule.into()),
            message: reason.into(),
        }
    }
}

impl fmt::Display for PatchWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.rule {
            Some(rule) => write!(f, "PatchWarning: {} [{}]: {}", self.target, rule, self.message),
            None => write!(f, "PatchWarning: {}: {}", self.target, self.message),
        }
    }
}
