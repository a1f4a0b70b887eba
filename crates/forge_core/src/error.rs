//! Error types for the core module.

use thiserror::Error;

use crate::context::StageId;

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur during core operations.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Stage not registered: {0}")]
    StageNotRegistered(StageId),

    #[error("Invalid context state: {0}")]
    InvalidState(String),

    #[error("Invalid stage transition: {from} -> {to}")]
    InvalidTransition { from: StageId, to: StageId },

    #[error("{stage} stage failed: {message}")]
    StageFailed { stage: StageId, message: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Spec error: {0}")]
    Spec(#[from] forge_spec::SpecError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CoreError {
    /// Build a stage failure from any displayable error.
    pub fn stage_failed(stage: StageId, message: impl std::fmt::Display) -> Self {
        Self::StageFailed {
            stage,
            message: message.to_string(),
        }
    }

    /// Attribute this error to a stage unless it already is a stage failure.
    pub fn attributed_to(self, stage: StageId) -> Self {
        match self {
            Self::StageFailed { .. } => self,
            other => Self::stage_failed(stage, other),
        }
    }
}
