//! Error types for the agents module.

use thiserror::Error;

/// Result type alias for agent operations.
pub type AgentResult<T> = Result<T, AgentError>;

/// Errors raised by collaborators and stages.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Classifier failed: {0}")]
    Classifier(String),

    #[error("Architect failed: {0}")]
    Architect(String),

    #[error("Code generation failed: {0}")]
    Generator(String),

    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("Spec error: {0}")]
    Spec(#[from] forge_spec::SpecError),

    #[error("Patch error: {0}")]
    Patch(#[from] forge_patch::PatchError),

    #[error("Build error: {0}")]
    Build(#[from] forge_build::BuildError),

    #[error("Core error: {0}")]
    Core(#[from] forge_core::CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
