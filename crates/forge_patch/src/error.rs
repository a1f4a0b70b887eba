//! Error types for the patch module.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for patch operations.
pub type PatchResult<T> = Result<T, PatchError>;

/// Fatal patch failures. Missing anchors and files are warnings, not errors.
#[derive(Error, Debug)]
pub enum PatchError {
    #[error("Invalid manifest {path}: {message}")]
    InvalidManifest { path: String, message: String },

    #[error("Invalid rule '{rule}': {message}")]
    InvalidRule { rule: String, message: String },

    #[error("Cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl PatchError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid_rule(rule: impl Into<String>, err: regex::Error) -> Self {
        Self::InvalidRule {
            rule: rule.into(),
            message: err.to_string(),
        }
    }
}
