//! Error types for document ingestion and validation.

use thiserror::Error;

/// Result type alias for spec operations.
pub type SpecResult<T> = Result<T, SpecError>;

/// Errors that can occur while ingesting externally produced documents.
#[derive(Error, Debug)]
pub enum SpecError {
    #[error("SchemaError: architecture is missing required key(s): {}", .missing.join(", "))]
    MissingKeys { missing: Vec<String> },

    #[error("SchemaError: architecture key '{key}' has an invalid shape: {message}")]
    InvalidShape { key: String, message: String },

    /// The response could not be parsed even after quote normalization.
    ///
    /// `response` is the raw collaborator output and `attempted` the
    /// extracted candidate, both kept for diagnostics.
    #[error("ParseError: {message}")]
    Parse {
        message: String,
        response: String,
        attempted: String,
    },

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SpecError {
    /// Whether this is one of the `SchemaError` variants.
    pub fn is_schema_error(&self) -> bool {
        matches!(self, Self::MissingKeys { .. } | Self::InvalidShape { .. })
    }

    /// Whether this is a `ParseError`.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::Parse { .. } | Self::Json(_))
    }

    pub(crate) fn parse(
        message: impl Into<String>,
        response: impl Into<String>,
        attempted: impl Into<String>,
    ) -> Self {
        Self::Parse {
            message: message.into(),
            response: response.into(),
            attempted: attempted.into(),
        }
    }

    pub(crate) fn invalid_shape(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidShape {
            key: key.into(),
            message: message.into(),
        }
    }
}
