//! Errors raised by the CLI itself.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("session {session_id} failed: {}", .errors.join("; "))]
    PipelineFailed { session_id: String, errors: Vec<String> },

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("toolchain unavailable: {0}")]
    ToolchainUnavailable(String),
}
