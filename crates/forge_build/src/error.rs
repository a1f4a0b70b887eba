//! Error types for the build module.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for build operations.
pub type BuildResult<T> = Result<T, BuildError>;

/// Errors raised while scaffolding, compiling or publishing a project.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Workspace error: {0}")]
    Workspace(String),

    #[error("Scaffold failed: {0}")]
    Scaffold(String),

    #[error("Dependency resolution failed after {attempts} attempt(s): {output}")]
    DependencyResolution { attempts: u32, output: String },

    #[error("Compilation failed after {attempts} attempt(s): {output}")]
    Compile { attempts: u32, output: String },

    #[error("Compiler exited cleanly but no artifact was found (checked {})", join_paths(.searched))]
    ArtifactNotFound { searched: Vec<PathBuf> },

    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("Runner error: {0}")]
    Runner(#[from] forge_runner::RunnerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
