//! Moves verified artifacts into permanent storage.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{BuildError, BuildResult};

/// `<app>_<first 8 chars of session>.apk`, with everything outside
/// `[a-z0-9_]` in the lower-cased app name mapped to `_`.
pub fn artifact_file_name(app_name: &str, session_id: &str) -> String {
    let clean: String = app_name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    let short: String = session_id.chars().take(8).collect();
    format!("{}_{}.apk", clean, short)
}

/// Copies artifacts into an output directory.
#[derive(Debug, Clone)]
pub struct ArtifactPublisher {
    output_dir: PathBuf,
}

impl ArtifactPublisher {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Copy `artifact` to its permanent name and return the new path.
    pub fn publish(
        &self,
        artifact: &Path,
        app_name: &str,
        session_id: &str,
    ) -> BuildResult<PathBuf> {
        if !artifact.is_file() {
            return Err(BuildError::Publish(format!(
                "artifact {} does not exist",
                artifact.display()
            )));
        }
        fs::create_dir_all(&self.output_dir).map_err(|e| {
            BuildError::Publish(format!("cannot create {}: {}", self.output_dir.display(), e))
        })?;

        let target = self.output_dir.join(artifact_file_name(app_name, session_id));
        fs::copy(artifact, &target).map_err(|e| {
            BuildError::Publish(format!("cannot copy to {}: {}", target.display(), e))
        })?;
        info!("Published {:?}", target);
        Ok(target)
    }
}
