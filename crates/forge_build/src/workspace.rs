//! Per-session temporary workspaces and the startup sweep.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;
use walkdir::WalkDir;

use crate::error::{BuildError, BuildResult};

/// Default workspace name prefix.
pub const WORKSPACE_PREFIX: &str = "forge_app_";

/// Idle time after which a workspace counts as orphaned.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(3600);

/// Creates and reclaims session workspaces under a temp root.
#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    root: PathBuf,
    prefix: String,
    stale_after: Duration,
}

/// Outcome of a sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub removed: Vec<PathBuf>,
    /// Workspaces with recent activity, left for their running session
    pub skipped: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

impl SweepReport {
    pub fn removed_count(&self) -> usize {
        self.removed.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }
}

impl WorkspaceManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            prefix: WORKSPACE_PREFIX.to_string(),
            stale_after: DEFAULT_STALE_AFTER,
        }
    }

    /// Idle threshold for the sweep. `Duration::ZERO` reclaims every
    /// workspace regardless of activity.
    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create a fresh directory `<root>/<prefix><session_id>_<suffix>`.
    ///
    /// The directory must not exist beforehand; a clash is an error rather
    /// than a shared workspace.
    pub fn create(&self, session_id: &str) -> BuildResult<PathBuf> {
        if session_id.is_empty()
            || !session_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(BuildError::Workspace(format!(
                "session id '{}' cannot be used in a directory name",
                session_id
            )));
        }

        fs::create_dir_all(&self.root)?;
        let suffix = Uuid::new_v4().simple().to_string();
        let path = self
            .root
            .join(format!("{}{}_{}", self.prefix, session_id, &suffix[..8]));

        match fs::create_dir(&path) {
            Ok(()) => {
                info!("Created workspace {:?}", path);
                Ok(path)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(BuildError::Workspace(format!(
                "workspace {} already exists",
                path.display()
            ))),
            Err(e) => Err(e.into()),
        }
    }

    /// Whether `path` is a workspace this manager would have created.
    pub fn owns(&self, path: &Path) -> bool {
        path.parent() == Some(self.root.as_path())
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(&self.prefix))
    }

    /// Whether nothing in `path` was touched within the idle threshold.
    ///
    /// A running build keeps writing under its workspace, so the newest
    /// modification time anywhere in the tree stands in for liveness.
    pub fn is_stale(&self, path: &Path) -> bool {
        if self.stale_after.is_zero() {
            return true;
        }
        let Some(cutoff) = SystemTime::now().checked_sub(self.stale_after) else {
            return false;
        };
        let recent = WalkDir::new(path)
            .into_iter()
            .filter_map(Result::ok)
            .filter_map(|entry| entry.metadata().ok())
            .filter_map(|meta| meta.modified().ok())
            .any(|modified| modified > cutoff);
        !recent
    }

    /// Remove every stale directory under the root that carries the prefix.
    ///
    /// Best-effort: failures are collected, never returned as errors.
    pub fn sweep(&self) -> SweepReport {
        let mut report = SweepReport::default();
        let pattern = format!(
            "{}/{}*",
            glob::Pattern::escape(&self.root.to_string_lossy()),
            glob::Pattern::escape(&self.prefix)
        );

        let entries = match glob::glob(&pattern) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Invalid sweep pattern {}: {}", pattern, e);
                return report;
            }
        };

        for entry in entries {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    report.failed.push((e.path().to_path_buf(), e.to_string()));
                    continue;
                }
            };
            if !path.is_dir() {
                continue;
            }
            if !self.is_stale(&path) {
                debug!("Keeping active workspace {:?}", path);
                report.skipped.push(path);
                continue;
            }
            match fs::remove_dir_all(&path) {
                Ok(()) => {
                    debug!("Removed orphaned workspace {:?}", path);
                    report.removed.push(path);
                }
                Err(e) => {
                    warn!("Could not remove {:?}: {}", path, e);
                    report.failed.push((path, e.to_string()));
                }
            }
        }

        info!(
            "Sweep of {:?}: removed {}, kept {} active, failed {}",
            self.root,
            report.removed_count(),
            report.skipped_count(),
            report.failed_count()
        );
        report
    }
}
