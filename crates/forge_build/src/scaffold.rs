//! Project scaffolding: `flutter create` plus the architecture's file tree.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use forge_runner::{RunConfig, RunnerError};
use forge_spec::StructureNode;

use crate::error::{BuildError, BuildResult};
use crate::toolchain::FlutterToolchain;

/// Make `name` usable as a Dart package and directory name.
pub fn sanitize_app_name(name: &str) -> String {
    let mut sanitized: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' { c } else { '_' })
        .collect();
    if sanitized.starts_with(|c: char| c.is_ascii_digit()) {
        sanitized.insert_str(0, "app_");
    }
    if sanitized.is_empty() {
        sanitized = "flutter_app".to_string();
    }
    sanitized
}

/// Placeholder text written for a leaf of the structure tree.
pub fn placeholder(file_name: &str, description: &str) -> String {
    format!("// {}\n// TODO: Implement {}\n\n", description, file_name)
}

/// Options for `flutter create`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaffoldOptions {
    pub platform: String,
    pub android_language: String,
    pub timeout: Duration,
}

impl Default for ScaffoldOptions {
    fn default() -> Self {
        Self {
            platform: "android".to_string(),
            android_language: "kotlin".to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

/// What materializing a structure tree did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MaterializeReport {
    pub directories: Vec<PathBuf>,
    pub written: Vec<PathBuf>,
    /// Existing non-empty files left untouched
    pub kept: Vec<PathBuf>,
}

/// A scaffolded project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScaffoldOutcome {
    pub project_name: String,
    pub project_path: PathBuf,
    pub materialized: MaterializeReport,
    pub file_count: usize,
}

/// Creates the Flutter project and lays out the architecture's tree.
#[derive(Debug, Clone)]
pub struct ScaffoldBuilder {
    flutter: FlutterToolchain,
    options: ScaffoldOptions,
}

impl ScaffoldBuilder {
    pub fn new(flutter: FlutterToolchain) -> Self {
        Self {
            flutter,
            options: ScaffoldOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ScaffoldOptions) -> Self {
        self.options = options;
        self
    }

    /// Scaffold `app_name` inside `workspace` and materialize `structure`.
    pub async fn scaffold(
        &self,
        workspace: &Path,
        app_name: &str,
        structure: &StructureNode,
    ) -> BuildResult<ScaffoldOutcome> {
        let project_name = sanitize_app_name(app_name);
        let project_path = self.create_project(workspace, &project_name).await?;
        let materialized = materialize(&project_path, structure)?;
        let file_count = count_files(&project_path);
        info!(
            "Project {} scaffolded with {} files at {:?}",
            project_name, file_count, project_path
        );

        Ok(ScaffoldOutcome {
            project_name,
            project_path,
            materialized,
            file_count,
        })
    }

    /// Run `flutter create` for `project_name` inside `workspace`.
    pub async fn create_project(
        &self,
        workspace: &Path,
        project_name: &str,
    ) -> BuildResult<PathBuf> {
        let project_path = workspace.join(project_name);
        let run_config = RunConfig::with_duration(self.options.timeout);

        let result = self
            .flutter
            .create(
                workspace,
                project_name,
                &self.options.platform,
                &self.options.android_language,
                &project_path,
                &run_config,
            )
            .await
            .map_err(|e| match e {
                RunnerError::Timeout(secs) => {
                    BuildError::Scaffold(format!("flutter create timed out after {}s", secs))
                }
                other => BuildError::Scaffold(other.to_string()),
            })?;

        if !result.success() {
            return Err(BuildError::Scaffold(format!(
                "flutter create exited with {}: {}",
                result.exit_code,
                result.tail(20)
            )));
        }
        if !project_path.is_dir() {
            return Err(BuildError::Scaffold(format!(
                "flutter create reported success but {} is missing",
                project_path.display()
            )));
        }
        Ok(project_path)
    }
}

fn check_entry_name(name: &str) -> BuildResult<()> {
    let mut components = Path::new(name).components();
    let plain =
        matches!(components.next(), Some(Component::Normal(_))) && components.next().is_none();
    if name.is_empty() || !plain || name.contains(['/', '\\']) || name.contains("..") {
        return Err(BuildError::Scaffold(format!("invalid structure entry '{}'", name)));
    }
    Ok(())
}

/// Write the structure tree under `project`.
///
/// Directories are created before their children. A leaf whose file already
/// exists with content is kept as is, so the scaffold tool's `main.dart`
/// survives.
pub fn materialize(project: &Path, structure: &StructureNode) -> BuildResult<MaterializeReport> {
    let mut report = MaterializeReport::default();
    match structure {
        StructureNode::Directory(children) => {
            materialize_children(project, children, &mut report)?;
        }
        StructureNode::File(description) => {
            warn!("Structure root is a file ({}); nothing to materialize", description);
        }
    }
    Ok(report)
}

fn materialize_children(
    dir: &Path,
    children: &std::collections::BTreeMap<String, StructureNode>,
    report: &mut MaterializeReport,
) -> BuildResult<()> {
    for (name, node) in children {
        check_entry_name(name)?;
        let path = dir.join(name);
        match node {
            StructureNode::Directory(grandchildren) => {
                fs::create_dir_all(&path)?;
                report.directories.push(path.clone());
                materialize_children(&path, grandchildren, report)?;
            }
            StructureNode::File(description) => {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                let has_content = fs::metadata(&path).map(|m| m.len() > 0).unwrap_or(false);
                if has_content {
                    debug!("Keeping existing {:?}", path);
                    report.kept.push(path);
                } else {
                    fs::write(&path, placeholder(name, description))?;
                    report.written.push(path);
                }
            }
        }
    }
    Ok(())
}

/// Number of regular files under `root`.
pub fn count_files(root: &Path) -> usize {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .count()
}
