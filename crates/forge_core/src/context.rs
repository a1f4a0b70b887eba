//! Generation context carried through the pipeline.
//!
//! One context exists per session. Stages mutate it only through the methods
//! below, which refuse writes that would break the pipeline invariants: the
//! stage order is fixed, each stage writes its own fields once, and nothing
//! is written after the context has failed.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use forge_spec::{Architecture, Requirements};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};

/// Pipeline position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageId {
    Classify,
    Architect,
    Scaffold,
    Generate,
    Patch,
    Build,
    Publish,
    Completed,
    Error,
}

impl StageId {
    /// The working stages, in execution order.
    pub const PIPELINE: [StageId; 7] = [
        StageId::Classify,
        StageId::Architect,
        StageId::Scaffold,
        StageId::Generate,
        StageId::Patch,
        StageId::Build,
        StageId::Publish,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Classify => "classify",
            Self::Architect => "architect",
            Self::Scaffold => "scaffold",
            Self::Generate => "generate",
            Self::Patch => "patch",
            Self::Build => "build",
            Self::Publish => "publish",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "classify" => Some(Self::Classify),
            "architect" => Some(Self::Architect),
            "scaffold" => Some(Self::Scaffold),
            "generate" => Some(Self::Generate),
            "patch" => Some(Self::Patch),
            "build" => Some(Self::Build),
            "publish" => Some(Self::Publish),
            "completed" => Some(Self::Completed),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }

    /// The stage that follows on success.
    pub fn next(&self) -> Option<StageId> {
        match self {
            Self::Classify => Some(Self::Architect),
            Self::Architect => Some(Self::Scaffold),
            Self::Scaffold => Some(Self::Generate),
            Self::Generate => Some(Self::Patch),
            Self::Patch => Some(Self::Build),
            Self::Build => Some(Self::Publish),
            Self::Publish => Some(Self::Completed),
            Self::Completed | Self::Error => None,
        }
    }

    /// Progress reached once this stage completes.
    pub fn milestone(&self) -> Option<u8> {
        match self {
            Self::Classify => Some(20),
            Self::Architect => Some(50),
            Self::Scaffold => Some(60),
            Self::Generate => Some(80),
            Self::Patch => Some(85),
            Self::Build => Some(95),
            Self::Publish | Self::Completed => Some(100),
            Self::Error => None,
        }
    }

    /// Position in the canonical order; `Error` sorts last.
    pub fn ordinal(&self) -> usize {
        *self as usize
    }

    /// Whether the FSM permits moving from `self` to `to`.
    pub fn can_transition_to(&self, to: StageId) -> bool {
        if self.is_terminal() {
            return false;
        }
        to == StageId::Error || self.next() == Some(to)
    }
}

impl std::fmt::Display for StageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Overall session status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl BuildStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The request that started a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInput {
    pub prompt: String,
    pub hardware_commands: Option<String>,
}

impl UserInput {
    /// Create a new input; the prompt must not be blank.
    pub fn new(prompt: impl Into<String>) -> CoreResult<Self> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(CoreError::InvalidInput("prompt must not be empty".to_string()));
        }
        Ok(Self {
            prompt: prompt.trim().to_string(),
            hardware_commands: None,
        })
    }

    /// Attach structured hardware-command text. Blank text is ignored.
    pub fn with_hardware_commands(mut self, commands: impl Into<String>) -> Self {
        let commands = commands.into();
        if !commands.trim().is_empty() {
            self.hardware_commands = Some(commands.trim().to_string());
        }
        self
    }
}

/// Attempt counts recorded by the Build stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReport {
    pub dependency_attempts: u32,
    pub compile_attempts: u32,
    /// One line per attempt, in execution order.
    pub attempt_log: Vec<String>,
}

/// Mutable state of one generation session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationContext {
    session_id: String,
    user_input: UserInput,
    requirements: Option<Requirements>,
    architecture: Option<Architecture>,
    sources: BTreeMap<String, String>,
    workspace_path: Option<PathBuf>,
    project_path: Option<PathBuf>,
    stage: StageId,
    status: BuildStatus,
    progress: u8,
    error_log: Vec<String>,
    warnings: Vec<String>,
    artifact_path: Option<PathBuf>,
    stage_history: Vec<StageId>,
    build_report: Option<BuildReport>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl GenerationContext {
    /// Create a fresh context with a new session id.
    pub fn new(user_input: UserInput) -> Self {
        let now = Utc::now();
        Self {
            session_id: Uuid::new_v4().to_string(),
            user_input,
            requirements: None,
            architecture: None,
            sources: BTreeMap::new(),
            workspace_path: None,
            project_path: None,
            stage: StageId::Classify,
            status: BuildStatus::Pending,
            progress: 0,
            error_log: Vec::new(),
            warnings: Vec::new(),
            artifact_path: None,
            stage_history: Vec::new(),
            build_report: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn user_input(&self) -> &UserInput {
        &self.user_input
    }

    pub fn requirements(&self) -> Option<&Requirements> {
        self.requirements.as_ref()
    }

    pub fn architecture(&self) -> Option<&Architecture> {
        self.architecture.as_ref()
    }

    pub fn sources(&self) -> &BTreeMap<String, String> {
        &self.sources
    }

    pub fn workspace_path(&self) -> Option<&Path> {
        self.workspace_path.as_deref()
    }

    pub fn project_path(&self) -> Option<&Path> {
        self.project_path.as_deref()
    }

    pub fn stage(&self) -> StageId {
        self.stage
    }

    pub fn status(&self) -> BuildStatus {
        self.status
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn error_log(&self) -> &[String] {
        &self.error_log
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn artifact_path(&self) -> Option<&Path> {
        self.artifact_path.as_deref()
    }

    pub fn stage_history(&self) -> &[StageId] {
        &self.stage_history
    }

    pub fn build_report(&self) -> Option<&BuildReport> {
        self.build_report.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_failed(&self) -> bool {
        self.status == BuildStatus::Failed
    }

    pub fn is_finished(&self) -> bool {
        self.stage.is_terminal()
    }

    /// Move to `stage` and mark the session in progress.
    ///
    /// The first stage entered must be `Classify`; every later one must be
    /// the successor of the previously entered stage.
    pub fn enter_stage(&mut self, stage: StageId) -> CoreResult<()> {
        self.ensure_active()?;
        match self.stage_history.last() {
            None if stage == StageId::Classify => {}
            None => {
                return Err(CoreError::InvalidTransition {
                    from: self.stage,
                    to: stage,
                })
            }
            Some(previous) if previous.next() == Some(stage) => {}
            Some(previous) => {
                return Err(CoreError::InvalidTransition {
                    from: *previous,
                    to: stage,
                })
            }
        }

        self.stage = stage;
        self.status = BuildStatus::InProgress;
        self.stage_history.push(stage);
        self.touch();
        Ok(())
    }

    /// Mark the current stage finished and raise progress to its milestone.
    ///
    /// Completing `Publish` moves the context to the `Completed` terminal.
    pub fn complete_stage(&mut self, stage: StageId) -> CoreResult<()> {
        self.ensure_active()?;
        self.ensure_stage(stage)?;

        if let Some(milestone) = stage.milestone() {
            self.progress = self.progress.max(milestone);
        }

        if stage == StageId::Publish {
            self.stage = StageId::Completed;
            self.status = BuildStatus::Completed;
            self.progress = 100;
            self.stage_history.push(StageId::Completed);
        }
        self.touch();
        Ok(())
    }

    /// Record a fatal failure: append to the error log and move to `Error`.
    ///
    /// Progress is left where it was.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.error_log.push(message.into());
        self.status = BuildStatus::Failed;
        if self.stage != StageId::Error {
            self.stage = StageId::Error;
            self.stage_history.push(StageId::Error);
        }
        self.touch();
    }

    /// Record a non-fatal diagnostic.
    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
        self.touch();
    }

    pub fn set_requirements(&mut self, requirements: Requirements) -> CoreResult<()> {
        self.ensure_writable(StageId::Classify)?;
        if self.requirements.is_some() {
            return Err(CoreError::InvalidState("requirements already set".to_string()));
        }
        self.requirements = Some(requirements);
        self.touch();
        Ok(())
    }

    pub fn set_architecture(&mut self, architecture: Architecture) -> CoreResult<()> {
        self.ensure_writable(StageId::Architect)?;
        if self.architecture.is_some() {
            return Err(CoreError::InvalidState("architecture already set".to_string()));
        }
        self.architecture = Some(architecture);
        self.touch();
        Ok(())
    }

    /// Record the exclusive workspace and the project directory inside it.
    pub fn set_workspace(&mut self, workspace: PathBuf, project: PathBuf) -> CoreResult<()> {
        self.ensure_writable(StageId::Scaffold)?;
        if self.workspace_path.is_some() {
            return Err(CoreError::InvalidState("workspace already set".to_string()));
        }
        if !project.starts_with(&workspace) {
            return Err(CoreError::InvalidState(format!(
                "project {:?} is not inside workspace {:?}",
                project, workspace
            )));
        }
        self.workspace_path = Some(workspace);
        self.project_path = Some(project);
        self.touch();
        Ok(())
    }

    pub fn set_sources(&mut self, sources: BTreeMap<String, String>) -> CoreResult<()> {
        self.ensure_writable(StageId::Generate)?;
        if !self.sources.is_empty() {
            return Err(CoreError::InvalidState("sources already set".to_string()));
        }
        self.sources = sources;
        self.touch();
        Ok(())
    }

    /// Rewrite an existing source in place. The path set cannot grow.
    pub fn update_source(&mut self, path: &str, content: String) -> CoreResult<()> {
        self.ensure_writable(StageId::Patch)?;
        match self.sources.get_mut(path) {
            Some(existing) => {
                *existing = content;
                self.touch();
                Ok(())
            }
            None => Err(CoreError::InvalidState(format!("unknown source path: {}", path))),
        }
    }

    pub fn set_build_report(&mut self, report: BuildReport) -> CoreResult<()> {
        self.ensure_writable(StageId::Build)?;
        self.build_report = Some(report);
        self.touch();
        Ok(())
    }

    pub fn set_artifact(&mut self, path: PathBuf) -> CoreResult<()> {
        self.ensure_writable(StageId::Publish)?;
        self.artifact_path = Some(path);
        self.touch();
        Ok(())
    }

    fn ensure_active(&self) -> CoreResult<()> {
        if self.is_failed() {
            return Err(CoreError::InvalidState(format!(
                "session {} has failed",
                self.session_id
            )));
        }
        if self.stage.is_terminal() {
            return Err(CoreError::InvalidState(format!(
                "session {} already reached {}",
                self.session_id, self.stage
            )));
        }
        Ok(())
    }

    fn ensure_stage(&self, stage: StageId) -> CoreResult<()> {
        if self.stage != stage || self.status != BuildStatus::InProgress {
            return Err(CoreError::InvalidState(format!(
                "{} is not the running stage (current: {}, status: {})",
                stage, self.stage, self.status
            )));
        }
        Ok(())
    }

    fn ensure_writable(&self, owner: StageId) -> CoreResult<()> {
        self.ensure_active()?;
        self.ensure_stage(owner)
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
