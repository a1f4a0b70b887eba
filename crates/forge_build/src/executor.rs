//! Retrying dependency resolution and compilation.
//!
//! Both phases run through a [`RetryPolicy`]. Dependency resolution clears
//! the pub cache before each retry; a compile retry performs `flutter clean`
//! and a fresh `pub get` first. A zero exit code only counts as success when
//! an artifact exists at one of [`ARTIFACT_CANDIDATES`].

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use forge_runner::{
    Attempt, AttemptRecord, ExecutionResult, RetryPolicy, RunnerError, RunnerResult,
};

use crate::error::{BuildError, BuildResult};
use crate::toolchain::FlutterToolchain;

/// Release APK locations relative to the project, in priority order.
pub const ARTIFACT_CANDIDATES: [&str; 3] = [
    "build/app/outputs/flutter-apk/app-release.apk",
    "build/app/outputs/apk/release/app-release.apk",
    "build/app/outputs/apk/app-release.apk",
];

/// Lines of tool output kept in error messages.
const OUTPUT_TAIL: usize = 40;

/// First existing candidate artifact under `project`.
pub fn locate_artifact(project: &Path) -> Option<PathBuf> {
    ARTIFACT_CANDIDATES
        .iter()
        .map(|rel| project.join(rel))
        .find(|path| path.is_file())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildPhase {
    DependencyResolution,
    Compile,
}

impl BuildPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DependencyResolution => "dependency resolution",
            Self::Compile => "compile",
        }
    }
}

impl fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of the build's attempt log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptEntry {
    pub phase: BuildPhase,
    pub attempt: u32,
    pub succeeded: bool,
    /// Exit code, timeout or missing-artifact description of a failed attempt
    pub detail: Option<String>,
}

impl AttemptEntry {
    fn from_record(phase: BuildPhase, record: &AttemptRecord) -> Self {
        Self {
            phase,
            attempt: record.attempt,
            succeeded: record.succeeded,
            detail: record.message.clone(),
        }
    }
}

impl fmt::Display for AttemptEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{} attempt {}: {}", self.phase, self.attempt, detail),
            None => write!(f, "{} attempt {}: ok", self.phase, self.attempt),
        }
    }
}

/// Why a single attempt failed.
#[derive(Debug)]
enum AttemptFailure {
    Exit { code: i64, output: String },
    Timeout(u64),
    NoArtifact,
    Runner(RunnerError),
}

impl AttemptFailure {
    fn from_run(result: RunnerResult<ExecutionResult>) -> Result<ExecutionResult, Self> {
        match result {
            Ok(result) if result.success() => Ok(result),
            Ok(result) => Err(Self::Exit {
                code: result.exit_code,
                output: result.tail(OUTPUT_TAIL),
            }),
            Err(RunnerError::Timeout(secs)) => Err(Self::Timeout(secs)),
            Err(e) => Err(Self::Runner(e)),
        }
    }

    fn output(&self) -> String {
        match self {
            Self::Exit { output, .. } => output.clone(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exit { code, output } => {
                let last = output.lines().last().unwrap_or_default();
                write!(f, "exit code {}: {}", code, last)
            }
            Self::Timeout(secs) => write!(f, "timed out after {}s", secs),
            Self::NoArtifact => f.write_str("exit code 0 but no artifact produced"),
            Self::Runner(e) => write!(f, "{}", e),
        }
    }
}

/// Result of a build run: the artifact or the fatal error, plus every
/// attempt made along the way.
#[derive(Debug)]
pub struct BuildOutcome {
    pub result: BuildResult<PathBuf>,
    pub log: Vec<AttemptEntry>,
}

impl BuildOutcome {
    pub fn artifact(&self) -> Option<&Path> {
        self.result.as_ref().ok().map(PathBuf::as_path)
    }

    pub fn attempts(&self, phase: BuildPhase) -> u32 {
        self.log.iter().filter(|e| e.phase == phase).count() as u32
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Human-readable attempt log.
    pub fn log_lines(&self) -> Vec<String> {
        self.log.iter().map(ToString::to_string).collect()
    }

    pub fn into_result(self) -> BuildResult<PathBuf> {
        self.result
    }
}

/// Turns a patched project into a verified release APK.
#[derive(Debug, Clone)]
pub struct BuildExecutor {
    flutter: FlutterToolchain,
    dependency: RetryPolicy,
    compile: RetryPolicy,
}

impl BuildExecutor {
    pub fn new(flutter: FlutterToolchain) -> Self {
        Self {
            flutter,
            dependency: RetryPolicy::dependency_resolution(),
            compile: RetryPolicy::compile(),
        }
    }

    pub fn with_dependency_policy(mut self, policy: RetryPolicy) -> Self {
        self.dependency = policy;
        self
    }

    pub fn with_compile_policy(mut self, policy: RetryPolicy) -> Self {
        self.compile = policy;
        self
    }

    /// Resolve dependencies, then compile. Stops at the first fatal phase.
    pub async fn build(&self, project: &Path) -> BuildOutcome {
        info!("Building {:?}", project);
        let mut log = Vec::new();

        let deps = self
            .dependency
            .execute(BuildPhase::DependencyResolution.as_str(), move |attempt| {
                self.dependency_attempt(project, attempt)
            })
            .await;
        log.extend(
            deps.attempts
                .iter()
                .map(|r| AttemptEntry::from_record(BuildPhase::DependencyResolution, r)),
        );
        if let Err(failure) = deps.result {
            return BuildOutcome {
                result: Err(BuildError::DependencyResolution {
                    attempts: deps.attempts.len() as u32,
                    output: failure.output(),
                }),
                log,
            };
        }

        let compile = self
            .compile
            .execute(BuildPhase::Compile.as_str(), move |attempt| {
                self.compile_attempt(project, attempt)
            })
            .await;
        log.extend(
            compile
                .attempts
                .iter()
                .map(|r| AttemptEntry::from_record(BuildPhase::Compile, r)),
        );

        let result = match compile.result {
            Ok(artifact) => {
                info!("Artifact ready at {:?}", artifact);
                Ok(artifact)
            }
            Err(AttemptFailure::NoArtifact) => Err(BuildError::ArtifactNotFound {
                searched: ARTIFACT_CANDIDATES.iter().map(|rel| project.join(rel)).collect(),
            }),
            Err(failure) => Err(BuildError::Compile {
                attempts: compile.attempts.len() as u32,
                output: failure.output(),
            }),
        };
        BuildOutcome { result, log }
    }

    async fn dependency_attempt(
        &self,
        project: &Path,
        attempt: Attempt,
    ) -> Result<ExecutionResult, AttemptFailure> {
        let run_config = self.dependency.run_config();
        if attempt.clean_first {
            let cleaned = self.flutter.pub_cache_clean(project, &run_config).await;
            log_clean_failure(cleaned);
        }
        AttemptFailure::from_run(self.flutter.pub_get(project, &run_config).await)
    }

    async fn compile_attempt(
        &self,
        project: &Path,
        attempt: Attempt,
    ) -> Result<PathBuf, AttemptFailure> {
        if attempt.clean_first {
            let dep_config = self.dependency.run_config();
            log_clean_failure(self.flutter.clean(project, &dep_config).await);
            AttemptFailure::from_run(self.flutter.pub_get(project, &dep_config).await)?;
        }

        let compile_config = self.compile.run_config();
        AttemptFailure::from_run(self.flutter.build_apk(project, &compile_config).await)?;
        locate_artifact(project).ok_or(AttemptFailure::NoArtifact)
    }
}

/// A failed clean before a retry is logged; the retry proceeds anyway.
fn log_clean_failure(result: RunnerResult<ExecutionResult>) {
    match result {
        Ok(r) if r.success() => {}
        Ok(r) => warn!("{} exited with {}", r.command, r.exit_code),
        Err(e) => warn!("Clean before retry failed: {}", e),
    }
}
