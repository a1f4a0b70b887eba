//! Process runner backed by `tokio::process`.
//!
//! Every child runs in the invocation's working directory; the runner never
//! changes the working directory of the calling process. A child that outlives
//! its timeout is killed. On Unix the child leads its own process group and
//! the whole group is killed, so helpers it started (the Dart VM, a Gradle
//! daemon) go with it. Elsewhere only the direct child is killed.

use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::{Invocation, RunConfig};
use crate::error::{RunnerError, RunnerResult};
use crate::runner::{ExecutionResult, ToolRunner};

/// Timeout for availability probes.
const PROBE_TIMEOUT: Duration = Duration::from_secs(60);

/// CLI runner options.
#[derive(Debug, Clone)]
pub struct CliRunnerOptions {
    /// Dry-run mode (log commands without executing)
    pub dry_run: bool,
    /// Flag passed to programs when probing availability
    pub probe_flag: String,
}

impl Default for CliRunnerOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            probe_flag: "--version".to_string(),
        }
    }
}

impl CliRunnerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    pub fn probe_flag(mut self, flag: impl Into<String>) -> Self {
        self.probe_flag = flag.into();
        self
    }
}

/// Runs commands as child processes.
#[derive(Debug, Clone, Default)]
pub struct CliRunner {
    options: CliRunnerOptions,
}

impl CliRunner {
    pub fn new(options: CliRunnerOptions) -> Self {
        Self { options }
    }

    pub fn is_dry_run(&self) -> bool {
        self.options.dry_run
    }

    fn build_command(invocation: &Invocation) -> RunnerResult<Command> {
        if invocation.program.trim().is_empty() {
            return Err(RunnerError::InvalidInvocation("empty program".to_string()));
        }
        if let Some(dir) = &invocation.workdir {
            if !dir.is_dir() {
                return Err(RunnerError::InvalidInvocation(format!(
                    "working directory does not exist: {}",
                    dir.display()
                )));
            }
        }

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .envs(&invocation.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &invocation.workdir {
            cmd.current_dir(dir);
        }
        #[cfg(unix)]
        cmd.process_group(0);
        Ok(cmd)
    }
}

/// Kill every process left in the group led by `pid`.
#[cfg(unix)]
async fn kill_process_group(pid: Option<u32>) {
    let Some(pid) = pid else {
        return;
    };
    let status = Command::new("kill")
        .args(["-KILL", "--", &format!("-{}", pid)])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;
    if let Err(e) = status {
        debug!("Could not signal process group {}: {}", pid, e);
    }
}

#[cfg(not(unix))]
async fn kill_process_group(_pid: Option<u32>) {}

#[async_trait]
impl ToolRunner for CliRunner {
    async fn is_available(&self, program: &str) -> RunnerResult<bool> {
        let probe = Invocation::new(program).arg(self.options.probe_flag.clone());
        let mut cmd = Self::build_command(&probe)?;
        cmd.stdout(Stdio::null()).stderr(Stdio::null());

        let status = match cmd.spawn() {
            Ok(mut child) => tokio::time::timeout(PROBE_TIMEOUT, child.wait()).await,
            Err(e) => {
                debug!("{} not spawnable: {}", program, e);
                return Ok(false);
            }
        };

        Ok(matches!(status, Ok(Ok(s)) if s.success()))
    }

    async fn run(
        &self,
        invocation: &Invocation,
        run_config: &RunConfig,
    ) -> RunnerResult<ExecutionResult> {
        let command = invocation.display();
        info!("Running: {}", command);
        debug!("Working directory: {:?}", invocation.workdir);

        if self.options.dry_run {
            info!("[DRY-RUN] Would execute: {}", command);
            let now = Utc::now();
            return Ok(ExecutionResult {
                stdout: format!("[DRY-RUN] Command: {}", command),
                command,
                exit_code: 0,
                stderr: String::new(),
                started_at: now,
                finished_at: now,
                duration_ms: 0,
            });
        }

        let mut cmd = Self::build_command(invocation)?;
        let started_at = Utc::now();
        let start = Instant::now();

        let child = cmd.spawn().map_err(|e| RunnerError::SpawnFailed {
            program: invocation.program.clone(),
            message: e.to_string(),
        })?;
        let pid = child.id();

        // Dropping the pending future drops the child, which kills it.
        let output = match run_config.timeout_duration() {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(output) => output?,
                Err(_) => {
                    warn!("{} timed out after {}s", command, run_config.timeout_seconds);
                    kill_process_group(pid).await;
                    return Err(RunnerError::Timeout(run_config.timeout_seconds));
                }
            },
            None => child.wait_with_output().await?,
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        let exit_code = output.status.code().map(i64::from).unwrap_or(-1);
        debug!("{} exited with {} in {}ms", command, exit_code, duration_ms);

        Ok(ExecutionResult {
            command,
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            started_at,
            finished_at: Utc::now(),
            duration_ms,
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_runs_in_workdir() {
        let temp = tempdir().unwrap();
        let cwd_before = std::env::current_dir().unwrap();

        let inv = Invocation::new("pwd").workdir(temp.path());
        let result = CliRunner::default().run(&inv, &RunConfig::default()).await.unwrap();

        assert!(result.success());
        let reported = std::fs::canonicalize(result.stdout.trim()).unwrap();
        assert_eq!(reported, std::fs::canonicalize(temp.path()).unwrap());
        assert_eq!(std::env::current_dir().unwrap(), cwd_before);
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_not_error() {
        let inv = Invocation::new("sh").args(["-c", "echo oops >&2; exit 3"]);
        let result = CliRunner::default().run(&inv, &RunConfig::default()).await.unwrap();

        assert_eq!(result.exit_code, 3);
        assert_eq!(result.stderr.trim(), "oops");
    }

    #[tokio::test]
    async fn test_timeout_kills_child() {
        let inv = Invocation::new("sleep").arg("5");
        let started = Instant::now();
        let err = CliRunner::default()
            .run(&inv, &RunConfig::default().timeout(1))
            .await
            .unwrap_err();

        assert!(err.is_timeout());
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_timeout_kills_grandchildren() {
        let temp = tempdir().unwrap();
        let inv = Invocation::new("sh")
            .args(["-c", "sleep 30 & echo $! > grandchild.pid; wait"])
            .workdir(temp.path());
        let err = CliRunner::default()
            .run(&inv, &RunConfig::default().timeout(1))
            .await
            .unwrap_err();
        assert!(err.is_timeout());

        let pid = std::fs::read_to_string(temp.path().join("grandchild.pid")).unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        // Gone, or a zombie waiting to be reaped by init.
        let state = std::fs::read_to_string(format!("/proc/{}/stat", pid.trim()))
            .ok()
            .and_then(|stat| stat.split_whitespace().nth(2).map(str::to_string));
        assert!(matches!(state.as_deref(), None | Some("Z")));
    }

    #[tokio::test]
    async fn test_missing_program() {
        let inv = Invocation::new("definitely-not-a-real-tool-4711");
        let runner = CliRunner::default();
        assert!(matches!(
            runner.run(&inv, &RunConfig::default()).await,
            Err(RunnerError::SpawnFailed { .. })
        ));
        assert!(!runner.is_available("definitely-not-a-real-tool-4711").await.unwrap());
    }

    #[tokio::test]
    async fn test_dry_run() {
        let runner = CliRunner::new(CliRunnerOptions::new().dry_run());
        let inv = Invocation::new("flutter").args(["build", "apk"]);
        let result = runner.run(&inv, &RunConfig::default()).await.unwrap();
        assert!(result.stdout.contains("flutter build apk"));
    }

    #[tokio::test]
    async fn test_missing_workdir_is_rejected() {
        let inv = Invocation::new("pwd").workdir("/nonexistent/forge/dir");
        assert!(matches!(
            CliRunner::default().run(&inv, &RunConfig::default()).await,
            Err(RunnerError::InvalidInvocation(_))
        ));
    }
}
