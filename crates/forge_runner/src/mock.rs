//! Mock tool runner for testing.
//!
//! Provides a scriptable implementation of [`ToolRunner`] so build logic can
//! be exercised without the real toolchain. Responses are either keyed by a
//! substring of the argument line or taken from a default sequence, and a
//! response may create files to simulate build outputs.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::config::{Invocation, RunConfig};
use crate::error::{RunnerError, RunnerResult};
use crate::runner::{ExecutionResult, ToolRunner};

/// Predefined mock response for a command.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub exit_code: i64,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
    /// Report a timeout instead of a result
    pub timed_out: bool,
    /// Files written (relative to the invocation workdir) when this response fires
    pub creates_files: Vec<PathBuf>,
    /// Directories created when this response fires
    pub creates_dirs: Vec<PathBuf>,
}

impl MockResponse {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
            duration_ms: 100,
            timed_out: false,
            creates_files: Vec::new(),
            creates_dirs: Vec::new(),
        }
    }

    pub fn failure(exit_code: i64, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stderr: stderr.into(),
            ..Self::success("")
        }
    }

    pub fn timeout() -> Self {
        Self {
            timed_out: true,
            ..Self::success("")
        }
    }

    pub fn with_duration(mut self, ms: u64) -> Self {
        self.duration_ms = ms;
        self
    }

    /// Write a placeholder file at `path` when this response fires.
    pub fn creates_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.creates_files.push(path.into());
        self
    }

    /// Create a directory at `path` when this response fires.
    pub fn creates_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.creates_dirs.push(path.into());
        self
    }
}

/// Captured call information for verification.
#[derive(Debug, Clone)]
pub struct CapturedCall {
    pub method: String,
    pub program: String,
    pub args: Vec<String>,
    pub workdir: Option<PathBuf>,
    pub env: BTreeMap<String, String>,
    pub timeout_seconds: u64,
}

impl CapturedCall {
    pub fn args_line(&self) -> String {
        self.args.join(" ")
    }
}

/// Scripted responses for one argument pattern. The last response repeats
/// once the queue is exhausted.
#[derive(Debug, Clone)]
struct Script {
    pattern: String,
    responses: Vec<MockResponse>,
    next: usize,
}

/// Mock tool runner for testing.
#[derive(Clone)]
pub struct MockRunner {
    available: Arc<RwLock<bool>>,
    scripts: Arc<RwLock<Vec<Script>>>,
    responses: Arc<RwLock<Vec<MockResponse>>>,
    response_index: Arc<RwLock<usize>>,
    captured_calls: Arc<RwLock<Vec<CapturedCall>>>,
    simulate_failure: Arc<RwLock<Option<String>>>,
}

impl Default for MockRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRunner {
    /// Create a new mock runner that succeeds at everything.
    pub fn new() -> Self {
        Self {
            available: Arc::new(RwLock::new(true)),
            scripts: Arc::new(RwLock::new(Vec::new())),
            responses: Arc::new(RwLock::new(Vec::new())),
            response_index: Arc::new(RwLock::new(0)),
            captured_calls: Arc::new(RwLock::new(Vec::new())),
            simulate_failure: Arc::new(RwLock::new(None)),
        }
    }

    /// Set whether tools report as available.
    pub fn set_available(self, available: bool) -> Self {
        *self.available.write() = available;
        self
    }

    /// Script responses for invocations whose argument line contains `pattern`.
    ///
    /// Scripts are checked in registration order; the first match wins.
    pub fn respond_to(self, pattern: impl Into<String>, responses: Vec<MockResponse>) -> Self {
        self.scripts.write().push(Script {
            pattern: pattern.into(),
            responses,
            next: 0,
        });
        self
    }

    /// Add a response to the default sequence used when no script matches.
    pub fn add_response(self, response: MockResponse) -> Self {
        self.responses.write().push(response);
        self
    }

    /// Make every run fail with a runner error.
    pub fn simulate_failure(self, message: impl Into<String>) -> Self {
        *self.simulate_failure.write() = Some(message.into());
        self
    }

    pub fn clear_calls(&self) {
        self.captured_calls.write().clear();
    }

    pub fn get_calls(&self) -> Vec<CapturedCall> {
        self.captured_calls.read().clone()
    }

    pub fn call_count(&self) -> usize {
        self.captured_calls.read().len()
    }

    /// Calls to `run` whose argument line contains `pattern`.
    pub fn calls_matching(&self, pattern: &str) -> Vec<CapturedCall> {
        self.captured_calls
            .read()
            .iter()
            .filter(|c| c.method == "run" && c.args_line().contains(pattern))
            .cloned()
            .collect()
    }

    /// Argument lines of every `run` call, in order.
    pub fn command_lines(&self) -> Vec<String> {
        self.captured_calls
            .read()
            .iter()
            .filter(|c| c.method == "run")
            .map(|c| c.args_line())
            .collect()
    }

    fn record_call(&self, call: CapturedCall) {
        self.captured_calls.write().push(call);
    }

    fn next_response(&self, args_line: &str) -> MockResponse {
        {
            let mut scripts = self.scripts.write();
            if let Some(script) = scripts
                .iter_mut()
                .find(|s| args_line.contains(s.pattern.as_str()))
            {
                if script.responses.is_empty() {
                    return MockResponse::success("");
                }
                let index = script.next.min(script.responses.len() - 1);
                script.next += 1;
                return script.responses[index].clone();
            }
        }

        let responses = self.responses.read();
        if responses.is_empty() {
            return MockResponse::success("");
        }
        let mut index = self.response_index.write();
        let response = responses[*index % responses.len()].clone();
        *index += 1;
        response
    }

    fn materialize(response: &MockResponse, workdir: Option<&Path>) -> RunnerResult<()> {
        let resolve = |path: &PathBuf| match workdir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.clone(),
        };

        for dir in &response.creates_dirs {
            std::fs::create_dir_all(resolve(dir))?;
        }
        for file in &response.creates_files {
            let target = resolve(file);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&target, b"mock artifact")?;
        }
        Ok(())
    }

    fn check_failure(&self) -> RunnerResult<()> {
        if let Some(msg) = self.simulate_failure.read().clone() {
            return Err(RunnerError::ExecutionFailed(msg));
        }
        Ok(())
    }
}

#[async_trait]
impl ToolRunner for MockRunner {
    async fn is_available(&self, program: &str) -> RunnerResult<bool> {
        self.record_call(CapturedCall {
            method: "is_available".to_string(),
            program: program.to_string(),
            args: Vec::new(),
            workdir: None,
            env: BTreeMap::new(),
            timeout_seconds: 0,
        });
        Ok(*self.available.read())
    }

    async fn run(
        &self,
        invocation: &Invocation,
        run_config: &RunConfig,
    ) -> RunnerResult<ExecutionResult> {
        self.record_call(CapturedCall {
            method: "run".to_string(),
            program: invocation.program.clone(),
            args: invocation.args.clone(),
            workdir: invocation.workdir.clone(),
            env: invocation.env.clone(),
            timeout_seconds: run_config.timeout_seconds,
        });

        self.check_failure()?;

        let response = self.next_response(&invocation.args_line());
        if response.timed_out {
            return Err(RunnerError::Timeout(run_config.timeout_seconds));
        }
        Self::materialize(&response, invocation.workdir.as_deref())?;

        let started_at = Utc::now();
        let finished_at = started_at + chrono::Duration::milliseconds(response.duration_ms as i64);

        Ok(ExecutionResult {
            command: invocation.display(),
            exit_code: response.exit_code,
            stdout: response.stdout,
            stderr: response.stderr,
            started_at,
            finished_at,
            duration_ms: response.duration_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn invocation(args: &[&str]) -> Invocation {
        Invocation::new("flutter").args(args.iter().copied())
    }

    #[tokio::test]
    async fn test_mock_runner_basic() {
        let runner = MockRunner::new().add_response(MockResponse::success("test output"));

        let result = runner
            .run(&invocation(&["--version"]), &RunConfig::default())
            .await
            .unwrap();

        assert_eq!(result.exit_code, 0);
        assert_eq!(result.stdout, "test output");
        assert_eq!(result.command, "flutter --version");
    }

    #[tokio::test]
    async fn test_scripts_repeat_last_response() {
        let runner = MockRunner::new().respond_to(
            "pub get",
            vec![MockResponse::failure(1, "network"), MockResponse::success("ok")],
        );

        let inv = invocation(&["pub", "get"]);
        let codes: Vec<i64> = collect_exit_codes(&runner, &inv, 3).await;
        assert_eq!(codes, vec![1, 0, 0]);

        let other = runner.run(&invocation(&["clean"]), &RunConfig::default()).await.unwrap();
        assert!(other.success());
        assert_eq!(runner.calls_matching("pub get").len(), 3);
    }

    async fn collect_exit_codes(runner: &MockRunner, inv: &Invocation, n: usize) -> Vec<i64> {
        let mut codes = Vec::new();
        for _ in 0..n {
            codes.push(runner.run(inv, &RunConfig::default()).await.unwrap().exit_code);
        }
        codes
    }

    #[tokio::test]
    async fn test_mock_runner_captures_calls() {
        let runner = MockRunner::new();
        let inv = invocation(&["build", "apk", "--release"])
            .workdir("/tmp/project")
            .env("CI", "true");

        let _ = runner.run(&inv, &RunConfig::default().timeout(600)).await;

        let calls = runner.get_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].args_line(), "build apk --release");
        assert_eq!(calls[0].workdir.as_deref(), Some(Path::new("/tmp/project")));
        assert_eq!(calls[0].timeout_seconds, 600);
        assert_eq!(calls[0].env["CI"], "true");
    }

    #[tokio::test]
    async fn test_response_creates_files() {
        let temp = tempdir().unwrap();
        let runner = MockRunner::new().respond_to(
            "build apk",
            vec![MockResponse::success("built")
                .creates_file("build/app/outputs/flutter-apk/app-release.apk")],
        );

        let inv = invocation(&["build", "apk"]).workdir(temp.path());
        runner.run(&inv, &RunConfig::default()).await.unwrap();

        assert!(temp
            .path()
            .join("build/app/outputs/flutter-apk/app-release.apk")
            .is_file());
    }

    #[tokio::test]
    async fn test_timeout_and_failure_simulation() {
        let runner = MockRunner::new().respond_to("pub get", vec![MockResponse::timeout()]);
        let err = runner
            .run(&invocation(&["pub", "get"]), &RunConfig::default().timeout(120))
            .await
            .unwrap_err();
        assert!(matches!(err, RunnerError::Timeout(120)));

        let failing = MockRunner::new().simulate_failure("simulated error");
        assert!(failing.run(&invocation(&["clean"]), &RunConfig::default()).await.is_err());
    }

    #[tokio::test]
    async fn test_mock_runner_availability() {
        assert!(MockRunner::new().is_available("flutter").await.unwrap());
        assert!(!MockRunner::new().set_available(false).is_available("flutter").await.unwrap());
    }
}
