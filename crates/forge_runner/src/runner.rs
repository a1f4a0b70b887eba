//! Tool runner trait and types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{Invocation, RunConfig};
use crate::error::RunnerResult;

/// Result of running an external command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Rendered command line
    pub command: String,
    /// Exit code (-1 when killed by a signal)
    pub exit_code: i64,
    /// Captured stdout
    pub stdout: String,
    /// Captured stderr
    pub stderr: String,
    /// Execution start time
    pub started_at: DateTime<Utc>,
    /// Execution end time
    pub finished_at: DateTime<Utc>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl ExecutionResult {
    /// Check if execution was successful (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Get combined output (stdout + stderr).
    pub fn combined_output(&self) -> String {
        if self.stdout.is_empty() {
            self.stderr.clone()
        } else if self.stderr.is_empty() {
            self.stdout.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }

    /// Last `lines` lines of the combined output.
    pub fn tail(&self, lines: usize) -> String {
        let combined = self.combined_output();
        let all: Vec<&str> = combined.lines().collect();
        let start = all.len().saturating_sub(lines);
        all[start..].join("\n")
    }
}

/// Runs external commands.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Check whether `program` can be invoked.
    async fn is_available(&self, program: &str) -> RunnerResult<bool>;

    /// Run a command to completion, honoring the timeout in `run_config`.
    ///
    /// A non-zero exit code is not an error; a timeout is.
    async fn run(
        &self,
        invocation: &Invocation,
        run_config: &RunConfig,
    ) -> RunnerResult<ExecutionResult>;
}
