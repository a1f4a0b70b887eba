//! # forge_runner
//!
//! External tool execution for apkforge.
//!
//! Every toolchain call in the build goes through the [`ToolRunner`] trait so
//! that tests can substitute the scriptable [`MockRunner`] for real processes.
//!
//! # Features
//!
//! - **CLI Runner**: `tokio::process` children scoped to a working directory,
//!   killed when their timeout elapses
//! - **Mock Runner**: scripted responses, captured calls, simulated build outputs
//! - **Retry Policy**: bounded attempts with capped exponential backoff
//!
//! # Example
//!
//! ```rust,no_run
//! use forge_runner::{CliRunner, Invocation, RetryPolicy, ToolRunner};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runner = CliRunner::default();
//!     let policy = RetryPolicy::dependency_resolution();
//!
//!     let inv = Invocation::new("flutter").args(["pub", "get"]).workdir("/tmp/my_app");
//!     let result = runner.run(&inv, &policy.run_config()).await?;
//!     println!("Exit code: {}", result.exit_code);
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod mock;
pub mod retry;
pub mod runner;

pub use cli::{CliRunner, CliRunnerOptions};
pub use config::{Invocation, RunConfig};
pub use error::{RunnerError, RunnerResult};
pub use mock::{CapturedCall, MockResponse, MockRunner};
pub use retry::{Attempt, AttemptRecord, RetryOutcome, RetryPolicy, MAX_BACKOFF};
pub use runner::{ExecutionResult, ToolRunner};
