//! Integration tests for the tool execution layer.
//!
//! These tests drive the retry policy through the mock runner to avoid
//! requiring a real Flutter installation.

use std::time::Duration;

use forge_runner::{
    Invocation, MockResponse, MockRunner, RetryPolicy, RunnerError, ToolRunner,
};

fn policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::new(max_attempts, Duration::from_secs(120))
        .with_backoff(Duration::ZERO)
        .clean_before_retry(true)
}

/// A flaky command is retried, cleaning between attempts, until it succeeds.
#[tokio::test]
async fn test_retry_with_cleanup_between_attempts() {
    let runner = MockRunner::new().respond_to(
        "pub get",
        vec![
            MockResponse::failure(69, "Got socket error"),
            MockResponse::failure(69, "Got socket error"),
            MockResponse::success("Got dependencies!"),
        ],
    );

    let get = Invocation::new("flutter").args(["pub", "get"]);
    let clean = Invocation::new("flutter").args(["pub", "cache", "clean", "--force"]);
    let policy = policy(3);
    let run_config = policy.run_config();

    let outcome = policy
        .execute("dependency resolution", |attempt| {
            let runner = runner.clone();
            let get = get.clone();
            let clean = clean.clone();
            let run_config = run_config.clone();
            async move {
                if attempt.clean_first {
                    runner.run(&clean, &run_config).await?;
                }
                let result = runner.run(&get, &run_config).await?;
                if result.success() {
                    Ok(result)
                } else {
                    Err(RunnerError::ExecutionFailed(result.stderr))
                }
            }
        })
        .await;

    assert!(outcome.is_ok());
    assert_eq!(outcome.attempt_count(), 3);
    assert_eq!(
        runner.command_lines(),
        vec![
            "pub get",
            "pub cache clean --force",
            "pub get",
            "pub cache clean --force",
            "pub get",
        ]
    );
    assert!(runner.get_calls().iter().all(|c| c.timeout_seconds == 120));
}

/// Timeouts count as failed attempts.
#[tokio::test]
async fn test_timeouts_exhaust_attempts() {
    let runner = MockRunner::new().respond_to("build apk", vec![MockResponse::timeout()]);
    let build = Invocation::new("flutter").args(["build", "apk", "--release"]);
    let policy = policy(2);
    let run_config = policy.run_config();

    let outcome = policy
        .execute("compile", |_| {
            let runner = runner.clone();
            let build = build.clone();
            let run_config = run_config.clone();
            async move { runner.run(&build, &run_config).await }
        })
        .await;

    assert!(matches!(outcome.result, Err(RunnerError::Timeout(120))));
    assert_eq!(outcome.attempt_count(), 2);
    assert_eq!(runner.calls_matching("build apk").len(), 2);
}
