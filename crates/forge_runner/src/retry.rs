//! Bounded retries with exponential backoff.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::RunConfig;

/// Upper bound for the delay between attempts.
pub const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// How often and how patiently an operation is retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Per-attempt timeout for the external command
    pub timeout: Duration,
    /// Base delay before the second attempt; doubles for every later one
    pub backoff: Duration,
    /// Whether cached state should be cleared before each retry
    pub clean_before_retry: bool,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, timeout: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            timeout,
            backoff: Duration::from_secs(2),
            clean_before_retry: false,
        }
    }

    /// Dependency resolution: three attempts of two minutes, cache cleared
    /// before each retry.
    pub fn dependency_resolution() -> Self {
        Self {
            clean_before_retry: true,
            ..Self::new(3, Duration::from_secs(120))
        }
    }

    /// Compilation: two attempts of ten minutes, full clean before the retry.
    pub fn compile() -> Self {
        Self {
            backoff: Duration::from_secs(5),
            clean_before_retry: true,
            ..Self::new(2, Duration::from_secs(600))
        }
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn clean_before_retry(mut self, enabled: bool) -> Self {
        self.clean_before_retry = enabled;
        self
    }

    /// Run configuration carrying this policy's timeout.
    pub fn run_config(&self) -> RunConfig {
        RunConfig::with_duration(self.timeout)
    }

    /// Delay before attempt `attempt` (1-based). The first attempt never waits.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 || self.backoff.is_zero() {
            return Duration::ZERO;
        }
        let factor = 2u32.saturating_pow(attempt - 2);
        self.backoff.saturating_mul(factor).min(MAX_BACKOFF)
    }

    /// Run `operation` until it succeeds or attempts run out.
    ///
    /// The closure receives the current [`Attempt`] so it can perform the
    /// clean-up that precedes a retry.
    pub async fn execute<T, E, F, Fut>(&self, name: &str, mut operation: F) -> RetryOutcome<T, E>
    where
        E: Display,
        F: FnMut(Attempt) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut records = Vec::new();
        let mut number = 1;

        loop {
            let delay = self.delay_before(number);
            if !delay.is_zero() {
                debug!("{}: waiting {:?} before attempt {}", name, delay, number);
                tokio::time::sleep(delay).await;
            }

            let attempt = Attempt {
                number,
                max_attempts: self.max_attempts,
                clean_first: self.clean_before_retry && number > 1,
            };
            info!("{}: attempt {}/{}", name, number, self.max_attempts);

            match operation(attempt).await {
                Ok(value) => {
                    records.push(AttemptRecord::succeeded(name, number));
                    if number > 1 {
                        info!("{}: succeeded after {} attempts", name, number);
                    }
                    return RetryOutcome {
                        result: Ok(value),
                        attempts: records,
                    };
                }
                Err(err) => {
                    records.push(AttemptRecord::failed(name, number, err.to_string()));
                    if attempt.is_final() {
                        warn!("{}: giving up after {} attempts: {}", name, number, err);
                        return RetryOutcome {
                            result: Err(err),
                            attempts: records,
                        };
                    }
                    warn!("{}: attempt {} failed, retrying: {}", name, number, err);
                    number += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(300))
    }
}

/// The attempt currently being made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt {
    /// 1-based attempt number
    pub number: u32,
    pub max_attempts: u32,
    /// Whether the operation should clear cached state before running
    pub clean_first: bool,
}

impl Attempt {
    pub fn is_retry(&self) -> bool {
        self.number > 1
    }

    pub fn is_final(&self) -> bool {
        self.number >= self.max_attempts
    }
}

/// Log entry for one attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub operation: String,
    pub attempt: u32,
    pub succeeded: bool,
    pub message: Option<String>,
}

impl AttemptRecord {
    fn succeeded(operation: &str, attempt: u32) -> Self {
        Self {
            operation: operation.to_string(),
            attempt,
            succeeded: true,
            message: None,
        }
    }

    fn failed(operation: &str, attempt: u32, message: String) -> Self {
        Self {
            operation: operation.to_string(),
            attempt,
            succeeded: false,
            message: Some(message),
        }
    }
}

impl std::fmt::Display for AttemptRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.message {
            None => write!(f, "{} attempt {}: ok", self.operation, self.attempt),
            Some(msg) => write!(f, "{} attempt {}: {}", self.operation, self.attempt, msg),
        }
    }
}

/// Final result plus the log of every attempt.
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    pub result: Result<T, E>,
    pub attempts: Vec<AttemptRecord>,
}

impl<T, E> RetryOutcome<T, E> {
    pub fn attempt_count(&self) -> u32 {
        self.attempts.len() as u32
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}
