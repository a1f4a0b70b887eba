//! Runtime configuration.
//!
//! Loaded from `forge.toml` (or an explicit path) with every field
//! defaulted, then overridden from `FORGE_*` environment variables.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CoreError, CoreResult};

/// Default configuration file name looked up in the working directory.
pub const CONFIG_FILE: &str = "forge.toml";

/// Retry settings for one build phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub timeout_secs: u64,
    pub backoff_ms: u64,
}

impl RetrySettings {
    pub fn dependency_default() -> Self {
        Self {
            max_attempts: 3,
            timeout_secs: 120,
            backoff_ms: 2_000,
        }
    }

    pub fn compile_default() -> Self {
        Self {
            max_attempts: 2,
            timeout_secs: 600,
            backoff_ms: 5_000,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    fn validate(&self, section: &str) -> CoreResult<()> {
        if self.max_attempts == 0 {
            return Err(CoreError::Config(format!(
                "{}.max_attempts must be at least 1",
                section
            )));
        }
        if self.timeout_secs == 0 {
            return Err(CoreError::Config(format!(
                "{}.timeout_secs must be at least 1",
                section
            )));
        }
        Ok(())
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self::dependency_default()
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForgeConfig {
    /// Flutter executable name or path
    pub flutter_bin: String,
    /// Permanent directory for published artifacts
    pub output_dir: PathBuf,
    /// Parent directory of per-session workspaces
    pub temp_root: PathBuf,
    /// Directory for persisted session records
    pub state_dir: PathBuf,
    /// Name prefix of session workspaces, matched by the startup sweep
    pub workspace_prefix: String,
    pub platform: String,
    pub android_language: String,
    pub scaffold_timeout_secs: u64,
    /// Workspaces idle for longer than this are reclaimed by the sweep
    pub sweep_stale_after_secs: u64,
    pub dependency: RetrySettings,
    pub compile: RetrySettings,
}

impl Default for ForgeConfig {
    fn default() -> Self {
        Self {
            flutter_bin: "flutter".to_string(),
            output_dir: PathBuf::from("generated_apks"),
            temp_root: std::env::temp_dir(),
            state_dir: PathBuf::from(".forge"),
            workspace_prefix: "forge_app_".to_string(),
            platform: "android".to_string(),
            android_language: "kotlin".to_string(),
            scaffold_timeout_secs: 120,
            sweep_stale_after_secs: 3600,
            dependency: RetrySettings::dependency_default(),
            compile: RetrySettings::compile_default(),
        }
    }
}

impl ForgeConfig {
    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one, `forge.toml` in the
    /// working directory is used when present. Environment overrides are
    /// applied last and the result is validated.
    pub fn load(path: Option<&Path>) -> CoreResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(CONFIG_FILE).exists() => Self::from_file(Path::new(CONFIG_FILE))?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file.
    pub fn from_file(path: &Path) -> CoreResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CoreError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        debug!("Loaded configuration from {:?}", path);
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> CoreResult<Self> {
        toml::from_str(content).map_err(|e| CoreError::Config(e.to_string()))
    }

    /// Apply `FORGE_*` overrides using `lookup` to read variables.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(bin) = lookup("FORGE_FLUTTER_BIN") {
            self.flutter_bin = bin;
        }
        if let Some(dir) = lookup("FORGE_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("FORGE_TEMP_ROOT") {
            self.temp_root = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("FORGE_STATE_DIR") {
            self.state_dir = PathBuf::from(dir);
        }
    }

    /// Reject settings the build cannot run with.
    pub fn validate(&self) -> CoreResult<()> {
        if self.flutter_bin.trim().is_empty() {
            return Err(CoreError::Config("flutter_bin must not be empty".to_string()));
        }
        if self.workspace_prefix.trim().is_empty() {
            return Err(CoreError::Config("workspace_prefix must not be empty".to_string()));
        }
        if self.scaffold_timeout_secs == 0 {
            return Err(CoreError::Config(
                "scaffold_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.sweep_stale_after_secs == 0 {
            return Err(CoreError::Config(
                "sweep_stale_after_secs must be at least 1".to_string(),
            ));
        }
        self.dependency.validate("dependency")?;
        self.compile.validate("compile")?;
        Ok(())
    }

    pub fn scaffold_timeout(&self) -> Duration {
        Duration::from_secs(self.scaffold_timeout_secs)
    }

    pub fn sweep_stale_after(&self) -> Duration {
        Duration::from_secs(self.sweep_stale_after_secs)
    }
}
