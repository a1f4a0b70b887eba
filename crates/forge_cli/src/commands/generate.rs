//! Generate command - run the pipeline for a prompt.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tracing::{info, warn};

use forge_agents::{create_pipeline, workspace_manager, Collaborators};
use forge_core::{BuildStatus, ProgressSnapshot, SessionRegistry, UserInput};
use forge_runner::{CliRunner, CliRunnerOptions};

use super::load_config;
use crate::error::CliError;

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Description of the app to build
    pub prompt: String,

    /// Hardware commands, one per line: button "Label": sends "PAYLOAD"
    #[arg(long, conflicts_with = "hardware_file")]
    pub hardware_commands: Option<String>,

    /// Read hardware commands from a file
    #[arg(long)]
    pub hardware_file: Option<PathBuf>,

    /// Skip the startup sweep of orphaned workspaces
    #[arg(long)]
    pub no_sweep: bool,

    /// Log toolchain commands instead of running them
    #[arg(long)]
    pub dry_run: bool,
}

/// What `generate` prints on stdout.
#[derive(Debug, Serialize)]
struct GenerateReport {
    session_id: String,
    #[serde(flatten)]
    snapshot: ProgressSnapshot,
    artifact_path: Option<PathBuf>,
    warnings: Vec<String>,
}

pub async fn execute(config_path: Option<&Path>, args: GenerateArgs) -> Result<()> {
    let config = load_config(config_path)?;

    let mut input = UserInput::new(args.prompt.as_str())?;
    if let Some(commands) = hardware_commands(&args)? {
        input = input.with_hardware_commands(commands);
    }

    if !args.no_sweep {
        let report = workspace_manager(&config).sweep();
        if report.removed_count() > 0 || report.failed_count() > 0 {
            info!(
                "Startup sweep removed {} workspace(s), kept {} active, {} could not be removed",
                report.removed_count(),
                report.skipped_count(),
                report.failed_count()
            );
        }
    }

    let mut options = CliRunnerOptions::new();
    if args.dry_run {
        warn!("Dry-run mode: no toolchain command will be executed");
        options = options.dry_run();
    }
    let runner = Arc::new(CliRunner::new(options));
    let pipeline = create_pipeline(&config, runner, Collaborators::builtin());

    let sessions = SessionRegistry::new();
    let handle = sessions.create(input);
    let session_id = handle.read().session_id().to_string();
    info!("Session {} started", session_id);

    let snapshot = pipeline.run_session(&handle).await;
    let (artifact_path, warnings, errors) = {
        let ctx = handle.read();
        (
            ctx.artifact_path().map(Path::to_path_buf),
            ctx.warnings().to_vec(),
            ctx.error_log().to_vec(),
        )
    };
    let failed = snapshot.status == BuildStatus::Failed.as_str();

    let report = GenerateReport {
        session_id: session_id.clone(),
        snapshot,
        artifact_path,
        warnings,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    if failed {
        return Err(CliError::PipelineFailed { session_id, errors }.into());
    }
    Ok(())
}

fn hardware_commands(args: &GenerateArgs) -> Result<Option<String>> {
    if let Some(path) = &args.hardware_file {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading hardware commands from {}", path.display()))?;
        return Ok(Some(text));
    }
    Ok(args.hardware_commands.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> GenerateArgs {
        GenerateArgs {
            prompt: "lamp".to_string(),
            hardware_commands: None,
            hardware_file: None,
            no_sweep: true,
            dry_run: false,
        }
    }

    #[test]
    fn test_hardware_commands_from_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("commands.txt");
        fs::write(&path, "button \"On\": sends \"1\"\n").unwrap();

        let args = GenerateArgs {
            hardware_file: Some(path),
            ..args()
        };
        assert_eq!(
            hardware_commands(&args).unwrap().as_deref(),
            Some("button \"On\": sends \"1\"\n")
        );
    }

    #[test]
    fn test_missing_hardware_file() {
        let args = GenerateArgs {
            hardware_file: Some(PathBuf::from("/nonexistent/commands.txt")),
            ..args()
        };
        assert!(hardware_commands(&args).is_err());
    }

    #[test]
    fn test_inline_commands() {
        let args = GenerateArgs {
            hardware_commands: Some("button \"Off\": sends \"0\"".to_string()),
            ..args()
        };
        assert!(hardware_commands(&args).unwrap().unwrap().contains("Off"));
    }
}
