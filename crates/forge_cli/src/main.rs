//! apkforge CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments
//! - 3: Pipeline failed
//! - 4: Configuration error

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod error;

use commands::{Cli, Commands};
use error::CliError;
use forge_core::CoreError;

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const PIPELINE_FAILED: u8 = 3;
    pub const CONFIG_ERROR: u8 = 4;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() {
                ExitCodes::INVALID_ARGS
            } else {
                ExitCodes::SUCCESS
            };
            // Help and version requests also land here.
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    init_logging(cli.verbose, cli.json);

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Generate(args) => commands::generate::execute(config, args).await,
        Commands::Status(args) => commands::status::execute(config, args).await,
        Commands::Sweep(args) => commands::sweep::execute(config, args).await,
        Commands::Doctor(args) => commands::doctor::execute(config, args).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(categorize_error(&e))
        }
    }
}

/// Install the global subscriber. Logs go to stderr so stdout stays
/// machine-readable.
fn init_logging(verbose: bool, json: bool) {
    let default_directives = if verbose { "forge=debug,info" } else { "forge=info,warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
    };

    if result.is_err() {
        // Logging already initialized, continue
    }
}

/// Map an error to its exit code.
fn categorize_error(e: &anyhow::Error) -> u8 {
    if let Some(cli_error) = e.downcast_ref::<CliError>() {
        return match cli_error {
            CliError::PipelineFailed { .. } => ExitCodes::PIPELINE_FAILED,
            CliError::InvalidArgs(_) => ExitCodes::INVALID_ARGS,
            CliError::ToolchainUnavailable(_) => ExitCodes::GENERAL_ERROR,
        };
    }
    match e.downcast_ref::<CoreError>() {
        Some(CoreError::Config(_)) => ExitCodes::CONFIG_ERROR,
        Some(CoreError::InvalidInput(_)) => ExitCodes::INVALID_ARGS,
        _ => ExitCodes::GENERAL_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_categorize_error() {
        let failed = anyhow::Error::new(CliError::PipelineFailed {
            session_id: "abc".to_string(),
            errors: vec!["build stage failed: boom".to_string()],
        });
        assert_eq!(categorize_error(&failed), ExitCodes::PIPELINE_FAILED);

        let config: anyhow::Result<()> = Err(CoreError::Config("bad".to_string()).into());
        let config = config.context("loading configuration").unwrap_err();
        assert_eq!(categorize_error(&config), ExitCodes::CONFIG_ERROR);

        let prompt = anyhow::Error::new(CoreError::InvalidInput("empty".to_string()));
        assert_eq!(categorize_error(&prompt), ExitCodes::INVALID_ARGS);

        assert_eq!(categorize_error(&anyhow::anyhow!("disk full")), ExitCodes::GENERAL_ERROR);
    }
}
