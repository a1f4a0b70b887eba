//! CLI command definitions.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use forge_core::ForgeConfig;

pub mod doctor;
pub mod generate;
pub mod status;
pub mod sweep;

/// apkforge - prompt to Android APK
#[derive(Parser, Debug)]
#[command(name = "forge")]
#[command(version, about = "apkforge - turn a prompt into a Bluetooth controller APK")]
#[command(long_about = r#"
apkforge turns a natural-language description of a Bluetooth device into a
compiled Android application.

COMMANDS:
  generate  → Run the full pipeline for a prompt
  status    → Show the stored snapshot of a session
  sweep     → Remove workspaces left behind by earlier runs
  doctor    → Check that the Flutter toolchain can be invoked

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - Pipeline failed
  4 - Configuration error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to ./forge.toml when present)
    #[arg(long, global = true, env = "FORGE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate an APK from a prompt
    Generate(generate::GenerateArgs),

    /// Show the stored progress snapshot of a session
    Status(status::StatusArgs),

    /// Remove orphaned session workspaces
    Sweep(sweep::SweepArgs),

    /// Check the Flutter toolchain
    Doctor(doctor::DoctorArgs),
}

/// Load configuration for a command.
pub fn load_config(path: Option<&Path>) -> Result<ForgeConfig> {
    ForgeConfig::load(path).context("loading configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_generate() {
        let cli = Cli::try_parse_from([
            "forge",
            "--verbose",
            "generate",
            "a smart lamp",
            "--hardware-commands",
            "button \"On\": sends \"1\"",
            "--no-sweep",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::Generate(args) => {
                assert_eq!(args.prompt, "a smart lamp");
                assert!(args.no_sweep);
                assert_eq!(args.hardware_commands.as_deref(), Some("button \"On\": sends \"1\""));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_hardware_sources_conflict() {
        let result = Cli::try_parse_from([
            "forge",
            "generate",
            "lamp",
            "--hardware-commands",
            "x",
            "--hardware-file",
            "cmds.txt",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_status_requires_session() {
        assert!(Cli::try_parse_from(["forge", "status"]).is_err());
        let cli = Cli::try_parse_from(["forge", "--json", "status", "1234"]).unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Status(ref args) if args.session_id == "1234"));
    }
}
