//! Doctor command - check the toolchain.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;

use forge_agents::toolchain;
use forge_runner::CliRunner;

use super::load_config;
use crate::error::CliError;

#[derive(Args, Debug)]
pub struct DoctorArgs {}

pub async fn execute(config_path: Option<&Path>, _args: DoctorArgs) -> Result<()> {
    let config = load_config(config_path)?;
    let flutter = toolchain(&config, Arc::new(CliRunner::default()));

    println!("Configuration");
    println!("  flutter_bin: {}", config.flutter_bin);
    println!("  output_dir:  {}", config.output_dir.display());
    println!("  temp_root:   {}", config.temp_root.display());
    println!("  state_dir:   {}", config.state_dir.display());

    if !flutter.is_available().await? {
        return Err(CliError::ToolchainUnavailable(format!(
            "'{}' could not be invoked",
            flutter.bin()
        ))
        .into());
    }

    let version = flutter.version().await?;
    let first_line = version.stdout.lines().next().unwrap_or_default();
    println!("Toolchain");
    println!("  {}", first_line);
    Ok(())
}
