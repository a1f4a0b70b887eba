//! Status command - report on a stored session.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use forge_core::{ProgressSnapshot, SessionStore};

use super::load_config;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Session id printed by `forge generate`
    pub session_id: String,

    /// Print the full stored context instead of the snapshot
    #[arg(long)]
    pub full: bool,
}

pub async fn execute(config_path: Option<&Path>, args: StatusArgs) -> Result<()> {
    let config = load_config(config_path)?;
    let store = SessionStore::new(&config.state_dir);
    let ctx = store
        .load(&args.session_id)
        .with_context(|| format!("loading session {}", args.session_id))?;

    let output = if args.full {
        serde_json::to_string_pretty(&ctx)?
    } else {
        ProgressSnapshot::from(&ctx).to_json()?
    };
    println!("{}", output);
    Ok(())
}
