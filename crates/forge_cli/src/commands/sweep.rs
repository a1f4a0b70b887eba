//! Sweep command - reclaim orphaned workspaces.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use tracing::warn;

use forge_agents::workspace_manager;

use super::load_config;

#[derive(Args, Debug, Default)]
pub struct SweepArgs {
    /// Also remove recently active workspaces; only safe when no other
    /// `forge` process is running
    #[arg(long)]
    pub all: bool,
}

pub async fn execute(config_path: Option<&Path>, args: SweepArgs) -> Result<()> {
    let config = load_config(config_path)?;
    let mut manager = workspace_manager(&config);
    if args.all {
        manager = manager.with_stale_after(Duration::ZERO);
    }
    let report = manager.sweep();

    for (path, reason) in &report.failed {
        warn!("Could not remove {:?}: {}", path, reason);
    }
    println!(
        "Removed {} workspace(s) under {}",
        report.removed_count(),
        manager.root().display()
    );
    if report.skipped_count() > 0 {
        println!("Kept {} recently active workspace(s)", report.skipped_count());
    }
    if report.failed_count() > 0 {
        println!("{} workspace(s) could not be removed", report.failed_count());
    }
    Ok(())
}
