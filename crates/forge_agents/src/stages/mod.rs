//! The seven pipeline stages.
//!
//! Each stage reads what earlier stages recorded in the context, does its
//! work through the collaborators or `forge_build`/`forge_patch`, and writes
//! back only the fields it owns.

mod architect;
mod build;
mod classify;
mod generate;
mod patch;
mod publish;
mod scaffold;

pub use architect::ArchitectStage;
pub use build::BuildStage;
pub use classify::ClassifyStage;
pub use generate::GenerateStage;
pub use patch::PatchStage;
pub use publish::PublishStage;
pub use scaffold::ScaffoldStage;

use std::fmt::Display;
use std::path::Path;

use forge_core::{CoreError, CoreResult, GenerationContext, StageId};
use forge_spec::{Architecture, Requirements};

/// Map any error into a failure of `stage`.
fn failed<E: Display>(stage: StageId) -> impl Fn(E) -> CoreError {
    move |e| CoreError::stage_failed(stage, e)
}

fn requirements(ctx: &GenerationContext, stage: StageId) -> CoreResult<Requirements> {
    ctx.requirements()
        .cloned()
        .ok_or_else(|| CoreError::stage_failed(stage, "requirements missing"))
}

fn architecture(ctx: &GenerationContext, stage: StageId) -> CoreResult<Architecture> {
    ctx.architecture()
        .cloned()
        .ok_or_else(|| CoreError::stage_failed(stage, "architecture missing"))
}

fn project_path(ctx: &GenerationContext, stage: StageId) -> CoreResult<&Path> {
    ctx.project_path()
        .ok_or_else(|| CoreError::stage_failed(stage, "project path missing"))
}
