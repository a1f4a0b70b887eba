use async_trait::async_trait;
use tracing::{info, warn};

use forge_core::{CoreResult, GenerationContext, Stage, StageId};
use forge_patch::{PatchCatalog, SourcePatcher};

use super::{failed, project_path, requirements};

/// Applies the standard fixups to the project on disk.
///
/// The catalog depends on the requirement record (which dependencies the
/// manifest needs), so it is built per session. Rewritten files that are
/// also generated sources are mirrored into the context.
#[derive(Debug, Default)]
pub struct PatchStage;

impl PatchStage {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Stage for PatchStage {
    fn id(&self) -> StageId {
        StageId::Patch
    }

    fn description(&self) -> &str {
        "Apply compatibility fixups to the generated project"
    }

    async fn execute(&self, ctx: &mut GenerationContext) -> CoreResult<()> {
        let requirements = requirements(ctx, StageId::Patch)?;
        let project = project_path(ctx, StageId::Patch)?.to_path_buf();

        let catalog = PatchCatalog::standard(&requirements).map_err(failed(StageId::Patch))?;
        let report = SourcePatcher::new(catalog)
            .patch_project(&project)
            .map_err(failed(StageId::Patch))?;

        for warning in report.warnings() {
            warn!("{}", warning);
            ctx.add_warning(warning.to_string());
        }

        for (path, content) in &report.changed {
            if ctx.sources().contains_key(path) {
                ctx.update_source(path, content.clone())?;
            }
        }

        info!(
            "Patched project: {} rule(s) applied, {} already satisfied, {} changed file(s)",
            report.applied().len(),
            report.unchanged().len(),
            report.changed.len()
        );
        Ok(())
    }
}
