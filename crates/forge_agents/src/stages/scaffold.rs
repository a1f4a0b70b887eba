use async_trait::async_trait;
use tracing::info;

use forge_build::{sanitize_app_name, ScaffoldBuilder, WorkspaceManager};
use forge_core::{CoreResult, GenerationContext, Stage, StageId};

use super::{architecture, failed, requirements};

/// Creates the session workspace, runs `flutter create` and lays out the
/// architecture's project structure.
pub struct ScaffoldStage {
    workspaces: WorkspaceManager,
    builder: ScaffoldBuilder,
}

impl ScaffoldStage {
    pub fn new(workspaces: WorkspaceManager, builder: ScaffoldBuilder) -> Self {
        Self { workspaces, builder }
    }
}

#[async_trait]
impl Stage for ScaffoldStage {
    fn id(&self) -> StageId {
        StageId::Scaffold
    }

    fn description(&self) -> &str {
        "Create the Flutter project and its file tree"
    }

    async fn execute(&self, ctx: &mut GenerationContext) -> CoreResult<()> {
        let requirements = requirements(ctx, StageId::Scaffold)?;
        let architecture = architecture(ctx, StageId::Scaffold)?;

        let workspace = self
            .workspaces
            .create(ctx.session_id())
            .map_err(failed(StageId::Scaffold))?;
        // Recorded before scaffolding so a failed session still names its workspace.
        let project = workspace.join(sanitize_app_name(&requirements.app_name));
        ctx.set_workspace(workspace.clone(), project)?;

        let outcome = self
            .builder
            .scaffold(&workspace, &requirements.app_name, &architecture.project_structure)
            .await
            .map_err(failed(StageId::Scaffold))?;

        info!(
            "Scaffolded {} ({} files, {} written from structure, {} kept)",
            outcome.project_name,
            outcome.file_count,
            outcome.materialized.written.len(),
            outcome.materialized.kept.len()
        );
        Ok(())
    }
}
