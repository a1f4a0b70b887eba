use async_trait::async_trait;
use tracing::info;

use forge_build::{locate_artifact, ArtifactPublisher, BuildError, ARTIFACT_CANDIDATES};
use forge_core::{CoreError, CoreResult, GenerationContext, Stage, StageId};

use super::{failed, project_path, requirements};

/// Copies the verified APK to the output directory under a name unique to
/// the session.
pub struct PublishStage {
    publisher: ArtifactPublisher,
}

impl PublishStage {
    pub fn new(publisher: ArtifactPublisher) -> Self {
        Self { publisher }
    }
}

#[async_trait]
impl Stage for PublishStage {
    fn id(&self) -> StageId {
        StageId::Publish
    }

    fn description(&self) -> &str {
        "Publish the APK to the output directory"
    }

    async fn execute(&self, ctx: &mut GenerationContext) -> CoreResult<()> {
        let requirements = requirements(ctx, StageId::Publish)?;
        let project = project_path(ctx, StageId::Publish)?;

        let artifact = locate_artifact(project).ok_or_else(|| {
            CoreError::stage_failed(
                StageId::Publish,
                BuildError::ArtifactNotFound {
                    searched: ARTIFACT_CANDIDATES.iter().map(|c| project.join(c)).collect(),
                },
            )
        })?;

        let published = self
            .publisher
            .publish(&artifact, &requirements.app_name, ctx.session_id())
            .map_err(failed(StageId::Publish))?;

        info!("Published {:?}", published);
        ctx.set_artifact(published)
    }
}
