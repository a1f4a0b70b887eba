use async_trait::async_trait;
use tracing::info;

use forge_build::{BuildExecutor, BuildPhase};
use forge_core::{BuildReport, CoreError, CoreResult, GenerationContext, Stage, StageId};

use super::project_path;

/// Resolves dependencies and compiles the release APK.
///
/// The attempt report is recorded whether or not the build succeeds.
pub struct BuildStage {
    executor: BuildExecutor,
}

impl BuildStage {
    pub fn new(executor: BuildExecutor) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl Stage for BuildStage {
    fn id(&self) -> StageId {
        StageId::Build
    }

    fn description(&self) -> &str {
        "Resolve dependencies and compile the release APK"
    }

    async fn execute(&self, ctx: &mut GenerationContext) -> CoreResult<()> {
        let project = project_path(ctx, StageId::Build)?.to_path_buf();
        let outcome = self.executor.build(&project).await;

        ctx.set_build_report(BuildReport {
            dependency_attempts: outcome.attempts(BuildPhase::DependencyResolution),
            compile_attempts: outcome.attempts(BuildPhase::Compile),
            attempt_log: outcome.log_lines(),
        })?;

        let artifact = outcome
            .into_result()
            .map_err(|e| CoreError::stage_failed(StageId::Build, e))?;
        info!("Verified artifact at {:?}", artifact);
        Ok(())
    }
}
