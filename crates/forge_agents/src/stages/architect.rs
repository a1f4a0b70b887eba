use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use forge_core::{CoreResult, GenerationContext, Stage, StageId};
use forge_spec::ArchitectureValidator;

use super::{failed, requirements};
use crate::traits::Architect;

/// Produces and validates the architecture document.
///
/// Unlike classification there is no fallback: a document that does not
/// parse or lacks a required key fails the session.
pub struct ArchitectStage {
    architect: Arc<dyn Architect>,
}

impl ArchitectStage {
    pub fn new(architect: Arc<dyn Architect>) -> Self {
        Self { architect }
    }
}

#[async_trait]
impl Stage for ArchitectStage {
    fn id(&self) -> StageId {
        StageId::Architect
    }

    fn description(&self) -> &str {
        "Design and validate the application architecture"
    }

    async fn execute(&self, ctx: &mut GenerationContext) -> CoreResult<()> {
        let requirements = requirements(ctx, StageId::Architect)?;
        let raw = self
            .architect
            .design(&requirements)
            .await
            .map_err(failed(StageId::Architect))?;

        let validated = ArchitectureValidator::validate(&raw).map_err(failed(StageId::Architect))?;
        for warning in validated.warnings {
            warn!("Architecture review: {}", warning);
            ctx.add_warning(warning);
        }

        let architecture = validated.architecture;
        info!(
            "Architecture accepted: {} dependencies, {} features",
            architecture.dependencies.len(),
            architecture.main_features.len()
        );
        ctx.set_architecture(architecture)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::MockArchitect;
    use forge_core::UserInput;
    use forge_spec::Requirements;

    fn context() -> GenerationContext {
        let mut ctx = GenerationContext::new(UserInput::new("thermometer").unwrap());
        ctx.enter_stage(StageId::Classify).unwrap();
        ctx.set_requirements(Requirements::fallback()).unwrap();
        ctx.complete_stage(StageId::Classify).unwrap();
        ctx.enter_stage(StageId::Architect).unwrap();
        ctx
    }

    fn stage(document: &'static str) -> ArchitectStage {
        let mut architect = MockArchitect::new();
        architect
            .expect_design()
            .times(1)
            .returning(move |_| Ok(document.to_string()));
        ArchitectStage::new(Arc::new(architect))
    }

    #[tokio::test]
    async fn test_valid_document_is_stored() {
        let stage = stage(
            r#"```json
{"project_structure": {"lib": {"main.dart": "entry"}},
 "dependencies": {"flutter_blue_plus": "^1.36.8"},
 "main_features": ["scan"],
 "file_templates": {"lib/main.dart": "entry"}}
```"#,
        );
        let mut ctx = context();
        stage.execute(&mut ctx).await.unwrap();

        let architecture = ctx.architecture().unwrap();
        assert!(architecture.dependencies.contains_key("flutter_blue_plus"));
    }

    #[tokio::test]
    async fn test_missing_key_fails_stage() {
        let stage = stage(r#"{"project_structure": {}, "dependencies": {}, "main_features": []}"#);
        let mut ctx = context();
        let err = stage.execute(&mut ctx).await.unwrap_err();

        let message = err.to_string();
        assert!(message.starts_with("architect stage failed: "), "{}", message);
        assert!(message.contains("file_templates"), "{}", message);
        assert!(ctx.architecture().is_none());
    }

    #[tokio::test]
    async fn test_unparseable_document_fails_stage() {
        let stage = stage("I could not come up with an architecture.");
        let mut ctx = context();
        assert!(stage.execute(&mut ctx).await.is_err());
        assert!(ctx.architecture().is_none());
    }
}
