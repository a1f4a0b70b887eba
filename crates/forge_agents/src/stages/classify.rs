use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use forge_core::{CoreResult, GenerationContext, Stage, StageId};
use forge_spec::{Requirements, RequirementsReader};

use crate::traits::Classifier;

/// Turns the prompt into a requirement record. Never fails: an erroring
/// classifier or unusable output falls back to the built-in record.
pub struct ClassifyStage {
    classifier: Arc<dyn Classifier>,
}

impl ClassifyStage {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self { classifier }
    }
}

#[async_trait]
impl Stage for ClassifyStage {
    fn id(&self) -> StageId {
        StageId::Classify
    }

    fn description(&self) -> &str {
        "Extract structured requirements from the prompt"
    }

    async fn execute(&self, ctx: &mut GenerationContext) -> CoreResult<()> {
        let requirements = match self.classifier.classify(ctx.user_input()).await {
            Ok(raw) => {
                let ingested = RequirementsReader::ingest(&raw);
                if let Some(reason) = &ingested.fallback_reason {
                    warn!("Classifier output unusable: {}", reason);
                    ctx.add_warning(format!("ClassificationFallback: {}", reason));
                }
                ingested.requirements
            }
            Err(e) => {
                warn!("Classifier failed: {}", e);
                ctx.add_warning(format!("ClassificationFallback: {}", e));
                Requirements::fallback()
            }
        };

        info!(
            "Requirements for {}: {} features, {} sensors, {} controls",
            requirements.app_name,
            requirements.features.len(),
            requirements.sensor_types.len(),
            requirements.control_types.len()
        );
        ctx.set_requirements(requirements)
    }
}
