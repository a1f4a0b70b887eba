//! Wiring of the standard pipeline from configuration.

use std::sync::Arc;

use forge_build::{
    ArtifactPublisher, BuildExecutor, FlutterToolchain, ScaffoldBuilder, ScaffoldOptions,
    WorkspaceManager,
};
use forge_core::{ForgeConfig, Pipeline, RetrySettings, StageRegistry};
use forge_runner::{RetryPolicy, ToolRunner};

use crate::architect::BlueprintArchitect;
use crate::classifier::KeywordClassifier;
use crate::generator::TemplateGenerator;
use crate::stages::{
    ArchitectStage, BuildStage, ClassifyStage, GenerateStage, PatchStage, PublishStage,
    ScaffoldStage,
};
use crate::traits::{Architect, Classifier, CodeGenerator};

/// The three external collaborators a pipeline delegates to.
#[derive(Clone)]
pub struct Collaborators {
    pub classifier: Arc<dyn Classifier>,
    pub architect: Arc<dyn Architect>,
    pub generator: Arc<dyn CodeGenerator>,
}

impl Collaborators {
    /// Offline collaborators shipped with the crate.
    pub fn builtin() -> Self {
        Self {
            classifier: Arc::new(KeywordClassifier::new()),
            architect: Arc::new(BlueprintArchitect::new()),
            generator: Arc::new(TemplateGenerator::new()),
        }
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_architect(mut self, architect: Arc<dyn Architect>) -> Self {
        self.architect = architect;
        self
    }

    pub fn with_generator(mut self, generator: Arc<dyn CodeGenerator>) -> Self {
        self.generator = generator;
        self
    }
}

impl Default for Collaborators {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Retry policy for a configured build phase. Cached state is always
/// cleared before a retry.
pub fn retry_policy(settings: &RetrySettings) -> RetryPolicy {
    RetryPolicy::new(settings.max_attempts, settings.timeout())
        .with_backoff(settings.backoff())
        .clean_before_retry(true)
}

/// Toolchain handle for the configured Flutter executable.
pub fn toolchain(config: &ForgeConfig, runner: Arc<dyn ToolRunner>) -> FlutterToolchain {
    FlutterToolchain::new(runner).with_bin(config.flutter_bin.clone())
}

/// Workspace manager rooted at the configured temp root.
pub fn workspace_manager(config: &ForgeConfig) -> WorkspaceManager {
    WorkspaceManager::new(config.temp_root.clone())
        .with_prefix(config.workspace_prefix.clone())
        .with_stale_after(config.sweep_stale_after())
}

/// Register all seven stages.
pub fn build_registry(
    config: &ForgeConfig,
    runner: Arc<dyn ToolRunner>,
    collaborators: Collaborators,
) -> StageRegistry {
    let flutter = toolchain(config, runner);
    let scaffold_options = ScaffoldOptions {
        platform: config.platform.clone(),
        android_language: config.android_language.clone(),
        timeout: config.scaffold_timeout(),
    };
    let executor = BuildExecutor::new(flutter.clone())
        .with_dependency_policy(retry_policy(&config.dependency))
        .with_compile_policy(retry_policy(&config.compile));

    let mut registry = StageRegistry::new();
    registry.register(Arc::new(ClassifyStage::new(collaborators.classifier)));
    registry.register(Arc::new(ArchitectStage::new(collaborators.architect)));
    registry.register(Arc::new(ScaffoldStage::new(
        workspace_manager(config),
        ScaffoldBuilder::new(flutter).with_options(scaffold_options),
    )));
    registry.register(Arc::new(GenerateStage::new(collaborators.generator)));
    registry.register(Arc::new(PatchStage::new()));
    registry.register(Arc::new(BuildStage::new(executor)));
    registry.register(Arc::new(PublishStage::new(ArtifactPublisher::new(
        config.output_dir.clone(),
    ))));
    registry
}

/// The standard pipeline, persisting finished sessions under the
/// configured state directory.
pub fn create_pipeline(
    config: &ForgeConfig,
    runner: Arc<dyn ToolRunner>,
    collaborators: Collaborators,
) -> Pipeline {
    let registry = build_registry(config, runner, collaborators);
    Pipeline::new(Arc::new(registry)).with_persistence(config.state_dir.clone())
}
