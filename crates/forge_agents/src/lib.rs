//! # forge_agents
//!
//! Collaborators and stages of the apkforge pipeline.
//!
//! The pipeline delegates three judgement calls to pluggable collaborators:
//!
//! - [`Classifier`]: prompt to requirement record
//! - [`Architect`]: requirements to architecture document
//! - [`CodeGenerator`]: requirements and architecture to Dart sources
//!
//! Offline implementations ([`KeywordClassifier`], [`BlueprintArchitect`],
//! [`TemplateGenerator`]) ship with the crate. Their output goes through the
//! same validation as any remote collaborator's.
//!
//! [`create_pipeline`] wires the collaborators, the toolchain and the seven
//! stages into a ready [`forge_core::Pipeline`].

pub mod architect;
pub mod classifier;
pub mod commands;
pub mod error;
pub mod generator;
pub mod pipeline;
pub mod stages;
pub mod traits;

pub use architect::BlueprintArchitect;
pub use classifier::{derive_app_name, KeywordClassifier, DEFAULT_APP_NAME};
pub use commands::{parse_commands, ControlKind, HardwareCommand};
pub use error::{AgentError, AgentResult};
pub use generator::{TemplateGenerator, MAIN_DART, WIDGET_TEST};
pub use pipeline::{
    build_registry, create_pipeline, retry_policy, toolchain, workspace_manager, Collaborators,
};
pub use stages::{
    ArchitectStage, BuildStage, ClassifyStage, GenerateStage, PatchStage, PublishStage,
    ScaffoldStage,
};
pub use traits::{Architect, Classifier, CodeGenerator};
