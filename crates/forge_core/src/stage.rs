//! Stage definitions.
//!
//! A stage is one step of the generation pipeline. The orchestrator looks
//! it up in a [`StageRegistry`](crate::StageRegistry) by its [`StageId`] and
//! hands it the session's context.
//!
//! # Example
//!
//! ```rust,ignore
//! use async_trait::async_trait;
//! use forge_core::{CoreResult, GenerationContext, Stage, StageId};
//!
//! struct ClassifyStage;
//!
//! #[async_trait]
//! impl Stage for ClassifyStage {
//!     fn id(&self) -> StageId { StageId::Classify }
//!     fn description(&self) -> &str { "Turn the prompt into requirements" }
//!
//!     async fn execute(&self, ctx: &mut GenerationContext) -> CoreResult<()> {
//!         ctx.set_requirements(forge_spec::Requirements::fallback())
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::context::{GenerationContext, StageId};
use crate::error::CoreResult;

/// One step of the pipeline.
///
/// Returning `Err` fails the session; the orchestrator records the error and
/// stops. Stages must not call [`GenerationContext::enter_stage`] or
/// [`GenerationContext::complete_stage`] themselves.
#[async_trait]
pub trait Stage: Send + Sync {
    /// Pipeline position this stage implements.
    fn id(&self) -> StageId;

    /// Human-readable description.
    fn description(&self) -> &str;

    /// Run the stage against the context.
    async fn execute(&self, ctx: &mut GenerationContext) -> CoreResult<()>;
}
