//! # forge_core
//!
//! Generation context and stage orchestration for apkforge.
//!
//! # Architecture
//!
//! - **Context**: per-session state whose mutators enforce the pipeline invariants
//! - **Stages**: units of work looked up by [`StageId`] in a [`StageRegistry`]
//! - **Pipeline**: runs the fixed stage order, halting on the first failure
//! - **Sessions**: concurrency-safe registry of live contexts plus a JSON store
//!   for finished ones
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use forge_core::{Pipeline, SessionRegistry, StageRegistry, UserInput};
//!
//! let mut registry = StageRegistry::new();
//! registry.register(Arc::new(MyClassifyStage));
//! // ... register the remaining stages
//!
//! let sessions = SessionRegistry::new();
//! let handle = sessions.create(UserInput::new("a fan controller")?);
//! let snapshot = Pipeline::new(Arc::new(registry)).run_session(&handle).await;
//! println!("{}", snapshot.to_json()?);
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod orchestrator;
pub mod persistence;
pub mod progress;
pub mod registry;
pub mod session;
pub mod stage;

pub use config::{ForgeConfig, RetrySettings, CONFIG_FILE};
pub use context::{BuildReport, BuildStatus, GenerationContext, StageId, UserInput};
pub use error::{CoreError, CoreResult};
pub use orchestrator::Pipeline;
pub use persistence::SessionStore;
pub use progress::ProgressSnapshot;
pub use registry::StageRegistry;
pub use session::{SessionHandle, SessionRegistry};
pub use stage::Stage;
