//! # forge_build
//!
//! The steps that touch the Flutter toolchain and the filesystem:
//!
//! - [`WorkspaceManager`]: exclusive per-session workspaces and the startup
//!   sweep that reclaims orphans
//! - [`ScaffoldBuilder`]: `flutter create` plus the architecture's file tree
//! - [`BuildExecutor`]: retrying `pub get` and `build apk` with artifact
//!   verification
//! - [`ArtifactPublisher`]: collision-free permanent artifact names
//!
//! Every command runs through [`FlutterToolchain`], which scopes the child to
//! a working directory and leaves the caller's untouched.

pub mod error;
pub mod executor;
pub mod publisher;
pub mod scaffold;
pub mod toolchain;
pub mod workspace;

pub use error::{BuildError, BuildResult};
pub use executor::{
    locate_artifact, AttemptEntry, BuildExecutor, BuildOutcome, BuildPhase, ARTIFACT_CANDIDATES,
};
pub use publisher::{artifact_file_name, ArtifactPublisher};
pub use scaffold::{
    count_files, materialize, placeholder, sanitize_app_name, MaterializeReport, ScaffoldBuilder,
    ScaffoldOptions, ScaffoldOutcome,
};
pub use toolchain::FlutterToolchain;
pub use workspace::{SweepReport, WorkspaceManager, DEFAULT_STALE_AFTER, WORKSPACE_PREFIX};
