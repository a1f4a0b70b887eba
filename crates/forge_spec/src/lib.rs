//! # forge_spec
//!
//! Requirement and architecture documents for apkforge.
//!
//! Both documents are produced by unreliable external collaborators as free
//! text. This crate is the boundary where that text becomes typed records:
//!
//! - **Requirements**: ingested leniently. Malformed output falls back to a
//!   built-in default record instead of failing.
//! - **Architecture**: ingested strictly. The document must parse and must
//!   carry every key in [`REQUIRED_KEYS`], otherwise the Architect stage fails.
//!
//! ## Example
//!
//! ```rust
//! use forge_spec::ArchitectureValidator;
//!
//! let raw = r#"Here you go:
//! {"project_structure": {"lib": {"main.dart": "entry"}},
//!  "dependencies": {"flutter_blue_plus": "^1.36.8"},
//!  "main_features": ["scan"],
//!  "file_templates": {"lib/main.dart": "entry point"}}
//! Let me know if you need anything else."#;
//!
//! let validated = ArchitectureValidator::validate(raw).unwrap();
//! assert!(validated.architecture.dependencies.contains_key("flutter_blue_plus"));
//! ```

pub mod error;
pub mod extract;
pub mod models;
pub mod requirements;
pub mod validator;

pub use error::{SpecError, SpecResult};
pub use extract::{extract_candidate, normalize_quotes, parse_lenient};
pub use models::{Architecture, DependencySpec, FeatureDescriptor, Requirements, StructureNode};
pub use requirements::{IngestedRequirements, RequirementsReader};
pub use validator::{ArchitectureValidator, ValidatedArchitecture, ValidationResult, REQUIRED_KEYS};
