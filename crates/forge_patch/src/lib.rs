//! # forge_patch
//!
//! Self-healing fixups applied to a generated Flutter project right before
//! it is compiled.
//!
//! Each fixup is a named [`PatchRule`] guarded by a presence marker, so a
//! second pass over patched files changes nothing. Rules are grouped per
//! target file in a [`PatchCatalog`]; the [`SourcePatcher`] runs the catalog
//! against a project directory and returns a [`PatchReport`].
//!
//! A rule that cannot find its anchor produces a [`PatchWarning`] and is left
//! unapplied. Only a manifest that cannot be parsed aborts the pass.

pub mod catalog;
pub mod error;
pub mod patcher;
pub mod pubspec;
pub mod rule;
pub mod rules;

pub use catalog::{PatchCatalog, RuleGroup, ANDROID_MANIFEST, APP_GRADLE, MAIN_DART, PROJECT_GRADLE};
pub use error::{PatchError, PatchResult};
pub use patcher::{FileReport, PatchReport, SourcePatcher};
pub use pubspec::{NormalizeDependencyManifest, Pubspec, DENYLIST, PUBSPEC, SDK_CONSTRAINT};
pub use rule::{Fixup, PatchRule, PatchWarning};
