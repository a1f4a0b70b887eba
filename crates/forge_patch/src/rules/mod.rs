//! Rule implementations.
//!
//! Every rule carries its own presence marker, so running it against its own
//! output is a no-op.

mod dart;
mod insert;
mod rewrite;

pub use dart::{EnsureImports, EnsureInitStateHook, EnsureStateFields, StateField};
pub use insert::{InsertAfterAnchor, InsertLinesBefore};
pub use rewrite::{PatternRewrite, ReplaceLine};
