//! Collaborator contracts.
//!
//! Classification, architecture design and code generation are delegated to
//! implementations of these traits. Their output is untrusted: the stages
//! validate or default it at the boundary.

use std::collections::BTreeMap;

use async_trait::async_trait;

use forge_core::UserInput;
use forge_spec::{Architecture, Requirements};

use crate::error::AgentResult;

/// Turns a request into raw text holding a requirement record.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, input: &UserInput) -> AgentResult<String>;
}

/// Turns requirements into raw text holding an architecture document.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Architect: Send + Sync {
    async fn design(&self, requirements: &Requirements) -> AgentResult<String>;
}

/// Produces application sources keyed by project-relative path.
///
/// The result must contain `lib/main.dart`. `hardware_commands` is empty
/// when the user supplied none.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CodeGenerator: Send + Sync {
    async fn generate(
        &self,
        requirements: &Requirements,
        architecture: &Architecture,
        hardware_commands: &str,
    ) -> AgentResult<BTreeMap<String, String>>;
}
