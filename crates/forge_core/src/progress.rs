//! Read-only progress view of a session.

use serde::{Deserialize, Serialize};

use crate::context::GenerationContext;

/// Serializable progress snapshot for pollers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub progress: u8,
    pub current_stage: String,
    pub status: String,
    pub error_log: Vec<String>,
    pub artifact_ready: bool,
}

impl ProgressSnapshot {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl From<&GenerationContext> for ProgressSnapshot {
    fn from(ctx: &GenerationContext) -> Self {
        Self {
            progress: ctx.progress(),
            current_stage: ctx.stage().to_string(),
            status: ctx.status().to_string(),
            error_log: ctx.error_log().to_vec(),
            artifact_ready: ctx.artifact_path().is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{StageId, UserInput};

    #[test]
    fn test_snapshot_json_shape() {
        let mut ctx = GenerationContext::new(UserInput::new("thermostat").unwrap());
        ctx.enter_stage(StageId::Classify).unwrap();
        ctx.fail("boom");

        let snapshot = ProgressSnapshot::from(&ctx);
        let value: serde_json::Value = serde_json::from_str(&snapshot.to_json().unwrap()).unwrap();

        assert_eq!(value["progress"], 0);
        assert_eq!(value["current_stage"], "error");
        assert_eq!(value["status"], "failed");
        assert_eq!(value["error_log"][0], "boom");
        assert_eq!(value["artifact_ready"], false);
    }
}
