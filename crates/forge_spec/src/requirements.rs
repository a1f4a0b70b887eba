//! Lenient ingestion of classifier output.

use std::collections::BTreeSet;

use serde_json::Value;
use tracing::{debug, warn};

use crate::extract::parse_lenient;
use crate::models::Requirements;

/// Requirement record together with the reason a fallback was used, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestedRequirements {
    pub requirements: Requirements,
    pub fallback_reason: Option<String>,
}

impl IngestedRequirements {
    pub fn used_fallback(&self) -> bool {
        self.fallback_reason.is_some()
    }
}

/// Reader turning raw classifier text into a [`Requirements`] record.
pub struct RequirementsReader;

impl RequirementsReader {
    /// Ingest raw classifier output.
    ///
    /// Never fails: output that cannot be read is replaced with
    /// [`Requirements::fallback`] and the reason is reported.
    pub fn ingest(raw: &str) -> IngestedRequirements {
        match Self::read(raw) {
            Ok(requirements) => {
                debug!("Ingested requirements for '{}'", requirements.app_name);
                IngestedRequirements {
                    requirements,
                    fallback_reason: None,
                }
            }
            Err(reason) => {
                warn!("Classifier output unusable, using default requirements: {}", reason);
                IngestedRequirements {
                    requirements: Requirements::fallback(),
                    fallback_reason: Some(reason),
                }
            }
        }
    }

    fn read(raw: &str) -> Result<Requirements, String> {
        let (value, _) = parse_lenient(raw).map_err(|e| e.to_string())?;
        let object = value
            .as_object()
            .ok_or_else(|| "requirement record is not an object".to_string())?;

        let app_name = object
            .get("app_name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| "requirement record has no app_name".to_string())?;

        let description = object
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default();

        let mut requirements = Requirements::new(app_name, description);
        requirements.features = string_set(object.get("features"));
        requirements.ui_components = string_set(object.get("ui_components"));
        requirements.sensor_types = string_set(object.get("sensor_types"));
        requirements.control_types = string_set(object.get("control_types"));
        Ok(requirements)
    }
}

/// Accept a list of strings or a single string; anything else is empty.
fn string_set(value: Option<&Value>) -> BTreeSet<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(single)) if !single.trim().is_empty() => {
            std::iter::once(single.trim().to_string()).collect()
        }
        _ => BTreeSet::new(),
    }
}
