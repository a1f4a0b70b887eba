//! Architecture document validation.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::{SpecError, SpecResult};
use crate::extract::parse_lenient;
use crate::models::{Architecture, DependencySpec, FeatureDescriptor, StructureNode};

/// Top-level keys every architecture document must carry.
pub const REQUIRED_KEYS: [&str; 4] = [
    "project_structure",
    "dependencies",
    "main_features",
    "file_templates",
];

/// Validation result with details.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(message.into());
    }

    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn merge(&mut self, other: ValidationResult) {
        if !other.valid {
            self.valid = false;
        }
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

/// An accepted architecture plus non-fatal observations about it.
#[derive(Debug, Clone)]
pub struct ValidatedArchitecture {
    pub architecture: Architecture,
    pub warnings: Vec<String>,
}

/// Validator for architect output.
pub struct ArchitectureValidator;

impl ArchitectureValidator {
    /// Extract, parse, check and ingest a raw architect response.
    pub fn validate(raw: &str) -> SpecResult<ValidatedArchitecture> {
        let (document, _) = parse_lenient(raw)?;
        Self::validate_value(&document)
    }

    /// Check and ingest an already parsed document.
    pub fn validate_value(document: &Value) -> SpecResult<ValidatedArchitecture> {
        let object = document
            .as_object()
            .ok_or_else(|| SpecError::MissingKeys {
                missing: REQUIRED_KEYS.iter().map(|k| k.to_string()).collect(),
            })?;

        let missing = Self::missing_keys(object);
        if !missing.is_empty() {
            return Err(SpecError::MissingKeys { missing });
        }

        let architecture = Architecture {
            project_structure: Self::read_structure(&object["project_structure"])?,
            dependencies: Self::read_dependencies("dependencies", &object["dependencies"])?,
            dev_dependencies: match object.get("dev_dependencies") {
                Some(value) if !value.is_null() => {
                    Self::read_dependencies("dev_dependencies", value)?
                }
                _ => BTreeMap::new(),
            },
            main_features: Self::read_features(&object["main_features"])?,
            file_templates: Self::read_templates(&object["file_templates"])?,
        };

        let report = Self::review(&architecture);
        info!(
            "Architecture accepted: {} dependencies, {} features, {} warning(s)",
            architecture.dependencies.len(),
            architecture.main_features.len(),
            report.warnings.len()
        );

        Ok(ValidatedArchitecture {
            architecture,
            warnings: report.warnings,
        })
    }

    /// Required keys absent from the document, in declaration order.
    pub fn missing_keys(object: &Map<String, Value>) -> Vec<String> {
        REQUIRED_KEYS
            .iter()
            .filter(|key| !object.contains_key(**key))
            .map(|key| key.to_string())
            .collect()
    }

    /// Non-fatal review of an accepted architecture.
    pub fn review(architecture: &Architecture) -> ValidationResult {
        let mut result = ValidationResult::new();

        if architecture.project_structure.file_count() == 0 {
            result.add_warning("Project structure declares no files");
        }

        if architecture.main_features.is_empty() {
            result.add_warning("Architecture lists no main features");
        }

        if architecture.dependencies.is_empty() {
            result.add_warning("Architecture declares no dependencies");
        }

        for path in architecture.file_templates.keys() {
            if path.contains("..") {
                result.add_warning(format!("File template path '{}' escapes the project", path));
            }
        }

        result
    }

    fn read_structure(value: &Value) -> SpecResult<StructureNode> {
        match value {
            Value::Object(_) => Ok(StructureNode::from_json(value)),
            other => Err(SpecError::invalid_shape(
                "project_structure",
                format!("expected an object, found {}", kind(other)),
            )),
        }
    }

    fn read_dependencies(key: &str, value: &Value) -> SpecResult<BTreeMap<String, DependencySpec>> {
        let map = value.as_object().ok_or_else(|| {
            SpecError::invalid_shape(key, format!("expected an object, found {}", kind(value)))
        })?;

        Ok(map
            .iter()
            .map(|(name, spec)| {
                let spec = match spec {
                    Value::String(version) => DependencySpec::Version(version.clone()),
                    other => DependencySpec::Detailed(other.clone()),
                };
                (name.clone(), spec)
            })
            .collect())
    }

    fn read_features(value: &Value) -> SpecResult<Vec<FeatureDescriptor>> {
        let items = value.as_array().ok_or_else(|| {
            SpecError::invalid_shape(
                "main_features",
                format!("expected a list, found {}", kind(value)),
            )
        })?;

        Ok(items
            .iter()
            .map(|item| match item {
                Value::String(name) => FeatureDescriptor::Name(name.clone()),
                Value::Object(map) => FeatureDescriptor::Detailed(map.clone()),
                other => FeatureDescriptor::Name(other.to_string()),
            })
            .collect())
    }

    fn read_templates(value: &Value) -> SpecResult<BTreeMap<String, String>> {
        let map = value.as_object().ok_or_else(|| {
            SpecError::invalid_shape(
                "file_templates",
                format!("expected an object, found {}", kind(value)),
            )
        })?;

        debug!("Reading {} file template(s)", map.len());
        Ok(map
            .iter()
            .map(|(path, purpose)| {
                let purpose = match purpose {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (path.clone(), purpose)
            })
            .collect())
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn complete() -> Value {
        json!({
            "project_structure": {"lib": {"screens": {}, "main.dart": "entry"}},
            "dependencies": {"flutter_blue_plus": "^1.36.8", "local": {"path": "../x"}},
            "main_features": ["scan", {"name": "connect"}],
            "file_templates": {"lib/main.dart": "entry point"}
        })
    }

    #[test]
    fn test_validate_complete_document() {
        let validated = ArchitectureValidator::validate_value(&complete()).unwrap();
        let arch = validated.architecture;
        assert_eq!(arch.dependencies["flutter_blue_plus"].version(), Some("^1.36.8"));
        assert!(arch.dependencies["local"].version().is_none());
        assert_eq!(arch.main_features[1].name(), "connect");
        assert_eq!(arch.top_level_entries(), vec!["lib"]);
        assert!(validated.warnings.is_empty());
    }

    #[test]
    fn test_missing_keys_are_named_in_order() {
        let err = ArchitectureValidator::validate_value(&json!({"dependencies": {}})).unwrap_err();
        match err {
            SpecError::MissingKeys { missing } => assert_eq!(
                missing,
                vec!["project_structure", "main_features", "file_templates"]
            ),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_wrong_shape_is_schema_error() {
        let mut doc = complete();
        doc["main_features"] = json!("scan");
        let err = ArchitectureValidator::validate_value(&doc).unwrap_err();
        assert!(err.is_schema_error());
        assert!(err.to_string().contains("main_features"));
    }

    #[test]
    fn test_non_object_document() {
        let err = ArchitectureValidator::validate_value(&json!([1, 2])).unwrap_err();
        assert!(err.is_schema_error());
    }

    #[test]
    fn test_empty_sections_warn() {
        let doc = json!({
            "project_structure": {},
            "dependencies": {},
            "main_features": [],
            "file_templates": {}
        });
        let validated = ArchitectureValidator::validate_value(&doc).unwrap();
        assert_eq!(validated.warnings.len(), 3);
    }

    #[test]
    fn test_validate_raw_with_prose() {
        let raw = format!("Architecture below.\n```json\n{}\n```\nDone.", complete());
        assert!(ArchitectureValidator::validate(&raw).is_ok());
    }
}
