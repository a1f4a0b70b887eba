//! Integration tests for requirement and architecture ingestion.

use serde_json::{json, Value};

use forge_spec::{
    ArchitectureValidator, Requirements, RequirementsReader, SpecError, StructureNode,
    REQUIRED_KEYS,
};

fn architecture_document() -> Value {
    json!({
        "project_structure": {
            "lib": {
                "screens": {"home_screen.dart": "Main screen"},
                "main.dart": "entry"
            }
        },
        "dependencies": {
            "flutter_blue_plus": "^1.36.8",
            "permission_handler": "^11.3.1"
        },
        "main_features": ["Bluetooth scanning", "Device control"],
        "file_templates": {"lib/main.dart": "App entry point"}
    })
}

/// Removing any single required key yields a schema error naming that key.
#[test]
fn test_each_missing_key_is_reported() {
    for key in REQUIRED_KEYS {
        let mut doc = architecture_document();
        doc.as_object_mut().unwrap().remove(key);

        let raw = format!("```json\n{}\n```", doc);
        let err = ArchitectureValidator::validate(&raw).unwrap_err();

        assert!(err.is_schema_error(), "expected schema error for {}", key);
        match &err {
            SpecError::MissingKeys { missing } => assert_eq!(missing, &vec![key.to_string()]),
            other => panic!("unexpected error for {}: {}", key, other),
        }
        assert!(err.to_string().contains(key));
    }
}

/// Architect output in single quotes is accepted after normalization.
#[test]
fn test_single_quoted_document_is_accepted() {
    let raw = architecture_document().to_string().replace('"', "'");
    let validated = ArchitectureValidator::validate(&format!("Here it is: {}", raw)).unwrap();

    let lib = validated.architecture.project_structure.children().unwrap()["lib"].clone();
    assert!(matches!(lib, StructureNode::Directory(_)));
    assert_eq!(validated.architecture.project_structure.file_count(), 2);
}

/// Unparseable output is a parse error that keeps the raw response.
#[test]
fn test_unparseable_architecture() {
    let raw = "```json\n{project_structure: [\n```";
    let err = ArchitectureValidator::validate(raw).unwrap_err();
    assert!(err.is_parse_error());
    if let SpecError::Parse { response, .. } = err {
        assert_eq!(response, raw);
    }
}

/// Requirement ingestion never fails and reports when it substituted defaults.
#[test]
fn test_requirements_fallback_is_reported() {
    let ok = RequirementsReader::ingest(
        r#"{"app_name": "Fan Control", "description": "", "features": ["device_control"],
            "ui_components": [], "sensor_types": [], "control_types": ["slider"]}"#,
    );
    assert!(!ok.used_fallback());
    assert!(!ok.requirements.has_sensors());

    let fallback = RequirementsReader::ingest("");
    assert!(fallback.used_fallback());
    assert_eq!(fallback.requirements, Requirements::fallback());
}
