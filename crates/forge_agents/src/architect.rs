//! Blueprint architecture for Bluetooth controller apps.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use forge_spec::Requirements;

use crate::error::AgentResult;
use crate::traits::Architect;

/// Offline architect: derives a conventional layered layout from the
/// requirement record and answers in the chatty, fenced form a remote
/// architect would use.
#[derive(Debug, Clone, Default)]
pub struct BlueprintArchitect;

impl BlueprintArchitect {
    pub fn new() -> Self {
        Self
    }

    /// The architecture document for `requirements`.
    pub fn blueprint(&self, requirements: &Requirements) -> Value {
        let mut widgets = Map::new();
        widgets.insert("status_card.dart".into(), json!("Connection status card"));
        widgets.insert("device_list.dart".into(), json!("Scan results with connect actions"));
        if requirements.has_sensors() {
            widgets.insert("sensor_card.dart".into(), json!("Live sensor value display"));
        }
        if !requirements.control_types.is_empty() {
            widgets.insert("control_panel.dart".into(), json!("Command buttons and sliders"));
        }

        let mut dependencies = Map::new();
        dependencies.insert("flutter_blue_plus".into(), json!("^1.36.8"));
        dependencies.insert("permission_handler".into(), json!("^11.3.1"));
        dependencies.insert("cupertino_icons".into(), json!("^1.0.2"));
        if requirements.has_sensors() {
            dependencies.insert("fl_chart".into(), json!("^0.68.0"));
        }
        if requirements.has_ui_component("color_picker") {
            dependencies.insert("flutter_colorpicker".into(), json!("^1.1.0"));
        }

        let main_features: Vec<Value> = requirements
            .features
            .iter()
            .map(|feature| json!({ "name": feature, "description": feature.replace('_', " ") }))
            .collect();

        json!({
            "project_structure": {
                "lib": {
                    "main.dart": "App entry point and controller screen",
                    "services": {
                        "bluetooth_service.dart": "Scanning, connection and characteristic access"
                    },
                    "widgets": widgets,
                },
                "assets": {}
            },
            "dependencies": dependencies,
            "dev_dependencies": {
                "flutter_lints": "^3.0.0"
            },
            "main_features": main_features,
            "file_templates": {
                "lib/main.dart": format!("{} main screen", requirements.app_name),
                "lib/services/bluetooth_service.dart": "Bluetooth Low Energy service layer"
            }
        })
    }
}

#[async_trait]
impl Architect for BlueprintArchitect {
    async fn design(&self, requirements: &Requirements) -> AgentResult<String> {
        let document = serde_json::to_string_pretty(&self.blueprint(requirements))?;
        Ok(format!(
            "Here is the architecture for {}:\n\n```json\n{}\n```\n",
            requirements.app_name, document
        ))
    }
}
