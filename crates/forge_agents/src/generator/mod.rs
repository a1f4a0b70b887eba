//! Template-based source generation.
//!
//! Renders a single-screen Bluetooth controller: scanning, connection,
//! live sensor cards and command controls chosen from the requirement
//! record and the user's hardware commands.

mod template;

use std::collections::BTreeMap;

use async_trait::async_trait;
use tracing::debug;

use forge_build::sanitize_app_name;
use forge_spec::{Architecture, Requirements};

use crate::commands::{default_commands, is_on_label, parse_commands, ControlKind, HardwareCommand};
use crate::error::AgentResult;
use crate::traits::CodeGenerator;

/// Path of the application entry point.
pub const MAIN_DART: &str = "lib/main.dart";

/// Path of the generated widget smoke test.
pub const WIDGET_TEST: &str = "test/widget_test.dart";

const ROW_INDENT: &str = "          ";

/// Offline generator rendering a fixed controller template.
#[derive(Debug, Clone, Default)]
pub struct TemplateGenerator;

impl TemplateGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Controls shown on screen: explicit commands first, otherwise defaults
    /// derived from the requirement record.
    pub fn controls(
        &self,
        requirements: &Requirements,
        hardware_commands: &str,
    ) -> Vec<HardwareCommand> {
        let mut controls = parse_commands(hardware_commands);
        if controls.is_empty() && requirements.control_types.contains("buttons") {
            controls = default_commands(&requirements.description);
        }
        let has_slider = controls.iter().any(|c| c.kind == ControlKind::Slider);
        if !has_slider && requirements.control_types.contains("sliders") {
            controls.push(HardwareCommand::slider("Level", "P"));
        }
        controls
    }

    /// Render `lib/main.dart`.
    pub fn render_main(&self, requirements: &Requirements, hardware_commands: &str) -> String {
        let controls = self.controls(requirements, hardware_commands);
        let color = requirements.has_ui_component("color_picker");

        let mut body = String::new();
        for sensor in &requirements.sensor_types {
            let (label, key, icon) = sensor_display(sensor);
            body.push_str(&format!(
                "{}sensorCard('{}', '{}', Icons.{}),\n",
                ROW_INDENT,
                dart_escape(&label),
                key,
                icon
            ));
        }

        let buttons: Vec<&HardwareCommand> =
            controls.iter().filter(|c| c.kind == ControlKind::Button).collect();
        if !buttons.is_empty() {
            body.push_str(&format!("{}Wrap(spacing: 8, runSpacing: 8, children: [\n", ROW_INDENT));
            for button in buttons {
                let icon = if is_on_label(&button.label) {
                    "power_settings_new"
                } else {
                    "touch_app"
                };
                body.push_str(&format!(
                    "{}  commandButton('{}', '{}', Icons.{}),\n",
                    ROW_INDENT,
                    dart_escape(&button.label),
                    dart_escape(&button.command),
                    icon
                ));
            }
            body.push_str(&format!("{}]),\n", ROW_INDENT));
        }

        for slider in controls.iter().filter(|c| c.kind == ControlKind::Slider) {
            body.push_str(&format!(
                "{}commandSlider('{}', '{}'),\n",
                ROW_INDENT,
                dart_escape(&slider.label),
                dart_escape(&slider.command)
            ));
        }

        if color {
            body.push_str(&format!("{}colorPicker(),\n", ROW_INDENT));
        }

        template::MAIN_DART
            .replace("__APP_TITLE__", &dart_escape(&requirements.app_name))
            .replace("__EXTRA_IMPORTS__", if color { template::COLOR_IMPORT } else { "" })
            .replace("__COLOR_WIDGET__", if color { template::COLOR_WIDGET } else { "" })
            .replace("__BODY__", &body)
    }

    /// Render the widget smoke test for the scaffolded package.
    pub fn render_widget_test(&self, requirements: &Requirements) -> String {
        format!(
            "import 'package:flutter_test/flutter_test.dart';\n\
             import 'package:{}/main.dart';\n\
             \n\
             void main() {{\n\
             \x20 testWidgets('renders the controller screen', (tester) async {{\n\
             \x20   await tester.pumpWidget(const ForgeApp());\n\
             \x20   expect(find.text('Scan'), findsOneWidget);\n\
             \x20 }});\n\
             }}\n",
            sanitize_app_name(&requirements.app_name)
        )
    }
}

#[async_trait]
impl CodeGenerator for TemplateGenerator {
    async fn generate(
        &self,
        requirements: &Requirements,
        architecture: &Architecture,
        hardware_commands: &str,
    ) -> AgentResult<BTreeMap<String, String>> {
        debug!(
            "Rendering {} with {} architecture features",
            requirements.app_name,
            architecture.main_features.len()
        );
        let mut sources = BTreeMap::new();
        sources.insert(MAIN_DART.to_string(), self.render_main(requirements, hardware_commands));
        sources.insert(WIDGET_TEST.to_string(), self.render_widget_test(requirements));
        Ok(sources)
    }
}

/// Card label, notification key and icon for a sensor type.
fn sensor_display(sensor: &str) -> (String, &'static str, &'static str) {
    let (label, key, icon) = match sensor {
        "temperature" => ("Temperature", "T", "thermostat"),
        "humidity" => ("Humidity", "H", "water_drop"),
        "moisture" => ("Soil Moisture", "S", "grass"),
        "light" => ("Light", "L", "light_mode"),
        "distance" => ("Distance", "D", "straighten"),
        "motion" => ("Motion", "M", "directions_run"),
        other => return (humanize(other), "V", "sensors"),
    };
    (label.to_string(), key, icon)
}

fn humanize(name: &str) -> String {
    name.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Escape text for a single-quoted Dart string literal.
pub fn dart_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '$' => out.push_str("\\$"),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out
}
