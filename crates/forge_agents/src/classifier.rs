//! Keyword-driven requirement extraction.
//!
//! Works offline: the prompt is scanned for hardware and control keywords
//! and the findings are rendered as a JSON requirement record, the same
//! shape a remote classifier would return.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use forge_core::UserInput;

use crate::error::AgentResult;
use crate::traits::Classifier;

/// Name used when the prompt has no usable words.
pub const DEFAULT_APP_NAME: &str = "Bluetooth Controller";

/// Sensor type and the keywords that announce it.
const SENSOR_KEYWORDS: &[(&str, &[&str])] = &[
    ("temperature", &["temp", "temperature", "thermal", "thermometer", "dht11", "dht22"]),
    ("humidity", &["humidity", "humid"]),
    ("moisture", &["moisture", "soil"]),
    ("light", &["ldr", "lux", "luminosity"]),
    ("distance", &["distance", "ultrasonic", "proximity"]),
    ("motion", &["motion", "pir", "movement"]),
];

const GENERAL_SENSOR_KEYWORDS: &[&str] =
    &["sensor", "sensors", "reading", "readings", "monitor", "data"];

const BUTTON_KEYWORDS: &[&str] = &[
    "button", "buttons", "on", "off", "switch", "toggle", "relay", "control",
];

const SLIDER_KEYWORDS: &[&str] = &[
    "slider", "brightness", "level", "adjust", "dimmer", "speed", "intensity",
];

const COLOR_KEYWORDS: &[&str] = &["color", "colour", "rgb", "neopixel", "ws2812"];

/// Words that never make it into a derived app name.
const STOPWORDS: &[&str] = &[
    "a", "an", "and", "app", "application", "bluetooth", "ble", "build", "can", "control", "controls",
    "create", "for", "from", "i", "in", "it", "make", "me", "my", "need", "of", "off", "on", "over",
    "please", "show", "that", "the", "to", "using", "via", "want", "which", "with",
];

/// Offline classifier built on keyword heuristics.
#[derive(Debug, Clone, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Analyze `prompt` and return the requirement record as JSON.
    pub fn analyze(&self, prompt: &str) -> serde_json::Value {
        let words = tokenize(prompt);
        let has_any = |keywords: &[&str]| keywords.iter().any(|k| words.contains(*k));

        let mut features: BTreeSet<&str> =
            ["bluetooth_scanning", "device_connection", "data_transmission"].into();
        let mut ui_components: BTreeSet<&str> = ["status_card", "device_list"].into();
        let mut sensor_types = BTreeSet::new();
        let mut control_types = BTreeSet::new();

        for (sensor, keywords) in SENSOR_KEYWORDS {
            if has_any(keywords) {
                sensor_types.insert(*sensor);
            }
        }
        if has_any(&["light"]) && has_any(&["sensor", "sensors", "level", "reading"]) {
            sensor_types.insert("light");
        }
        if sensor_types.is_empty() && has_any(GENERAL_SENSOR_KEYWORDS) {
            sensor_types.insert("general_sensor");
        }
        if !sensor_types.is_empty() {
            features.insert("sensor_data_parsing");
            features.insert("real_time_updates");
            ui_components.insert("sensor_displays");
        }

        if has_any(BUTTON_KEYWORDS) {
            control_types.insert("buttons");
            ui_components.insert("control_buttons");
        }
        if has_any(SLIDER_KEYWORDS) {
            control_types.insert("sliders");
            ui_components.insert("sliders");
        }
        if has_any(COLOR_KEYWORDS) {
            control_types.insert("color");
            ui_components.insert("color_picker");
        }
        if !control_types.is_empty() {
            features.insert("device_control");
        }

        let app_name = derive_app_name(prompt);
        debug!(
            "Classified {:?}: sensors={:?} controls={:?}",
            app_name, sensor_types, control_types
        );

        json!({
            "app_name": app_name,
            "description": prompt.trim(),
            "features": features,
            "ui_components": ui_components,
            "sensor_types": sensor_types,
            "control_types": control_types,
        })
    }
}

#[async_trait]
impl Classifier for KeywordClassifier {
    async fn classify(&self, input: &UserInput) -> AgentResult<String> {
        let record = self.analyze(&input.prompt);
        Ok(serde_json::to_string_pretty(&record)?)
    }
}

fn tokenize(prompt: &str) -> BTreeSet<String> {
    prompt
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_ascii_lowercase)
        .collect()
}

/// Title-case the first three significant words of the prompt.
pub fn derive_app_name(prompt: &str) -> String {
    let words: Vec<String> = prompt
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .filter(|w| !STOPWORDS.contains(&w.to_ascii_lowercase().as_str()))
        .take(3)
        .map(title_case)
        .collect();

    if words.is_empty() {
        DEFAULT_APP_NAME.to_string()
    } else {
        words.join(" ")
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => {
            first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase()
        }
        None => String::new(),
    }
}
