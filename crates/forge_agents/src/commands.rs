//! Parsing of user-supplied hardware command text.
//!
//! Accepts one control per line:
//!
//! ```text
//! button "Turn On": sends "RELAY_ON"
//! slider "Brightness": sends "B"
//! ```
//!
//! Lines that do not match are ignored. Without explicit commands, a set of
//! numbered defaults is derived from the device the prompt mentions.

use regex::Regex;
use serde::Serialize;

/// Kind of on-screen control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlKind {
    Button,
    Slider,
}

/// One control bound to the command it writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HardwareCommand {
    pub kind: ControlKind,
    pub label: String,
    /// Payload written to the device; sliders append the rounded value
    pub command: String,
}

impl HardwareCommand {
    pub fn button(label: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            kind: ControlKind::Button,
            label: label.into(),
            command: command.into(),
        }
    }

    pub fn slider(label: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            kind: ControlKind::Slider,
            label: label.into(),
            command: command.into(),
        }
    }
}

const LINE_PATTERN: &str = r#"(?i)^\s*(button|slider)\s+"([^"]+)"\s*:\s*sends\s+"([^"]*)"\s*$"#;

/// Parse command text; unrecognized lines are skipped.
pub fn parse_commands(text: &str) -> Vec<HardwareCommand> {
    let Ok(pattern) = Regex::new(LINE_PATTERN) else {
        return Vec::new();
    };
    text.lines()
        .filter_map(|line| {
            let caps = pattern.captures(line)?;
            let kind = if caps[1].eq_ignore_ascii_case("slider") {
                ControlKind::Slider
            } else {
                ControlKind::Button
            };
            Some(HardwareCommand {
                kind,
                label: caps[2].trim().to_string(),
                command: caps[3].to_string(),
            })
        })
        .collect()
}

/// Device family guessed from free text.
pub fn detect_device(text: &str) -> &'static str {
    let lower = text.to_lowercase();
    let families: [(&str, &[&str]); 5] = [
        ("relay", &["relay", "switch"]),
        ("led", &["neopixel", "led", "rgb"]),
        ("motor", &["servo", "motor"]),
        ("buzzer", &["buzzer", "beep"]),
        ("laser", &["laser", "light"]),
    ];
    families
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(family, _)| *family)
        .unwrap_or("device")
}

/// Numbered on/off buttons for the device mentioned in `prompt`.
pub fn default_commands(prompt: &str) -> Vec<HardwareCommand> {
    let device = title(detect_device(prompt));
    vec![
        HardwareCommand::button(format!("{} On", device), "1"),
        HardwareCommand::button(format!("{} Off", device), "2"),
    ]
}

/// Whether a button label reads as switching something on.
pub fn is_on_label(label: &str) -> bool {
    let lower = label.to_lowercase();
    ["on", "start", "enable"]
        .iter()
        .any(|w| lower.split_whitespace().any(|word| word == *w))
}

fn title(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        let text = r#"
button "Turn On": sends "RELAY_START"
  BUTTON "Turn Off" : sends "RELAY_STOP"
slider "Brightness": sends "B"
this line is noise
"#;
        let commands = parse_commands(text);
        assert_eq!(
            commands,
            vec![
                HardwareCommand::button("Turn On", "RELAY_START"),
                HardwareCommand::button("Turn Off", "RELAY_STOP"),
                HardwareCommand::slider("Brightness", "B"),
            ]
        );
    }

    #[test]
    fn test_detect_device() {
        assert_eq!(detect_device("a relay board"), "relay");
        assert_eq!(detect_device("RGB strip"), "led");
        assert_eq!(detect_device("servo arm"), "motor");
        assert_eq!(detect_device("weather station"), "device");
    }

    #[test]
    fn test_default_commands() {
        let commands = default_commands("control my buzzer");
        assert_eq!(commands[0], HardwareCommand::button("Buzzer On", "1"));
        assert_eq!(commands[1].command, "2");
    }

    #[test]
    fn test_on_labels() {
        assert!(is_on_label("Turn On"));
        assert!(is_on_label("Start pump"));
        assert!(!is_on_label("Stop"));
        assert!(!is_on_label("Monitor"));
    }
}
