//! Typed records for the requirement and architecture documents.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Structured requirement record produced by the classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirements {
    pub app_name: String,
    pub description: String,
    #[serde(default)]
    pub features: BTreeSet<String>,
    #[serde(default)]
    pub ui_components: BTreeSet<String>,
    #[serde(default)]
    pub sensor_types: BTreeSet<String>,
    #[serde(default)]
    pub control_types: BTreeSet<String>,
}

impl Requirements {
    /// Create a requirement record with empty feature sets.
    pub fn new(app_name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            description: description.into(),
            features: BTreeSet::new(),
            ui_components: BTreeSet::new(),
            sensor_types: BTreeSet::new(),
            control_types: BTreeSet::new(),
        }
    }

    /// The built-in default substituted when classification fails.
    pub fn fallback() -> Self {
        let mut requirements =
            Self::new("Bluetooth Controller", "Professional Bluetooth application");
        requirements.features = set(&[
            "bluetooth_scanning",
            "device_connection",
            "data_transmission",
            "device_control",
        ]);
        requirements.ui_components = set(&["status_card", "control_buttons", "device_list"]);
        requirements.sensor_types = set(&["general_sensor"]);
        requirements.control_types = set(&["buttons"]);
        requirements
    }

    pub fn with_feature(mut self, feature: impl Into<String>) -> Self {
        self.features.insert(feature.into());
        self
    }

    pub fn with_ui_component(mut self, component: impl Into<String>) -> Self {
        self.ui_components.insert(component.into());
        self
    }

    pub fn with_sensor(mut self, sensor: impl Into<String>) -> Self {
        self.sensor_types.insert(sensor.into());
        self
    }

    pub fn with_control(mut self, control: impl Into<String>) -> Self {
        self.control_types.insert(control.into());
        self
    }

    pub fn has_sensors(&self) -> bool {
        !self.sensor_types.is_empty()
    }

    pub fn has_ui_component(&self, component: &str) -> bool {
        self.ui_components.contains(component)
    }
}

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// A node of the nested project structure description.
///
/// Directories map child names to sub-trees; files carry a placeholder
/// description of their purpose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StructureNode {
    Directory(BTreeMap<String, StructureNode>),
    File(String),
}

impl StructureNode {
    /// An empty directory node.
    pub fn empty_dir() -> Self {
        Self::Directory(BTreeMap::new())
    }

    /// Convert a loosely shaped JSON value into a structure tree.
    ///
    /// Objects become directories and strings become files. Arrays of names
    /// become directories of files with empty descriptions; other scalars are
    /// rendered into the file description.
    pub fn from_json(value: &serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Object(map) => Self::Directory(
                map.iter()
                    .map(|(name, child)| (name.clone(), Self::from_json(child)))
                    .collect(),
            ),
            Value::Array(items) => Self::Directory(
                items
                    .iter()
                    .filter_map(|item| item.as_str())
                    .map(|name| (name.to_string(), Self::File(String::new())))
                    .collect(),
            ),
            Value::String(description) => Self::File(description.clone()),
            Value::Null => Self::File(String::new()),
            other => Self::File(other.to_string()),
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, Self::Directory(_))
    }

    /// Children of a directory node, `None` for files.
    pub fn children(&self) -> Option<&BTreeMap<String, StructureNode>> {
        match self {
            Self::Directory(children) => Some(children),
            Self::File(_) => None,
        }
    }

    /// Count file leaves in the tree.
    pub fn file_count(&self) -> usize {
        match self {
            Self::Directory(children) => children.values().map(StructureNode::file_count).sum(),
            Self::File(_) => 1,
        }
    }
}

impl Default for StructureNode {
    fn default() -> Self {
        Self::empty_dir()
    }
}

/// Version constraint or detailed source of a dependency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependencySpec {
    Version(String),
    Detailed(serde_json::Value),
}

impl DependencySpec {
    pub fn version(&self) -> Option<&str> {
        match self {
            Self::Version(v) => Some(v.as_str()),
            Self::Detailed(_) => None,
        }
    }
}

impl From<&str> for DependencySpec {
    fn from(version: &str) -> Self {
        Self::Version(version.to_string())
    }
}

/// A feature listed by the architect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureDescriptor {
    Name(String),
    Detailed(serde_json::Map<String, serde_json::Value>),
}

impl FeatureDescriptor {
    /// Best-effort display name.
    pub fn name(&self) -> String {
        match self {
            Self::Name(name) => name.clone(),
            Self::Detailed(map) => ["name", "title", "feature", "id"]
                .iter()
                .find_map(|key| map.get(*key).and_then(|v| v.as_str()))
                .unwrap_or("unnamed")
                .to_string(),
        }
    }
}

/// Architecture document accepted by the Architect stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Architecture {
    pub project_structure: StructureNode,
    pub dependencies: BTreeMap<String, DependencySpec>,
    #[serde(default)]
    pub dev_dependencies: BTreeMap<String, DependencySpec>,
    pub main_features: Vec<FeatureDescriptor>,
    pub file_templates: BTreeMap<String, String>,
}

impl Architecture {
    /// Names of the top-level entries of the project structure.
    pub fn top_level_entries(&self) -> Vec<&str> {
        self.project_structure
            .children()
            .map(|c| c.keys().map(|k| k.as_str()).collect())
            .unwrap_or_default()
    }
}
