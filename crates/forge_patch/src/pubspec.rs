//! Dependency manifest normalization.
//!
//! `pubspec.yaml` is parsed into a typed record, corrected, and written back
//! whole. Maps are ordered, so the output depends only on the corrected
//! record and a second pass reproduces it byte for byte.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::{Mapping, Value};
use tracing::{debug, info};

use forge_spec::Requirements;

use crate::error::{PatchError, PatchResult};
use crate::rule::{Fixup, PatchRule};

/// Manifest file name, relative to the project root.
pub const PUBSPEC: &str = "pubspec.yaml";

/// Dart SDK constraint written into `environment.sdk`.
pub const SDK_CONSTRAINT: &str = ">=3.2.0 <4.0.0";

/// Packages known to break resolution or compilation of generated apps.
pub const DENYLIST: &[&str] = &[
    "flutter_bluetooth_serial",
    "line_graph",
    "charts_flutter",
    "graph_view",
    "color_picker",
    "slider",
    "connectivity_plus",
    "network_info_plus",
    "device_info_plus",
    "package_info_plus",
    "shared_preferences_plus",
];

/// Typed view of the parts of `pubspec.yaml` this module rewrites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pubspec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_to: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Value>,
    #[serde(default, deserialize_with = "nullable_map")]
    pub environment: BTreeMap<String, Value>,
    #[serde(default, deserialize_with = "nullable_map")]
    pub dependencies: BTreeMap<String, Value>,
    #[serde(default, deserialize_with = "nullable_map")]
    pub dev_dependencies: BTreeMap<String, Value>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

fn nullable_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<BTreeMap<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

fn sdk_dependency() -> Value {
    let mut map = Mapping::new();
    map.insert(Value::from("sdk"), Value::from("flutter"));
    Value::Mapping(map)
}

impl Pubspec {
    pub fn parse(content: &str) -> PatchResult<Self> {
        serde_yaml::from_str(content).map_err(|e| PatchError::InvalidManifest {
            path: PUBSPEC.to_string(),
            message: e.to_string(),
        })
    }

    pub fn to_yaml(&self) -> PatchResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Removes denylisted packages, pins the required set and the SDK range.
#[derive(Debug, Clone)]
pub struct NormalizeDependencyManifest {
    required: BTreeMap<String, String>,
    denylist: BTreeSet<String>,
    sdk: String,
}

impl NormalizeDependencyManifest {
    pub fn new() -> Self {
        Self {
            required: BTreeMap::new(),
            denylist: DENYLIST.iter().map(|s| s.to_string()).collect(),
            sdk: SDK_CONSTRAINT.to_string(),
        }
    }

    /// Required set for an app with the given requirements.
    pub fn for_requirements(requirements: &Requirements) -> Self {
        let mut rule = Self::new()
            .require("flutter_blue_plus", "^1.36.8")
            .require("permission_handler", "^11.3.1")
            .require("cupertino_icons", "^1.0.2");
        if requirements.has_sensors() {
            rule = rule.require("fl_chart", "^0.68.0");
        }
        if requirements.has_ui_component("color_picker") {
            rule = rule.require("flutter_colorpicker", "^1.1.0");
        }
        rule
    }

    pub fn require(mut self, package: impl Into<String>, version: impl Into<String>) -> Self {
        self.required.insert(package.into(), version.into());
        self
    }

    pub fn deny(mut self, package: impl Into<String>) -> Self {
        self.denylist.insert(package.into());
        self
    }

    pub fn required(&self) -> &BTreeMap<String, String> {
        &self.required
    }

    /// Apply the corrections to a parsed manifest.
    pub fn normalize(&self, manifest: &mut Pubspec) {
        for section in [&mut manifest.dependencies, &mut manifest.dev_dependencies] {
            let before = section.len();
            section.retain(|name, _| !self.denylist.contains(name));
            if section.len() != before {
                info!("Removed {} denylisted package(s)", before - section.len());
            }
        }

        manifest
            .dependencies
            .entry("flutter".to_string())
            .or_insert_with(sdk_dependency);
        manifest
            .dev_dependencies
            .entry("flutter_test".to_string())
            .or_insert_with(sdk_dependency);

        for (package, version) in &self.required {
            debug!("Pinning {} {}", package, version);
            manifest
                .dependencies
                .insert(package.clone(), Value::from(version.as_str()));
        }

        manifest
            .environment
            .insert("sdk".to_string(), Value::from(self.sdk.as_str()));
    }
}

impl Default for NormalizeDependencyManifest {
    fn default() -> Self {
        Self::new()
    }
}

impl PatchRule for NormalizeDependencyManifest {
    fn name(&self) -> &str {
        "normalize_dependency_manifest"
    }

    fn apply(&self, content: &str) -> PatchResult<Fixup> {
        let mut manifest = Pubspec::parse(content)?;
        self.normalize(&mut manifest);
        Ok(Fixup::compare(content, manifest.to_yaml()?))
    }
}
