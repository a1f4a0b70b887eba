//! Rule catalog grouped by target file.

use forge_spec::Requirements;

use crate::error::PatchResult;
use crate::pubspec::{NormalizeDependencyManifest, PUBSPEC};
use crate::rule::PatchRule;
use crate::rules::{
    EnsureImports, EnsureInitStateHook, EnsureStateFields, InsertAfterAnchor, InsertLinesBefore,
    PatternRewrite, ReplaceLine, StateField,
};

pub const MAIN_DART: &str = "lib/main.dart";
pub const ANDROID_MANIFEST: &str = "android/app/src/main/AndroidManifest.xml";
pub const APP_GRADLE: &str = "android/app/build.gradle";
pub const PROJECT_GRADLE: &str = "android/build.gradle";

/// Rules applied, in order, to one file.
pub struct RuleGroup {
    pub target: String,
    pub rules: Vec<Box<dyn PatchRule>>,
}

impl RuleGroup {
    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }
}

impl std::fmt::Debug for RuleGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleGroup")
            .field("target", &self.target)
            .field("rules", &self.rule_names())
            .finish()
    }
}

/// Ordered set of rule groups.
#[derive(Debug, Default)]
pub struct PatchCatalog {
    groups: Vec<RuleGroup>,
}

impl PatchCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `rule` to the group for `target`, creating the group if needed.
    pub fn add_rule(&mut self, target: &str, rule: impl PatchRule + 'static) {
        match self.groups.iter_mut().find(|g| g.target == target) {
            Some(group) => group.rules.push(Box::new(rule)),
            None => self.groups.push(RuleGroup {
                target: target.to_string(),
                rules: vec![Box::new(rule)],
            }),
        }
    }

    pub fn with_rule(mut self, target: &str, rule: impl PatchRule + 'static) -> Self {
        self.add_rule(target, rule);
        self
    }

    pub fn groups(&self) -> &[RuleGroup] {
        &self.groups
    }

    pub fn group(&self, target: &str) -> Option<&RuleGroup> {
        self.groups.iter().find(|g| g.target == target)
    }

    pub fn targets(&self) -> Vec<&str> {
        self.groups.iter().map(|g| g.target.as_str()).collect()
    }

    pub fn rule_count(&self) -> usize {
        self.groups.iter().map(|g| g.rules.len()).sum()
    }

    /// The fixups every generated Bluetooth app receives before compilation.
    pub fn standard(requirements: &Requirements) -> PatchResult<Self> {
        let catalog = Self::new()
            .with_rule(MAIN_DART, deprecated_api()?)
            .with_rule(MAIN_DART, EnsureStateFields::new(state_fields())?)
            .with_rule(MAIN_DART, EnsureInitStateHook::new()?)
            .with_rule(
                MAIN_DART,
                EnsureImports::new([
                    "package:flutter/material.dart",
                    "package:flutter_blue_plus/flutter_blue_plus.dart",
                    "package:permission_handler/permission_handler.dart",
                    "dart:io",
                ])?,
            )
            .with_rule(PUBSPEC, NormalizeDependencyManifest::for_requirements(requirements))
            .with_rule(ANDROID_MANIFEST, manifest_permissions())
            .with_rule(APP_GRADLE, sdk_pins()?)
            .with_rule(
                APP_GRADLE,
                InsertAfterAnchor::new(
                    "enable_multidex",
                    "multiDexEnabled true",
                    "defaultConfig {",
                    "\n        multiDexEnabled true",
                ),
            )
            .with_rule(
                PROJECT_GRADLE,
                ReplaceLine::new(
                    "pin_android_gradle_plugin",
                    "com.android.tools.build:gradle:",
                    "        classpath 'com.android.tools.build:gradle:8.1.4'",
                ),
            )
            .with_rule(
                PROJECT_GRADLE,
                ReplaceLine::new(
                    "pin_kotlin_version",
                    "ext.kotlin_version",
                    "    ext.kotlin_version = '1.9.10'",
                ),
            );
        Ok(catalog)
    }
}

fn state_fields() -> Vec<StateField> {
    vec![
        StateField::new("List<ScanResult>", "scanResults").initialized("[]"),
        StateField::new("BluetoothDevice?", "connectedDevice"),
        StateField::new("BluetoothCharacteristic?", "writeCharacteristic"),
        StateField::new("bool", "isScanning").initialized("false"),
        StateField::new("bool", "isConnecting").initialized("false"),
        StateField::new("String", "connectionStatus").initialized("\"Ready to scan\""),
        StateField::new("bool", "permissionsGranted").initialized("false"),
        StateField::new("int", "dataPackets").initialized("0"),
        StateField::new("String", "deviceId").initialized("\"Unknown\""),
    ]
}

fn deprecated_api() -> PatchResult<PatternRewrite> {
    PatternRewrite::new("rewrite_deprecated_api")
        .substitute(r"FlutterBluePlus\.(?:(?:instance|FlutterBluePlus)\.)+", "FlutterBluePlus.")?
        .substitute(r"\bprimary:\s*Colors\.(\w+)", "backgroundColor: Colors.${1}")?
        .substitute(r"\bonPrimary:\s*Colors\.(\w+)", "foregroundColor: Colors.${1}")?
        .substitute(r"\b_devices\b", "scanResults")?
        .substitute(r"Uint8List\.fromList\([^)]+\)", "command.codeUnits")
}

fn manifest_permissions() -> InsertLinesBefore {
    let permission = |name: &str| {
        format!(r#"<uses-permission android:name="android.permission.{}" />"#, name)
    };
    let lines = vec![
        permission("BLUETOOTH"),
        permission("BLUETOOTH_ADMIN"),
        r#"<uses-permission android:name="android.permission.BLUETOOTH_SCAN" android:usesPermissionFlags="neverForLocation" />"#.to_string(),
        permission("BLUETOOTH_CONNECT"),
        permission("ACCESS_FINE_LOCATION"),
        permission("ACCESS_COARSE_LOCATION"),
        r#"<uses-feature android:name="android.hardware.bluetooth" android:required="false" />"#.to_string(),
        r#"<uses-feature android:name="android.hardware.bluetooth_le" android:required="false" />"#.to_string(),
    ];
    InsertLinesBefore::new("declare_bluetooth_permissions", "BLUETOOTH_SCAN", "<application", lines)
}

fn sdk_pins() -> PatchResult<PatternRewrite> {
    PatternRewrite::new("pin_sdk_versions")
        .substitute(r"compileSdkVersion\s+\d+", "compileSdkVersion 34")?
        .substitute(r"targetSdkVersion\s+\d+", "targetSdkVersion 34")?
        .substitute(r"minSdkVersion\s+\d+", "minSdkVersion 21")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_layout() {
        let catalog = PatchCatalog::standard(&Requirements::fallback()).unwrap();
        assert_eq!(
            catalog.targets(),
            [MAIN_DART, PUBSPEC, ANDROID_MANIFEST, APP_GRADLE, PROJECT_GRADLE]
        );
        assert_eq!(
            catalog.group(MAIN_DART).unwrap().rule_names(),
            [
                "rewrite_deprecated_api",
                "ensure_state_fields",
                "ensure_init_state_hook",
                "ensure_imports"
            ]
        );
        assert_eq!(catalog.rule_count(), 10);
    }

    #[test]
    fn test_deprecated_api_rewrites() {
        use crate::rule::Fixup;

        let rule = deprecated_api().unwrap();
        let src = "FlutterBluePlus.instance.FlutterBluePlus.startScan();\n\
                   ElevatedButton.styleFrom(primary: Colors.blue, onPrimary: Colors.white);\n\
                   for (final r in _devices) {}\n\
                   await c.write(Uint8List.fromList(command.codeUnits));";
        let Fixup::Applied(out) = rule.apply(src).unwrap() else {
            panic!("expected rewrites");
        };
        assert_eq!(
            out,
            "FlutterBluePlus.startScan();\n\
             ElevatedButton.styleFrom(backgroundColor: Colors.blue, foregroundColor: Colors.white);\n\
             for (final r in scanResults) {}\n\
             await c.write(command.codeUnits);"
        );
        assert_eq!(rule.apply(&out).unwrap(), Fixup::Unchanged);
    }
}
