//! Marker-guarded insertions relative to an anchor.

use tracing::debug;

use crate::error::PatchResult;
use crate::rule::{Fixup, PatchRule};

/// Inserts whole lines directly above the first line containing `anchor`,
/// unless `marker` already appears in the file.
#[derive(Debug, Clone)]
pub struct InsertLinesBefore {
    name: String,
    marker: String,
    anchor: String,
    lines: Vec<String>,
    indent: String,
}

impl InsertLinesBefore {
    pub fn new(
        name: impl Into<String>,
        marker: impl Into<String>,
        anchor: impl Into<String>,
        lines: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            marker: marker.into(),
            anchor: anchor.into(),
            lines,
            indent: "    ".to_string(),
        }
    }

    pub fn with_indent(mut self, indent: impl Into<String>) -> Self {
        self.indent = indent.into();
        self
    }
}

impl PatchRule for InsertLinesBefore {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, content: &str) -> PatchResult<Fixup> {
        if content.contains(&self.marker) {
            return Ok(Fixup::Unchanged);
        }
        let Some(anchor_at) = content.find(&self.anchor) else {
            return Ok(Fixup::Skipped(format!("anchor '{}' not found", self.anchor)));
        };

        let line_start = content[..anchor_at].rfind('\n').map(|i| i + 1).unwrap_or(0);
        let mut block = String::new();
        for line in &self.lines {
            block.push_str(&self.indent);
            block.push_str(line);
            block.push('\n');
        }
        block.push('\n');

        debug!("{}: inserting {} line(s) before '{}'", self.name, self.lines.len(), self.anchor);
        let mut patched = String::with_capacity(content.len() + block.len());
        patched.push_str(&content[..line_start]);
        patched.push_str(&block);
        patched.push_str(&content[line_start..]);
        Ok(Fixup::Applied(patched))
    }
}

/// Inserts `text` immediately after the first occurrence of `anchor`,
/// unless `marker` already appears in the file.
#[derive(Debug, Clone)]
pub struct InsertAfterAnchor {
    name: String,
    marker: String,
    anchor: String,
    text: String,
}

impl InsertAfterAnchor {
    pub fn new(
        name: impl Into<String>,
        marker: impl Into<String>,
        anchor: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            marker: marker.into(),
            anchor: anchor.into(),
            text: text.into(),
        }
    }
}

impl PatchRule for InsertAfterAnchor {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, content: &str) -> PatchResult<Fixup> {
        if content.contains(&self.marker) {
            return Ok(Fixup::Unchanged);
        }
        let Some(anchor_at) = content.find(&self.anchor) else {
            return Ok(Fixup::Skipped(format!("anchor '{}' not found", self.anchor)));
        };

        let split = anchor_at + self.anchor.len();
        let mut patched = String::with_capacity(content.len() + self.text.len());
        patched.push_str(&content[..split]);
        patched.push_str(&self.text);
        patched.push_str(&content[split..]);
        Ok(Fixup::Applied(patched))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
    <application android:label="demo">
    </application>
</manifest>
"#;

    fn permissions() -> InsertLinesBefore {
        InsertLinesBefore::new(
            "manifest_permissions",
            "BLUETOOTH_SCAN",
            "<application",
            vec![
                r#"<uses-permission android:name="android.permission.BLUETOOTH" />"#.to_string(),
                r#"<uses-permission android:name="android.permission.BLUETOOTH_SCAN" />"#.to_string(),
            ],
        )
    }

    #[test]
    fn test_lines_inserted_once_before_anchor() {
        let Fixup::Applied(patched) = permissions().apply(MANIFEST).unwrap() else {
            panic!("expected insertion");
        };
        let scan = patched.find("BLUETOOTH_SCAN").unwrap();
        assert!(scan < patched.find("<application").unwrap());
        assert!(patched.contains(
            "    <uses-permission android:name=\"android.permission.BLUETOOTH\" />\n"
        ));
        assert_eq!(permissions().apply(&patched).unwrap(), Fixup::Unchanged);
    }

    #[test]
    fn test_missing_anchor_is_skipped() {
        let out = permissions().apply("<manifest></manifest>").unwrap();
        assert!(matches!(out, Fixup::Skipped(reason) if reason.contains("<application")));
    }

    #[test]
    fn test_insert_after_anchor() {
        let rule = InsertAfterAnchor::new(
            "multidex",
            "multiDexEnabled true",
            "defaultConfig {",
            "\n        multiDexEnabled true",
        );
        let gradle = "android {\n    defaultConfig {\n        minSdkVersion 21\n    }\n}";
        let Fixup::Applied(patched) = rule.apply(gradle).unwrap() else {
            panic!("expected insertion");
        };
        assert!(
            patched.contains("defaultConfig {\n        multiDexEnabled true\n        minSdkVersion 21")
        );
        assert_eq!(rule.apply(&patched).unwrap(), Fixup::Unchanged);
    }
}
