//! Pattern substitutions and whole-line replacements.

use regex::Regex;
use tracing::debug;

use crate::error::{PatchError, PatchResult};
use crate::rule::{Fixup, PatchRule};

/// Applies a list of regex substitutions in order.
///
/// Each replacement must not itself match its pattern; that is what keeps
/// the rule idempotent.
#[derive(Debug, Clone)]
pub struct PatternRewrite {
    name: String,
    substitutions: Vec<(Regex, String)>,
}

impl PatternRewrite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            substitutions: Vec::new(),
        }
    }

    /// Add a substitution. `replacement` may reference capture groups as `${1}`.
    pub fn substitute(
        mut self,
        pattern: &str,
        replacement: impl Into<String>,
    ) -> PatchResult<Self> {
        let regex = Regex::new(pattern).map_err(|e| PatchError::invalid_rule(&self.name, e))?;
        self.substitutions.push((regex, replacement.into()));
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.substitutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.substitutions.is_empty()
    }
}

impl PatchRule for PatternRewrite {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, content: &str) -> PatchResult<Fixup> {
        let mut patched = content.to_string();
        for (regex, replacement) in &self.substitutions {
            if regex.is_match(&patched) {
                debug!("{}: rewriting /{}/", self.name, regex.as_str());
                patched = regex.replace_all(&patched, replacement.as_str()).into_owned();
            }
        }
        Ok(Fixup::compare(content, patched))
    }
}

/// Replaces every line containing `needle` with `line`.
#[derive(Debug, Clone)]
pub struct ReplaceLine {
    name: String,
    needle: String,
    line: String,
}

impl ReplaceLine {
    pub fn new(
        name: impl Into<String>,
        needle: impl Into<String>,
        line: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            needle: needle.into(),
            line: line.into(),
        }
    }
}

impl PatchRule for ReplaceLine {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, content: &str) -> PatchResult<Fixup> {
        if !content.contains(&self.needle) {
            return Ok(Fixup::Unchanged);
        }

        let mut patched = String::with_capacity(content.len());
        for segment in content.split_inclusive('\n') {
            let (body, ending) = match segment.strip_suffix('\n') {
                Some(body) => (body, "\n"),
                None => (segment, ""),
            };
            if body.contains(&self.needle) {
                patched.push_str(&self.line);
            } else {
                patched.push_str(body);
            }
            patched.push_str(ending);
        }
        Ok(Fixup::compare(content, patched))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sdk_pins() {
        let rule = PatternRewrite::new("pin_sdk_versions")
            .substitute(r"compileSdkVersion\s+\d+", "compileSdkVersion 34")
            .unwrap()
            .substitute(r"minSdkVersion\s+\d+", "minSdkVersion 21")
            .unwrap();

        let gradle = "android {\n    compileSdkVersion 31\n    defaultConfig {\n        minSdkVersion 16\n    }\n}\n";
        let Fixup::Applied(patched) = rule.apply(gradle).unwrap() else {
            panic!("expected a rewrite");
        };
        assert!(patched.contains("compileSdkVersion 34"));
        assert!(patched.contains("minSdkVersion 21"));
        assert_eq!(rule.apply(&patched).unwrap(), Fixup::Unchanged);
    }

    #[test]
    fn test_capture_groups() {
        let rule = PatternRewrite::new("button_style")
            .substitute(r"\bprimary:\s*Colors\.(\w+)", "backgroundColor: Colors.${1}")
            .unwrap();
        let out = rule.apply("style: ElevatedButton.styleFrom(primary: Colors.blue)").unwrap();
        assert_eq!(
            out,
            Fixup::Applied("style: ElevatedButton.styleFrom(backgroundColor: Colors.blue)".into())
        );
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(matches!(
            PatternRewrite::new("broken").substitute("(unclosed", ""),
            Err(PatchError::InvalidRule { .. })
        ));
    }

    #[test]
    fn test_replace_line_keeps_other_lines() {
        let rule = ReplaceLine::new(
            "pin_kotlin",
            "ext.kotlin_version",
            "    ext.kotlin_version = '1.9.10'",
        );
        let input = "buildscript {\n  ext.kotlin_version = '1.7.10'\n  repositories {}\n}";
        let Fixup::Applied(patched) = rule.apply(input).unwrap() else {
            panic!("expected a rewrite");
        };
        assert_eq!(
            patched,
            "buildscript {\n    ext.kotlin_version = '1.9.10'\n  repositories {}\n}"
        );
        assert_eq!(rule.apply(&patched).unwrap(), Fixup::Unchanged);
        assert_eq!(rule.apply("plugins {}\n").unwrap(), Fixup::Unchanged);
    }
}
