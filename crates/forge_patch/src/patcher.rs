//! Applies a rule catalog to a project on disk.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::catalog::{PatchCatalog, RuleGroup};
use crate::error::{PatchError, PatchResult};
use crate::rule::{Fixup, PatchWarning};

/// What happened to one target file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub target: String,
    pub applied: Vec<String>,
    pub unchanged: Vec<String>,
    pub warnings: Vec<PatchWarning>,
    pub missing: bool,
}

impl FileReport {
    fn new(target: &str) -> Self {
        Self {
            target: target.to_string(),
            ..Self::default()
        }
    }
}

/// Result of one patch pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PatchReport {
    pub files: Vec<FileReport>,
    /// New content of every file that changed, keyed by relative path
    #[serde(skip)]
    pub changed: BTreeMap<String, String>,
}

impl PatchReport {
    /// `target:rule` for every rule that changed something.
    pub fn applied(&self) -> Vec<String> {
        self.files
            .iter()
            .flat_map(|f| f.applied.iter().map(move |rule| format!("{}:{}", f.target, rule)))
            .collect()
    }

    pub fn unchanged(&self) -> Vec<String> {
        self.files
            .iter()
            .flat_map(|f| f.unchanged.iter().map(move |rule| format!("{}:{}", f.target, rule)))
            .collect()
    }

    pub fn warnings(&self) -> Vec<&PatchWarning> {
        self.files.iter().flat_map(|f| f.warnings.iter()).collect()
    }

    /// True when no rule had anything to do.
    pub fn is_noop(&self) -> bool {
        self.changed.is_empty()
    }
}

/// Runs every rule group against its target under a project root.
#[derive(Debug)]
pub struct SourcePatcher {
    catalog: PatchCatalog,
}

impl SourcePatcher {
    pub fn new(catalog: PatchCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &PatchCatalog {
        &self.catalog
    }

    /// Patch in-memory content as if it were `target`. Targets without a
    /// rule group are returned untouched.
    pub fn patch_content(&self, target: &str, content: &str) -> PatchResult<(String, FileReport)> {
        match self.catalog.group(target) {
            Some(group) => Self::apply_group(group, content),
            None => Ok((content.to_string(), FileReport::new(target))),
        }
    }

    fn apply_group(group: &RuleGroup, content: &str) -> PatchResult<(String, FileReport)> {
        let mut report = FileReport::new(&group.target);
        let mut current = content.to_string();

        for rule in &group.rules {
            match rule.apply(&current)? {
                Fixup::Applied(patched) => {
                    debug!("{}: applied {}", group.target, rule.name());
                    report.applied.push(rule.name().to_string());
                    current = patched;
                }
                Fixup::Unchanged => report.unchanged.push(rule.name().to_string()),
                Fixup::Skipped(reason) => {
                    let warning = PatchWarning::skipped(&group.target, rule.name(), reason);
                    warn!("{}", warning);
                    report.warnings.push(warning);
                }
            }
        }
        Ok((current, report))
    }

    /// Patch every catalog target under `project_dir`, writing back files
    /// that changed. Missing targets produce warnings.
    ///
    /// Nothing is written unless every group patched cleanly.
    pub fn patch_project(&self, project_dir: &Path) -> PatchResult<PatchReport> {
        let mut report = PatchReport::default();
        let mut pending = Vec::new();

        for group in self.catalog.groups() {
            let path = project_dir.join(&group.target);
            if !path.is_file() {
                let warning = PatchWarning::missing_target(&group.target);
                warn!("{}", warning);
                report.files.push(FileReport {
                    warnings: vec![warning],
                    missing: true,
                    ..FileReport::new(&group.target)
                });
                continue;
            }

            let original = fs::read_to_string(&path).map_err(|e| PatchError::io(&path, e))?;
            let (patched, file_report) = Self::apply_group(group, &original)?;
            if patched != original {
                pending.push((path, group.target.clone(), patched));
            }
            report.files.push(file_report);
        }

        for (path, target, patched) in pending {
            fs::write(&path, &patched).map_err(|e| PatchError::io(&path, e))?;
            report.changed.insert(target, patched);
        }

        info!(
            "Patched {} file(s): {} fixup(s) applied, {} warning(s)",
            report.changed.len(),
            report.applied().len(),
            report.warnings().len()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pubspec::NormalizeDependencyManifest;
    use crate::rules::InsertAfterAnchor;
    use tempfile::tempdir;

    fn patcher() -> SourcePatcher {
        SourcePatcher::new(PatchCatalog::new().with_rule(
            "notes.txt",
            InsertAfterAnchor::new("stamp", "[stamped]", "# notes", " [stamped]"),
        ))
    }

    #[test]
    fn test_patch_project_writes_changes() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("notes.txt"), "# notes\nbody\n").unwrap();

        let report = patcher().patch_project(temp.path()).unwrap();
        assert_eq!(report.applied(), ["notes.txt:stamp"]);
        assert_eq!(
            fs::read_to_string(temp.path().join("notes.txt")).unwrap(),
            "# notes [stamped]\nbody\n"
        );
        assert_eq!(report.changed["notes.txt"], "# notes [stamped]\nbody\n");

        let again = patcher().patch_project(temp.path()).unwrap();
        assert!(again.is_noop());
        assert_eq!(again.unchanged(), ["notes.txt:stamp"]);
    }

    #[test]
    fn test_missing_target_is_a_warning() {
        let temp = tempdir().unwrap();
        let report = patcher().patch_project(temp.path()).unwrap();
        assert!(report.files[0].missing);
        assert_eq!(report.warnings().len(), 1);
        assert_eq!(
            report.warnings()[0].to_string(),
            "PatchWarning: notes.txt: file not found, fixups skipped"
        );
    }

    #[test]
    fn test_failing_group_leaves_earlier_files_untouched() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("notes.txt"), "# notes\n").unwrap();
        fs::write(temp.path().join("pubspec.yaml"), "dependencies: [\n").unwrap();

        let patcher = SourcePatcher::new(
            PatchCatalog::new()
                .with_rule(
                    "notes.txt",
                    InsertAfterAnchor::new("stamp", "[stamped]", "# notes", " [stamped]"),
                )
                .with_rule("pubspec.yaml", NormalizeDependencyManifest::new()),
        );
        assert!(patcher.patch_project(temp.path()).is_err());
        assert_eq!(fs::read_to_string(temp.path().join("notes.txt")).unwrap(), "# notes\n");
    }

    #[test]
    fn test_skipped_anchor_is_recorded() {
        let (out, report) = patcher().patch_content("notes.txt", "no heading").unwrap();
        assert_eq!(out, "no heading");
        assert_eq!(report.warnings[0].rule.as_deref(), Some("stamp"));
    }

    #[test]
    fn test_untargeted_content_is_untouched() {
        let (out, report) = patcher().patch_content("lib/other.dart", "x").unwrap();
        assert_eq!(out, "x");
        assert!(report.applied.is_empty());
    }
}
