//! On-disk session records.
//!
//! Finished contexts are written as JSON under `<state_dir>/sessions/` so a
//! separate process can report on them.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::context::GenerationContext;
use crate::error::{CoreError, CoreResult};

/// JSON store of session contexts.
#[derive(Debug, Clone)]
pub struct SessionStore {
    root: PathBuf,
}

impl SessionStore {
    /// Create a store rooted at `state_dir`.
    pub fn new(state_dir: impl AsRef<Path>) -> Self {
        Self {
            root: state_dir.as_ref().join("sessions"),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the record for `session_id`.
    pub fn path_for(&self, session_id: &str) -> CoreResult<PathBuf> {
        let valid = !session_id.is_empty()
            && session_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(CoreError::InvalidInput(format!(
                "invalid session id: {:?}",
                session_id
            )));
        }
        Ok(self.root.join(format!("{}.json", session_id)))
    }

    /// Save a context, replacing any earlier record.
    pub fn save(&self, ctx: &GenerationContext) -> CoreResult<PathBuf> {
        let path = self.path_for(ctx.session_id())?;
        fs::create_dir_all(&self.root)?;
        let json = serde_json::to_string_pretty(ctx)
            .map_err(|e| CoreError::Serialization(e.to_string()))?;
        fs::write(&path, json)?;
        debug!("Saved session record to {:?}", path);
        Ok(path)
    }

    /// Load a saved context.
    pub fn load(&self, session_id: &str) -> CoreResult<GenerationContext> {
        let path = self.path_for(session_id)?;
        if !path.exists() {
            return Err(CoreError::SessionNotFound(session_id.to_string()));
        }
        let content = fs::read_to_string(&path)?;
        serde_json::from_str(&content).map_err(|e| CoreError::Serialization(e.to_string()))
    }

    /// Ids of all saved sessions, sorted.
    pub fn list(&self) -> CoreResult<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(stem.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{StageId, UserInput};
    use tempfile::tempdir;

    #[test]
    fn test_save_and_load() {
        let temp = tempdir().unwrap();
        let store = SessionStore::new(temp.path());

        let mut ctx = GenerationContext::new(UserInput::new("garage door").unwrap());
        ctx.enter_stage(StageId::Classify).unwrap();
        ctx.fail("classifier offline");

        let path = store.save(&ctx).unwrap();
        assert!(path.starts_with(temp.path().join("sessions")));

        let loaded = store.load(ctx.session_id()).unwrap();
        assert_eq!(loaded.session_id(), ctx.session_id());
        assert_eq!(loaded.error_log(), ctx.error_log());
        assert_eq!(loaded.stage(), StageId::Error);
        assert_eq!(store.list().unwrap(), vec![ctx.session_id().to_string()]);
    }

    #[test]
    fn test_rejects_path_like_ids() {
        let temp = tempdir().unwrap();
        let store = SessionStore::new(temp.path());
        assert!(store.path_for("../etc/passwd").is_err());
        assert!(matches!(
            store.load("0000"),
            Err(CoreError::SessionNotFound(_))
        ));
    }
}
