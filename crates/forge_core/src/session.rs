//! Session registry shared between the orchestrator and pollers.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::context::{GenerationContext, UserInput};
use crate::error::{CoreError, CoreResult};
use crate::progress::ProgressSnapshot;

/// Shared handle to one session's context.
pub type SessionHandle = Arc<RwLock<GenerationContext>>;

/// Concurrency-safe map of session id to context handle.
///
/// Each entry has a single writer: the pipeline running that session.
/// Everyone else only reads snapshots.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session for `input` and return its handle.
    pub fn create(&self, input: UserInput) -> SessionHandle {
        self.insert(GenerationContext::new(input))
    }

    /// Register an existing context.
    pub fn insert(&self, ctx: GenerationContext) -> SessionHandle {
        let id = ctx.session_id().to_string();
        let handle = Arc::new(RwLock::new(ctx));
        debug!("Registering session {}", id);
        self.sessions.write().insert(id, Arc::clone(&handle));
        handle
    }

    pub fn get(&self, session_id: &str) -> Option<SessionHandle> {
        self.sessions.read().get(session_id).cloned()
    }

    pub fn get_required(&self, session_id: &str) -> CoreResult<SessionHandle> {
        self.get(session_id)
            .ok_or_else(|| CoreError::SessionNotFound(session_id.to_string()))
    }

    pub fn remove(&self, session_id: &str) -> Option<SessionHandle> {
        debug!("Removing session {}", session_id);
        self.sessions.write().remove(session_id)
    }

    /// Current progress of a session.
    pub fn snapshot(&self, session_id: &str) -> CoreResult<ProgressSnapshot> {
        let handle = self.get_required(session_id)?;
        let ctx = handle.read();
        Ok(ProgressSnapshot::from(&*ctx))
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.sessions.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("sessions", &self.ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_get_remove() {
        let registry = SessionRegistry::new();
        let handle = registry.create(UserInput::new("led strip").unwrap());
        let id = handle.read().session_id().to_string();

        assert_eq!(registry.len(), 1);
        assert!(registry.get(&id).is_some());
        assert_eq!(registry.snapshot(&id).unwrap().status, "pending");

        assert!(registry.remove(&id).is_some());
        assert!(registry.is_empty());
        assert!(matches!(
            registry.snapshot(&id),
            Err(CoreError::SessionNotFound(_))
        ));
    }

    #[test]
    fn test_sessions_are_independent() {
        let registry = SessionRegistry::new();
        let a = registry.create(UserInput::new("a").unwrap());
        let b = registry.create(UserInput::new("b").unwrap());

        a.write().add_warning("only a");
        assert_eq!(a.read().warnings().len(), 1);
        assert!(b.read().warnings().is_empty());
        assert_ne!(a.read().session_id(), b.read().session_id());
    }
}
