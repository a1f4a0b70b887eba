//! Stage registry for managing stage implementations.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::context::StageId;
use crate::error::{CoreError, CoreResult};
use crate::stage::Stage;

/// Maps pipeline positions to stage implementations.
#[derive(Default)]
pub struct StageRegistry {
    stages: HashMap<StageId, Arc<dyn Stage>>,
}

impl StageRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            stages: HashMap::new(),
        }
    }

    /// Register a stage under its own id, replacing any previous one.
    pub fn register(&mut self, stage: Arc<dyn Stage>) {
        let id = stage.id();
        debug!("Registering stage: {}", id);
        self.stages.insert(id, stage);
    }

    /// Register a stage under a different id.
    pub fn register_as(&mut self, id: StageId, stage: Arc<dyn Stage>) {
        debug!("Registering stage as: {}", id);
        self.stages.insert(id, stage);
    }

    pub fn get(&self, id: StageId) -> Option<Arc<dyn Stage>> {
        self.stages.get(&id).cloned()
    }

    /// Get a stage, returning an error if none is registered.
    pub fn get_required(&self, id: StageId) -> CoreResult<Arc<dyn Stage>> {
        self.get(id).ok_or(CoreError::StageNotRegistered(id))
    }

    pub fn contains(&self, id: StageId) -> bool {
        self.stages.contains_key(&id)
    }

    /// Registered ids in pipeline order.
    pub fn ids(&self) -> Vec<StageId> {
        let mut ids: Vec<_> = self.stages.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Pipeline stages that have no implementation.
    pub fn missing(&self) -> Vec<StageId> {
        StageId::PIPELINE
            .into_iter()
            .filter(|id| !self.contains(*id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn unregister(&mut self, id: StageId) -> Option<Arc<dyn Stage>> {
        debug!("Unregistering stage: {}", id);
        self.stages.remove(&id)
    }
}

impl std::fmt::Debug for StageRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageRegistry")
            .field("stages", &self.ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::GenerationContext;
    use async_trait::async_trait;

    struct TestStage {
        id: StageId,
    }

    #[async_trait]
    impl Stage for TestStage {
        fn id(&self) -> StageId {
            self.id
        }

        fn description(&self) -> &str {
            "Test stage"
        }

        async fn execute(&self, _ctx: &mut GenerationContext) -> CoreResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_registry_register() {
        let mut registry = StageRegistry::new();
        assert!(registry.is_empty());

        registry.register(Arc::new(TestStage { id: StageId::Patch }));

        assert_eq!(registry.len(), 1);
        assert!(registry.contains(StageId::Patch));
        assert_eq!(registry.get(StageId::Patch).unwrap().id(), StageId::Patch);
    }

    #[test]
    fn test_registry_missing_is_error() {
        let registry = StageRegistry::new();
        assert!(matches!(
            registry.get_required(StageId::Build),
            Err(CoreError::StageNotRegistered(StageId::Build))
        ));
        assert_eq!(registry.missing().len(), 7);
    }

    #[test]
    fn test_registry_ids_sorted() {
        let mut registry = StageRegistry::new();
        registry.register(Arc::new(TestStage { id: StageId::Build }));
        registry.register(Arc::new(TestStage { id: StageId::Classify }));
        registry.register_as(StageId::Patch, Arc::new(TestStage { id: StageId::Build }));

        assert_eq!(
            registry.ids(),
            vec![StageId::Classify, StageId::Patch, StageId::Build]
        );

        registry.unregister(StageId::Patch);
        assert!(!registry.contains(StageId::Patch));
    }
}
