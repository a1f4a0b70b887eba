//! Stage orchestrator.
//!
//! Runs the fixed stage sequence against a context, stopping at the first
//! failure. Failures never escape: they end up in the context's error log
//! and the context moves to the `Error` terminal.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;

use futures_util::FutureExt;
use tracing::{error, info, warn};

use crate::context::{GenerationContext, StageId};
use crate::error::CoreError;
use crate::persistence::SessionStore;
use crate::progress::ProgressSnapshot;
use crate::registry::StageRegistry;
use crate::session::SessionHandle;

/// Runs sessions through the registered stages.
pub struct Pipeline {
    registry: Arc<StageRegistry>,
    store: Option<SessionStore>,
}

impl Pipeline {
    /// Create a pipeline over the given registry.
    pub fn new(registry: Arc<StageRegistry>) -> Self {
        Self {
            registry,
            store: None,
        }
    }

    /// Persist every finished context under `state_dir`.
    pub fn with_persistence(mut self, state_dir: impl Into<PathBuf>) -> Self {
        self.store = Some(SessionStore::new(state_dir.into()));
        self
    }

    pub fn registry(&self) -> &StageRegistry {
        &self.registry
    }

    /// Run a context to a terminal state and return it.
    pub async fn run(&self, ctx: GenerationContext) -> GenerationContext {
        self.drive(ctx, |_| {}).await
    }

    /// Run the session behind `handle`, publishing the context into the
    /// handle before and after every stage.
    pub async fn run_session(&self, handle: &SessionHandle) -> ProgressSnapshot {
        let ctx = handle.read().clone();
        let finished = self
            .drive(ctx, |current| {
                *handle.write() = current.clone();
            })
            .await;
        let snapshot = ProgressSnapshot::from(&finished);
        *handle.write() = finished;
        snapshot
    }

    async fn drive<F>(&self, mut ctx: GenerationContext, mut publish: F) -> GenerationContext
    where
        F: FnMut(&GenerationContext),
    {
        info!("Starting session {}", ctx.session_id());

        for (index, stage_id) in StageId::PIPELINE.into_iter().enumerate() {
            if ctx.is_failed() || ctx.is_finished() {
                break;
            }

            let stage = match self.registry.get_required(stage_id) {
                Ok(stage) => stage,
                Err(e) => {
                    error!("{}", e);
                    ctx.fail(e.to_string());
                    publish(&ctx);
                    break;
                }
            };

            if let Err(e) = ctx.enter_stage(stage_id) {
                error!("Cannot enter {}: {}", stage_id, e);
                ctx.fail(e.to_string());
                publish(&ctx);
                break;
            }
            publish(&ctx);

            info!(
                "Executing stage [{}/{}]: {}",
                index + 1,
                StageId::PIPELINE.len(),
                stage_id
            );

            let outcome = AssertUnwindSafe(stage.execute(&mut ctx))
                .catch_unwind()
                .await;

            match outcome {
                Ok(Ok(())) if ctx.is_failed() => {
                    warn!("Stage {} marked the session failed", stage_id);
                }
                Ok(Ok(())) => {
                    if let Err(e) = ctx.complete_stage(stage_id) {
                        ctx.fail(e.attributed_to(stage_id).to_string());
                    }
                }
                Ok(Err(e)) => {
                    let e = e.attributed_to(stage_id);
                    error!("{}", e);
                    ctx.fail(e.to_string());
                }
                Err(panic) => {
                    let e = CoreError::stage_failed(
                        stage_id,
                        format!("panicked: {}", panic_message(panic.as_ref())),
                    );
                    error!("{}", e);
                    ctx.fail(e.to_string());
                }
            }
            publish(&ctx);
        }

        if ctx.is_failed() {
            warn!(
                "Session {} failed at {:?} with {} error(s)",
                ctx.session_id(),
                ctx.stage_history().iter().rev().nth(1),
                ctx.error_log().len()
            );
        } else {
            info!(
                "Session {} completed, artifact at {:?}",
                ctx.session_id(),
                ctx.artifact_path()
            );
        }

        if let Some(store) = &self.store {
            if let Err(e) = store.save(&ctx) {
                warn!("Could not persist session {}: {}", ctx.session_id(), e);
            }
        }

        ctx
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{BuildStatus, UserInput};
    use crate::error::CoreResult;
    use crate::stage::Stage;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingStage {
        id: StageId,
        runs: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Stage for CountingStage {
        fn id(&self) -> StageId {
            self.id
        }

        fn description(&self) -> &str {
            "Counts executions"
        }

        async fn execute(&self, _ctx: &mut GenerationContext) -> CoreResult<()> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingStage(StageId);

    #[async_trait]
    impl Stage for FailingStage {
        fn id(&self) -> StageId {
            self.0
        }

        fn description(&self) -> &str {
            "Always fails"
        }

        async fn execute(&self, _ctx: &mut GenerationContext) -> CoreResult<()> {
            Err(CoreError::InvalidState("nothing to do".to_string()))
        }
    }

    struct PanickingStage(StageId);

    #[async_trait]
    impl Stage for PanickingStage {
        fn id(&self) -> StageId {
            self.0
        }

        fn description(&self) -> &str {
            "Panics"
        }

        async fn execute(&self, _ctx: &mut GenerationContext) -> CoreResult<()> {
            panic!("stage blew up");
        }
    }

    fn counting_registry(runs: &Arc<AtomicUsize>) -> StageRegistry {
        let mut registry = StageRegistry::new();
        for id in StageId::PIPELINE {
            registry.register(Arc::new(CountingStage {
                id,
                runs: Arc::clone(runs),
            }));
        }
        registry
    }

    fn context() -> GenerationContext {
        GenerationContext::new(UserInput::new("weather station").unwrap())
    }

    #[tokio::test]
    async fn test_all_stages_run_once_in_order() {
        let runs = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new(Arc::new(counting_registry(&runs)));

        let ctx = pipeline.run(context()).await;

        assert_eq!(runs.load(Ordering::SeqCst), 7);
        assert_eq!(ctx.stage(), StageId::Completed);
        assert_eq!(ctx.status(), BuildStatus::Completed);
        assert_eq!(ctx.progress(), 100);
        let mut expected = StageId::PIPELINE.to_vec();
        expected.push(StageId::Completed);
        assert_eq!(ctx.stage_history(), expected.as_slice());
    }

    #[tokio::test]
    async fn test_failure_short_circuits() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut registry = counting_registry(&runs);
        registry.register(Arc::new(FailingStage(StageId::Scaffold)));

        let ctx = Pipeline::new(Arc::new(registry)).run(context()).await;

        assert_eq!(runs.load(Ordering::SeqCst), 2);
        assert_eq!(ctx.stage(), StageId::Error);
        assert_eq!(ctx.status(), BuildStatus::Failed);
        assert_eq!(ctx.progress(), 50);
        assert_eq!(ctx.error_log().len(), 1);
        assert!(ctx.error_log()[0].starts_with("scaffold stage failed"));
    }

    #[tokio::test]
    async fn test_missing_stage_is_failure() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut registry = counting_registry(&runs);
        registry.unregister(StageId::Patch);

        let ctx = Pipeline::new(Arc::new(registry)).run(context()).await;

        assert_eq!(runs.load(Ordering::SeqCst), 4);
        assert!(ctx.is_failed());
        assert!(ctx.error_log()[0].contains("patch"));
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut registry = counting_registry(&runs);
        registry.register(Arc::new(PanickingStage(StageId::Classify)));

        let ctx = Pipeline::new(Arc::new(registry)).run(context()).await;

        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert!(ctx.is_failed());
        assert!(ctx.error_log()[0].contains("stage blew up"));
    }

    #[tokio::test]
    async fn test_run_session_publishes_and_persists() {
        let runs = Arc::new(AtomicUsize::new(0));
        let temp = tempfile::tempdir().unwrap();
        let pipeline =
            Pipeline::new(Arc::new(counting_registry(&runs))).with_persistence(temp.path());

        let registry = crate::session::SessionRegistry::new();
        let handle = registry.create(UserInput::new("doorbell").unwrap());
        let id = handle.read().session_id().to_string();

        let snapshot = pipeline.run_session(&handle).await;

        assert_eq!(snapshot.status, "completed");
        assert_eq!(registry.snapshot(&id).unwrap(), snapshot);
        let stored = SessionStore::new(temp.path()).load(&id).unwrap();
        assert_eq!(stored.progress(), 100);
    }
}
