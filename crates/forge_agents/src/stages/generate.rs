use std::fs;
use std::path::{Component, Path};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use forge_core::{CoreError, CoreResult, GenerationContext, Stage, StageId};

use super::{architecture, failed, project_path, requirements};
use crate::generator::MAIN_DART;
use crate::traits::CodeGenerator;

/// Asks the generator for sources and writes them into the project.
pub struct GenerateStage {
    generator: Arc<dyn CodeGenerator>,
}

impl GenerateStage {
    pub fn new(generator: Arc<dyn CodeGenerator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl Stage for GenerateStage {
    fn id(&self) -> StageId {
        StageId::Generate
    }

    fn description(&self) -> &str {
        "Generate application sources"
    }

    async fn execute(&self, ctx: &mut GenerationContext) -> CoreResult<()> {
        let requirements = requirements(ctx, StageId::Generate)?;
        let architecture = architecture(ctx, StageId::Generate)?;
        let hardware_commands = ctx.user_input().hardware_commands.clone().unwrap_or_default();

        let sources = self
            .generator
            .generate(&requirements, &architecture, &hardware_commands)
            .await
            .map_err(failed(StageId::Generate))?;

        if !sources.contains_key(MAIN_DART) {
            return Err(CoreError::stage_failed(
                StageId::Generate,
                format!("generator produced no {}", MAIN_DART),
            ));
        }

        let project = project_path(ctx, StageId::Generate)?.to_path_buf();
        if let Some(escaping) = sources.keys().find(|path| !is_project_relative(path)) {
            return Err(CoreError::stage_failed(
                StageId::Generate,
                format!("refusing to write outside the project: {}", escaping),
            ));
        }
        for (relative, content) in &sources {
            let target = project.join(relative);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(failed(StageId::Generate))?;
            }
            fs::write(&target, content).map_err(failed(StageId::Generate))?;
            debug!("Wrote {} ({} bytes)", relative, content.len());
        }

        info!("Generated {} source file(s)", sources.len());
        ctx.set_sources(sources)
    }
}

fn is_project_relative(path: &str) -> bool {
    !path.is_empty()
        && !path.contains('\\')
        && Path::new(path)
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    use crate::traits::MockCodeGenerator;
    use forge_core::UserInput;
    use forge_spec::{Architecture, Requirements, StructureNode};
    use tempfile::TempDir;

    fn context(temp: &TempDir) -> GenerationContext {
        let input = UserInput::new("relay")
            .unwrap()
            .with_hardware_commands("button \"On\": sends \"1\"");
        let mut ctx = GenerationContext::new(input);
        let workspace = temp.path().to_path_buf();
        let project = workspace.join("relay");
        fs::create_dir_all(&project).unwrap();

        ctx.enter_stage(StageId::Classify).unwrap();
        ctx.set_requirements(Requirements::new("Relay", "relay")).unwrap();
        ctx.complete_stage(StageId::Classify).unwrap();
        ctx.enter_stage(StageId::Architect).unwrap();
        ctx.set_architecture(Architecture {
            project_structure: StructureNode::empty_dir(),
            dependencies: BTreeMap::new(),
            dev_dependencies: BTreeMap::new(),
            main_features: Vec::new(),
            file_templates: BTreeMap::new(),
        })
        .unwrap();
        ctx.complete_stage(StageId::Architect).unwrap();
        ctx.enter_stage(StageId::Scaffold).unwrap();
        ctx.set_workspace(workspace, project).unwrap();
        ctx.complete_stage(StageId::Scaffold).unwrap();
        ctx.enter_stage(StageId::Generate).unwrap();
        ctx
    }

    fn stage(files: &'static [(&'static str, &'static str)]) -> GenerateStage {
        let mut generator = MockCodeGenerator::new();
        generator
            .expect_generate()
            .withf(|_, _, commands| commands.contains("sends \"1\""))
            .times(1)
            .returning(move |_, _, _| {
                Ok(files
                    .iter()
                    .map(|(path, content)| (path.to_string(), content.to_string()))
                    .collect())
            });
        GenerateStage::new(Arc::new(generator))
    }

    #[tokio::test]
    async fn test_sources_written_and_recorded() {
        let temp = TempDir::new().unwrap();
        let mut ctx = context(&temp);
        let stage = stage(&[
            ("lib/main.dart", "void main() {}"),
            ("lib/widgets/card.dart", "// card"),
        ]);
        stage.execute(&mut ctx).await.unwrap();

        let project: PathBuf = ctx.project_path().unwrap().to_path_buf();
        assert_eq!(fs::read_to_string(project.join("lib/main.dart")).unwrap(), "void main() {}");
        assert!(project.join("lib/widgets/card.dart").is_file());
        assert_eq!(ctx.sources().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_entry_point_fails() {
        let temp = TempDir::new().unwrap();
        let mut ctx = context(&temp);
        let err = stage(&[("lib/other.dart", "")]).execute(&mut ctx).await.unwrap_err();

        assert!(err.to_string().contains("lib/main.dart"));
        assert!(ctx.sources().is_empty());
    }

    #[tokio::test]
    async fn test_escaping_path_rejected() {
        let temp = TempDir::new().unwrap();
        let mut ctx = context(&temp);
        let err = stage(&[("lib/main.dart", "void main() {}"), ("lib/../../evil.dart", "")])
            .execute(&mut ctx)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("outside the project"));
        assert!(!temp.path().join("evil.dart").exists());
        assert!(!ctx.project_path().unwrap().join("lib/main.dart").exists());
    }

    #[test]
    fn test_is_project_relative() {
        assert!(is_project_relative("lib/main.dart"));
        assert!(!is_project_relative("/etc/passwd"));
        assert!(!is_project_relative("lib/../../x"));
        assert!(!is_project_relative("lib\\main.dart"));
        assert!(!is_project_relative(""));
    }
}
