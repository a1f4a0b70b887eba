//! End-to-end pipeline runs against the mock toolchain.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;

use forge_agents::{
    create_pipeline, AgentResult, CodeGenerator, Collaborators, TemplateGenerator, MAIN_DART,
};
use forge_build::{artifact_file_name, ARTIFACT_CANDIDATES};
use forge_core::{
    BuildStatus, ForgeConfig, GenerationContext, RetrySettings, SessionStore, StageId, UserInput,
};
use forge_runner::{MockResponse, MockRunner};
use forge_spec::{Architecture, Requirements};

fn config(root: &Path) -> ForgeConfig {
    ForgeConfig {
        temp_root: root.join("work"),
        output_dir: root.join("out"),
        state_dir: root.join("state"),
        dependency: RetrySettings {
            backoff_ms: 0,
            ..RetrySettings::dependency_default()
        },
        compile: RetrySettings {
            backoff_ms: 0,
            ..RetrySettings::compile_default()
        },
        ..ForgeConfig::default()
    }
}

fn lamp_input() -> UserInput {
    UserInput::new("Smart lamp")
        .unwrap()
        .with_hardware_commands("button \"Turn On\": sends \"LAMP_ON\"\nbutton \"Turn Off\": sends \"LAMP_OFF\"")
}

/// `flutter create` leaves a project directory behind.
fn scaffolding_runner() -> MockRunner {
    MockRunner::new().respond_to(
        "create --project-name",
        vec![MockResponse::success("All done!").creates_dir("smart_lamp/lib")],
    )
}

async fn run(
    config: &ForgeConfig,
    runner: MockRunner,
    collaborators: Collaborators,
) -> GenerationContext {
    fs::create_dir_all(&config.temp_root).unwrap();
    let pipeline = create_pipeline(config, Arc::new(runner), collaborators);
    pipeline.run(GenerationContext::new(lamp_input())).await
}

/// A prompt goes all the way to a published, session-named APK.
#[tokio::test]
async fn test_prompt_to_published_apk() {
    let temp = TempDir::new().unwrap();
    let config = config(temp.path());
    let runner = scaffolding_runner().respond_to(
        "build apk",
        vec![MockResponse::success("Built").creates_file(ARTIFACT_CANDIDATES[0])],
    );

    let ctx = run(&config, runner.clone(), Collaborators::builtin()).await;

    assert_eq!(ctx.status(), BuildStatus::Completed, "{:?}", ctx.error_log());
    assert_eq!(ctx.progress(), 100);
    assert_eq!(ctx.stage_history().last(), Some(&StageId::Publish));

    let artifact = ctx.artifact_path().unwrap();
    assert!(artifact.is_file());
    assert_eq!(artifact.parent(), Some(config.output_dir.as_path()));
    assert_eq!(
        artifact.file_name().unwrap().to_str().unwrap(),
        artifact_file_name("Smart Lamp", ctx.session_id())
    );

    let workspace = ctx.workspace_path().unwrap();
    assert!(workspace.starts_with(&config.temp_root));
    assert!(workspace
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("forge_app_"));

    let main = &ctx.sources()[MAIN_DART];
    assert!(main.contains("commandButton('Turn On', 'LAMP_ON'"));
    assert_eq!(
        fs::read_to_string(ctx.project_path().unwrap().join(MAIN_DART)).unwrap(),
        *main
    );

    let report = ctx.build_report().unwrap();
    assert_eq!(report.dependency_attempts, 1);
    assert_eq!(report.compile_attempts, 1);

    // The mock project has no manifest or Gradle files.
    assert!(ctx
        .warnings()
        .iter()
        .any(|w| w.starts_with("PatchWarning: pubspec.yaml")));
    assert!(ctx.error_log().is_empty());

    assert!(runner.command_lines()[0].starts_with("create --project-name smart_lamp"));

    let stored = SessionStore::new(&config.state_dir).load(ctx.session_id()).unwrap();
    assert_eq!(stored.status(), BuildStatus::Completed);
}

/// A compile that never succeeds stops the session before Publish.
#[tokio::test]
async fn test_compile_failure_stops_before_publish() {
    let temp = TempDir::new().unwrap();
    let config = config(temp.path());
    let runner = scaffolding_runner().respond_to(
        "build apk",
        vec![MockResponse::failure(1, "Execution failed for task ':app:compileReleaseKotlin'")],
    );

    let ctx = run(&config, runner.clone(), Collaborators::builtin()).await;

    assert_eq!(ctx.status(), BuildStatus::Failed);
    assert_eq!(ctx.progress(), 85);
    assert!(!ctx.stage_history().contains(&StageId::Publish));
    assert_eq!(ctx.error_log().len(), 1);
    assert!(ctx.error_log()[0].starts_with("build stage failed: "));
    assert!(ctx.artifact_path().is_none());
    assert!(!config.output_dir.exists());

    let report = ctx.build_report().unwrap();
    assert_eq!(report.compile_attempts, 2);
    assert_eq!(report.attempt_log.len(), 3);
    assert_eq!(runner.calls_matching("clean").len(), 1);
}

/// A failing `flutter create` fails Scaffold; the workspace is still recorded.
#[tokio::test]
async fn test_scaffold_failure_records_workspace() {
    let temp = TempDir::new().unwrap();
    let config = config(temp.path());
    let runner = MockRunner::new().respond_to(
        "create --project-name",
        vec![MockResponse::failure(1, "Flutter SDK not found")],
    );

    let ctx = run(&config, runner.clone(), Collaborators::builtin()).await;

    assert_eq!(ctx.status(), BuildStatus::Failed);
    assert_eq!(ctx.progress(), 50);
    assert!(ctx.error_log()[0].starts_with("scaffold stage failed: "));
    assert!(ctx.workspace_path().unwrap().is_dir());
    assert!(ctx.sources().is_empty());
    assert!(runner.calls_matching("build apk").is_empty());
}

/// Generates the template plus a stale dependency manifest.
struct ManifestGenerator;

#[async_trait]
impl CodeGenerator for ManifestGenerator {
    async fn generate(
        &self,
        requirements: &Requirements,
        architecture: &Architecture,
        hardware_commands: &str,
    ) -> AgentResult<BTreeMap<String, String>> {
        let mut sources = TemplateGenerator::new()
            .generate(requirements, architecture, hardware_commands)
            .await?;
        sources.insert(
            "pubspec.yaml".to_string(),
            "name: smart_lamp\n\
             environment:\n  sdk: '>=2.12.0 <3.0.0'\n\
             dependencies:\n  flutter:\n    sdk: flutter\n  flutter_bluetooth_serial: ^0.4.0\n"
                .to_string(),
        );
        Ok(sources)
    }
}

/// Patched generated files are mirrored into the context's sources.
#[tokio::test]
async fn test_patched_sources_are_mirrored() {
    let temp = TempDir::new().unwrap();
    let config = config(temp.path());
    let runner = scaffolding_runner().respond_to(
        "build apk",
        vec![MockResponse::success("Built").creates_file(ARTIFACT_CANDIDATES[0])],
    );
    let collaborators = Collaborators::builtin().with_generator(Arc::new(ManifestGenerator));

    let ctx = run(&config, runner, collaborators).await;

    assert_eq!(ctx.status(), BuildStatus::Completed, "{:?}", ctx.error_log());
    let pubspec = &ctx.sources()["pubspec.yaml"];
    assert!(!pubspec.contains("flutter_bluetooth_serial"));
    assert!(pubspec.contains("flutter_blue_plus"));
    assert!(pubspec.contains(">=3.2.0 <4.0.0"));
    assert_eq!(
        fs::read_to_string(ctx.project_path().unwrap().join("pubspec.yaml")).unwrap(),
        *pubspec
    );
    assert!(!ctx
        .warnings()
        .iter()
        .any(|w| w.starts_with("PatchWarning: pubspec.yaml")));
}
