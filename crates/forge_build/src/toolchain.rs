//! Thin wrapper over the `flutter` command line.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use forge_runner::{ExecutionResult, Invocation, RunConfig, RunnerResult, ToolRunner};

/// Builds and runs `flutter` invocations scoped to a directory.
#[derive(Clone)]
pub struct FlutterToolchain {
    runner: Arc<dyn ToolRunner>,
    bin: String,
}

impl FlutterToolchain {
    pub fn new(runner: Arc<dyn ToolRunner>) -> Self {
        Self {
            runner,
            bin: "flutter".to_string(),
        }
    }

    /// Use a different executable name or path.
    pub fn with_bin(mut self, bin: impl Into<String>) -> Self {
        self.bin = bin.into();
        self
    }

    pub fn bin(&self) -> &str {
        &self.bin
    }

    pub async fn is_available(&self) -> RunnerResult<bool> {
        self.runner.is_available(&self.bin).await
    }

    pub async fn version(&self) -> RunnerResult<ExecutionResult> {
        let inv = Invocation::new(&self.bin).arg("--version");
        self.runner.run(&inv, &RunConfig::default().timeout(60)).await
    }

    fn invocation<'a>(&self, dir: &Path, args: impl IntoIterator<Item = &'a str>) -> Invocation {
        Invocation::new(&self.bin).args(args).workdir(dir)
    }

    async fn run(&self, inv: Invocation, run_config: &RunConfig) -> RunnerResult<ExecutionResult> {
        debug!("flutter {} (in {:?})", inv.args_line(), inv.workdir);
        self.runner.run(&inv, run_config).await
    }

    /// `flutter create` for `dest`, run from `workspace`.
    pub async fn create(
        &self,
        workspace: &Path,
        project_name: &str,
        platform: &str,
        android_language: &str,
        dest: &Path,
        run_config: &RunConfig,
    ) -> RunnerResult<ExecutionResult> {
        let dest = dest.display().to_string();
        let inv = self.invocation(
            workspace,
            [
                "create",
                "--project-name",
                project_name,
                "--platforms",
                platform,
                "--android-language",
                android_language,
                dest.as_str(),
            ],
        );
        self.run(inv, run_config).await
    }

    pub async fn pub_get(
        &self,
        project: &Path,
        run_config: &RunConfig,
    ) -> RunnerResult<ExecutionResult> {
        self.run(self.invocation(project, ["pub", "get"]), run_config).await
    }

    pub async fn pub_cache_clean(
        &self,
        project: &Path,
        run_config: &RunConfig,
    ) -> RunnerResult<ExecutionResult> {
        self.run(self.invocation(project, ["pub", "cache", "clean", "--force"]), run_config)
            .await
    }

    pub async fn clean(
        &self,
        project: &Path,
        run_config: &RunConfig,
    ) -> RunnerResult<ExecutionResult> {
        self.run(self.invocation(project, ["clean"]), run_config).await
    }

    pub async fn build_apk(
        &self,
        project: &Path,
        run_config: &RunConfig,
    ) -> RunnerResult<ExecutionResult> {
        self.run(self.invocation(project, ["build", "apk", "--release"]), run_config)
            .await
    }
}

impl std::fmt::Debug for FlutterToolchain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlutterToolchain").field("bin", &self.bin).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_runner::MockRunner;

    #[tokio::test]
    async fn test_commands_are_scoped_to_project() {
        let runner = MockRunner::new();
        let flutter =
            FlutterToolchain::new(Arc::new(runner.clone())).with_bin("/opt/flutter/bin/flutter");
        let project = Path::new("/tmp/forge_app_x/demo");

        flutter.pub_get(project, &RunConfig::default()).await.unwrap();
        flutter.pub_cache_clean(project, &RunConfig::default()).await.unwrap();
        flutter.build_apk(project, &RunConfig::default()).await.unwrap();

        let calls = runner.get_calls();
        assert!(calls.iter().all(|c| c.program == "/opt/flutter/bin/flutter"));
        assert!(calls.iter().all(|c| c.workdir.as_deref() == Some(project)));
        assert_eq!(
            runner.command_lines(),
            ["pub get", "pub cache clean --force", "build apk --release"]
        );
    }

    #[tokio::test]
    async fn test_create_arguments() {
        let runner = MockRunner::new();
        let flutter = FlutterToolchain::new(Arc::new(runner.clone()));
        flutter
            .create(
                Path::new("/tmp/ws"),
                "smart_lamp",
                "android",
                "kotlin",
                Path::new("/tmp/ws/smart_lamp"),
                &RunConfig::default().timeout(120),
            )
            .await
            .unwrap();

        let call = &runner.get_calls()[0];
        assert_eq!(
            call.args_line(),
            "create --project-name smart_lamp --platforms android --android-language kotlin /tmp/ws/smart_lamp"
        );
        assert_eq!(call.timeout_seconds, 120);
    }
}
