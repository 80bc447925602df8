//! Process-backed build engine.

use std::collections::BTreeMap;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, info};

use crate::artifact;
use crate::config::{CommandSpec, ProjectConfig};
use crate::engine::{BuildEngine, HostBuildResult, HostMessage};
use crate::error::{EngineError, Result};
use crate::spec::BuildJobSpec;
use crate::target::BuildTarget;

/// Prefix for job options exported to the build process.
pub const OPTION_ENV_PREFIX: &str = "BUILDRIG_OPT_";

/// Runs one configured external command per target.
///
/// Success is the command's exit status. Output lines become host messages,
/// and the reported size is whatever exists at the job's output path once
/// the command exits.
#[derive(Debug, Clone, Default)]
pub struct CommandEngine {
    commands: BTreeMap<BuildTarget, CommandSpec>,
}

impl CommandEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_command(mut self, target: BuildTarget, spec: CommandSpec) -> Self {
        self.commands.insert(target, spec);
        self
    }

    pub fn from_config(config: &ProjectConfig) -> Result<Self> {
        Ok(Self {
            commands: config.commands()?,
        })
    }

    pub fn command_for(&self, target: BuildTarget) -> Option<&CommandSpec> {
        self.commands.get(&target)
    }

    fn render_args(command: &CommandSpec, job: &BuildJobSpec) -> Vec<String> {
        let output = job.output_path();
        let output = output.to_string_lossy();
        let output_dir = job.output_dir.to_string_lossy();
        command
            .args
            .iter()
            .map(|arg| {
                arg.replace("{output}", &output)
                    .replace("{output_dir}", &output_dir)
                    .replace("{version}", &job.version)
                    .replace("{build_number}", &job.build_number)
                    .replace("{target}", job.target.name())
                    .replace("{product}", &job.product_name)
            })
            .collect()
    }

    fn job_env(job: &BuildJobSpec) -> Vec<(String, String)> {
        let mut env = vec![
            ("BUILDRIG_TARGET".to_string(), job.target.name().to_string()),
            (
                "BUILDRIG_OUTPUT".to_string(),
                job.output_path().to_string_lossy().into_owned(),
            ),
            ("BUILDRIG_VERSION".to_string(), job.version.clone()),
            ("BUILDRIG_BUILD_NUMBER".to_string(), job.build_number.clone()),
            ("BUILDRIG_PRODUCT_NAME".to_string(), job.product_name.clone()),
        ];
        env.extend(job.options.iter().map(|(key, value)| {
            (
                format!("{OPTION_ENV_PREFIX}{}", key.to_ascii_uppercase()),
                value.clone(),
            )
        }));
        env
    }
}

#[async_trait]
impl BuildEngine for CommandEngine {
    async fn check_prerequisites(&self, target: BuildTarget) -> std::result::Result<(), EngineError> {
        let Some(command) = self.commands.get(&target) else {
            return Err(EngineError::PrerequisiteUnsupported {
                target,
                remediation: format!(
                    "no build command configured; add an [engine.{}] section to {}",
                    target.name(),
                    ProjectConfig::DEFAULT_PATH
                ),
            });
        };

        if !program_available(&command.program) {
            return Err(EngineError::PrerequisiteUnsupported {
                target,
                remediation: format!(
                    "program '{}' not found; install {} build support or fix engine.{}.program",
                    command.program,
                    target.label(),
                    target.name()
                ),
            });
        }
        Ok(())
    }

    async fn build_player(&self, job: &BuildJobSpec) -> std::result::Result<HostBuildResult, EngineError> {
        let command = self.commands.get(&job.target).ok_or_else(|| {
            EngineError::HostInvocationFault(format!("no command configured for {}", job.target))
        })?;
        let start = Instant::now();
        let args = Self::render_args(command, job);

        debug!(program = %command.program, ?args, "Spawning build command");

        let mut process = Command::new(&command.program);
        process
            .args(&args)
            .envs(Self::job_env(job))
            .envs(&command.env)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &command.working_dir {
            process.current_dir(dir);
        }

        let child = process.spawn().map_err(|e| {
            EngineError::HostInvocationFault(format!("failed to spawn '{}': {e}", command.program))
        })?;

        let (status, lines) = if command.timeout_secs > 0 {
            tokio::time::timeout(
                Duration::from_secs(command.timeout_secs),
                collect_output(child),
            )
            .await
            .map_err(|_| EngineError::Timeout {
                target: job.target,
                secs: command.timeout_secs,
            })??
        } else {
            collect_output(child).await?
        };

        let mut messages: Vec<HostMessage> = lines
            .iter()
            .filter(|line| !line.trim().is_empty())
            .map(|line| HostMessage::classify(line))
            .collect();

        let succeeded = status.success();
        if !succeeded {
            let code = status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            messages.push(HostMessage::error(format!(
                "'{}' exited with code {}",
                command.program, code
            )));
        }

        let total_errors = messages.iter().filter(|m| m.level.is_error()).count() as u32;
        let total_size_bytes = artifact::measure(&job.output_path()).unwrap_or(0);
        let elapsed = start.elapsed();

        info!(
            platform = %job.target,
            succeeded,
            total_errors,
            elapsed_ms = elapsed.as_millis() as u64,
            "Build command finished"
        );

        Ok(HostBuildResult {
            succeeded,
            total_errors,
            total_size_bytes,
            elapsed,
            messages,
        })
    }
}

/// Read stdout and stderr line by line until both close, keeping the order
/// in which lines arrive, then reap the process.
async fn collect_output(mut child: Child) -> std::io::Result<(ExitStatus, Vec<String>)> {
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "stdout not captured"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "stderr not captured"))?;
    let mut stdout = BufReader::new(stdout).split(b'\n');
    let mut stderr = BufReader::new(stderr).split(b'\n');

    let mut lines = Vec::new();
    let (mut stdout_open, mut stderr_open) = (true, true);
    while stdout_open || stderr_open {
        tokio::select! {
            line = stdout.next_segment(), if stdout_open => match line? {
                Some(line) => lines.push(String::from_utf8_lossy(&line).into_owned()),
                None => stdout_open = false,
            },
            line = stderr.next_segment(), if stderr_open => match line? {
                Some(line) => lines.push(String::from_utf8_lossy(&line).into_owned()),
                None => stderr_open = false,
            },
        }
    }

    let status = child.wait().await?;
    Ok((status, lines))
}

/// Whether `program` resolves to a file, either as a path or via `PATH`.
fn program_available(program: &str) -> bool {
    let path = Path::new(program);
    if path.components().count() > 1 {
        return path.is_file();
    }
    std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(program).is_file()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MessageLevel;

    fn sh(script: &str) -> CommandSpec {
        CommandSpec::new("sh", vec!["-c".to_string(), script.to_string()])
    }

    fn job(dir: &Path, target: BuildTarget) -> BuildJobSpec {
        BuildJobSpec::new(target, dir, "Game", "1.0.0", "3")
    }

    #[test]
    fn test_render_args_substitutes_placeholders() {
        let command = CommandSpec::new(
            "unity",
            vec![
                "-out".to_string(),
                "{output}".to_string(),
                "{target}-{version}+{build_number}".to_string(),
            ],
        );
        let spec = BuildJobSpec::new(BuildTarget::AndroidBundle, "Builds/Android", "Game", "1.2.0", "9");
        let args = CommandEngine::render_args(&command, &spec);
        assert_eq!(args[1], "Builds/Android/1.2.0/Game.aab");
        assert_eq!(args[2], "android-aab-1.2.0+9");
    }

    #[test]
    fn test_job_env_exports_options() {
        let spec = BuildJobSpec::new(BuildTarget::AndroidPackage, "out", "Game", "1.0.0", "1")
            .with_option("keystore_path", "release.keystore");
        let env = CommandEngine::job_env(&spec);
        assert!(env.contains(&(
            "BUILDRIG_OPT_KEYSTORE_PATH".to_string(),
            "release.keystore".to_string()
        )));
        assert!(env.contains(&("BUILDRIG_TARGET".to_string(), "android-apk".to_string())));
    }

    #[tokio::test]
    async fn test_prerequisites_require_configured_command() {
        let engine = CommandEngine::new();
        let err = engine
            .check_prerequisites(BuildTarget::IosProject)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::PrerequisiteUnsupported { .. }));
        assert!(err.to_string().contains("[engine.ios]"));
    }

    #[tokio::test]
    async fn test_prerequisites_require_existing_program() {
        let engine = CommandEngine::new().with_command(
            BuildTarget::WindowsDesktop,
            CommandSpec::new("/definitely/not/a/unity/editor", vec![]),
        );
        let err = engine
            .check_prerequisites(BuildTarget::WindowsDesktop)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn test_successful_command_reports_artifact_size() {
        let dir = tempfile::tempdir().unwrap();
        let spec = job(dir.path(), BuildTarget::WindowsDesktop);
        std::fs::create_dir_all(&spec.output_dir).unwrap();

        let engine = CommandEngine::new().with_command(
            BuildTarget::WindowsDesktop,
            sh("printf 'player' > \"$BUILDRIG_OUTPUT\"; echo 'Build complete'"),
        );
        engine
            .check_prerequisites(BuildTarget::WindowsDesktop)
            .await
            .expect("sh should be on PATH");

        let result = engine.build_player(&spec).await.expect("build ran");
        assert!(result.succeeded);
        assert_eq!(result.total_errors, 0);
        assert_eq!(result.total_size_bytes, 6);
        assert_eq!(result.messages[0].level, MessageLevel::Info);
    }

    #[tokio::test]
    async fn test_failing_command_collects_error_lines() {
        let dir = tempfile::tempdir().unwrap();
        let spec = job(dir.path(), BuildTarget::AndroidPackage);

        let engine = CommandEngine::new().with_command(
            BuildTarget::AndroidPackage,
            sh("echo 'Warning: slow import'; echo 'error: Gradle build failed' >&2; exit 3"),
        );

        let result = engine.build_player(&spec).await.expect("build ran");
        assert!(!result.succeeded);
        assert_eq!(
            result.error_messages(),
            vec!["error: Gradle build failed", "'sh' exited with code 3"]
        );
    }

    #[tokio::test]
    async fn test_messages_keep_arrival_order_across_streams() {
        let dir = tempfile::tempdir().unwrap();
        let spec = job(dir.path(), BuildTarget::WindowsDesktop);

        let engine = CommandEngine::new().with_command(
            BuildTarget::WindowsDesktop,
            sh("echo 'error: first' >&2; sleep 0.1; echo 'error: second'; exit 1"),
        );

        let result = engine.build_player(&spec).await.expect("build ran");
        assert_eq!(
            result.error_messages(),
            vec!["error: first", "error: second", "'sh' exited with code 1"]
        );
    }

    #[tokio::test]
    async fn test_timeout_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let spec = job(dir.path(), BuildTarget::IosProject);

        let engine = CommandEngine::new()
            .with_command(BuildTarget::IosProject, sh("sleep 5").with_timeout(1));

        let err = engine.build_player(&spec).await.unwrap_err();
        assert!(matches!(err, EngineError::Timeout { secs: 1, .. }));
    }
}
