//! buildrig - player build driver for CI pipelines
//!
//! The `buildrig` command runs platform builds one after another through the
//! configured build engine and reports a CI-friendly exit code.
//!
//! ## Commands
//!
//! - `build`: Build one or more targets (or whatever `-executeMethod` names)
//! - `clean`: Remove the build output folder
//! - `locate`: Find the artifact to hand to an upload step
//! - `targets`: List supported targets and their output layout
//!
//! Editor-style arguments go after `--`:
//!
//! ```text
//! buildrig build android-aab -- -batchmode -quit -buildPath Builds/Android \
//!     -versionNumber 1.4.0 -buildNumber 57 -keystorePath release.keystore ...
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn, Level};

use buildrig_core::{
    artifact, init_tracing, render_summary, ArgumentSource, BuildExecutor, BuildTarget,
    CommandEngine, ExecutionMode, JobPlan, LogFormat, ModeDetector, OrchestrationDriver,
    ProjectConfig, RunReport, ScriptMethod, StdProcessExit,
};

/// Build folder removed by `clean` and by `-executeMethod ClearBuildFolder`.
const DEFAULT_BUILD_ROOT: &str = "Builds";

#[derive(Parser)]
#[command(name = "buildrig")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Multi-platform player build orchestration", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Configuration file (default: ./buildrig.toml when present)
    #[arg(long, global = true, env = "BUILDRIG_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build targets sequentially and report the outcome
    Build {
        /// Targets (windows, android-apk, android-aab, ios, all).
        /// Defaults to the -executeMethod target, or every target.
        targets: Vec<String>,

        /// Write a JSON run report to this path
        #[arg(long)]
        report: Option<PathBuf>,

        /// Editor-style arguments (-buildPath, -versionNumber, -batchmode, ...)
        #[arg(last = true, allow_hyphen_values = true)]
        host_args: Vec<String>,
    },

    /// Remove the build output folder
    Clean {
        /// Folder to remove
        #[arg(default_value = DEFAULT_BUILD_ROOT)]
        path: PathBuf,
    },

    /// Locate a build artifact (file, or first match inside a version folder)
    Locate {
        /// Artifact file or folder containing it
        path: PathBuf,

        /// Artifact extension
        #[arg(long, default_value = "aab")]
        ext: String,
    },

    /// List supported build targets
    Targets,
}

/// What a `build` invocation resolves to.
#[derive(Debug, PartialEq, Eq)]
enum BuildAction {
    Build(Vec<BuildTarget>),
    ClearBuildFolder,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let host_args = match &cli.command {
        Commands::Build { host_args, .. } => ArgumentSource::new(host_args.iter().cloned()),
        _ => ArgumentSource::default(),
    };
    let mode = ModeDetector::detect(host_args.args());

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let format = if cli.json {
        LogFormat::Json
    } else {
        LogFormat::Text
    };
    init_tracing(format, level, !mode.is_unattended());

    match cli.command {
        Commands::Build {
            targets, report, ..
        } => {
            let config = ProjectConfig::load(cli.config.as_deref())
                .context("Failed to load buildrig configuration")?;
            cmd_build(&config, &targets, &host_args, mode, report.as_deref()).await
        }
        Commands::Clean { path } => cmd_clean(&path),
        Commands::Locate { path, ext } => cmd_locate(&path, &ext),
        Commands::Targets => cmd_targets(),
    }
}

/// Decide what to build from explicit targets or `-executeMethod`.
fn resolve_action(requested: &[String], args: &ArgumentSource) -> Result<BuildAction> {
    if requested.is_empty() {
        return match args.get("executeMethod") {
            None => Ok(BuildAction::Build(BuildTarget::ALL.to_vec())),
            Some(method) => match ScriptMethod::parse(method) {
                Some(ScriptMethod::Build(targets)) => Ok(BuildAction::Build(targets)),
                Some(ScriptMethod::ClearBuildFolder) => Ok(BuildAction::ClearBuildFolder),
                None => anyhow::bail!("Unknown -executeMethod: {}", method),
            },
        };
    }

    let mut targets = Vec::new();
    for name in requested {
        let expanded = if name.eq_ignore_ascii_case("all") {
            BuildTarget::ALL.to_vec()
        } else {
            vec![name.parse::<BuildTarget>()?]
        };
        for target in expanded {
            if !targets.contains(&target) {
                targets.push(target);
            }
        }
    }
    Ok(BuildAction::Build(targets))
}

/// Run the requested builds and apply the exit policy.
async fn cmd_build(
    config: &ProjectConfig,
    requested: &[String],
    args: &ArgumentSource,
    mode: ExecutionMode,
    report_path: Option<&Path>,
) -> Result<()> {
    let targets = match resolve_action(requested, args)? {
        BuildAction::Build(targets) => targets,
        BuildAction::ClearBuildFolder => return cmd_clean(Path::new(DEFAULT_BUILD_ROOT)),
    };

    let engine = CommandEngine::from_config(config).context("Invalid engine configuration")?;
    let jobs = JobPlan::resolve_all(&targets, args, &config.project);

    println!(
        "Building {} target(s) for {} {} (build {})",
        jobs.len(),
        config.project.product_name,
        args.get_or("versionNumber", &config.project.version),
        args.get_or("buildNumber", &config.project.build_number),
    );
    println!();

    let mut driver = OrchestrationDriver::new(BuildExecutor::new(Arc::new(engine)), mode);
    let summary = driver.run_all(&jobs).await;

    print!("{}", render_summary(&summary));

    if let Some(path) = report_path {
        RunReport::new(summary.clone(), &jobs)
            .write(path)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        info!(path = %path.display(), "Run report written");
    }

    if driver.finish(&summary, &StdProcessExit).is_none() && !summary.all_succeeded() {
        warn!(
            failed = summary.failure_count(),
            "Interactive run finished with failures"
        );
    }
    Ok(())
}

fn cmd_clean(path: &Path) -> Result<()> {
    let removed = artifact::clean(path)
        .with_context(|| format!("Failed to clear build folder {}", path.display()))?;
    if removed {
        println!("Cleared build folder: {}", path.display());
    } else {
        println!("Build folder doesn't exist: {}", path.display());
    }
    Ok(())
}

fn cmd_locate(path: &Path, ext: &str) -> Result<()> {
    let found = artifact::locate(path, ext)?;
    println!("{}", found.display());
    Ok(())
}

fn cmd_targets() -> Result<()> {
    for target in BuildTarget::ALL {
        let artifact = target
            .artifact_extension()
            .map(|ext| format!("<product>.{ext}"))
            .unwrap_or_else(|| "<product>/ (Xcode project)".to_string());
        println!(
            "{:<12} {:<26} {}/<version>/{}",
            target.name(),
            target.label(),
            target.default_build_path(),
            artifact
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(tokens: &[&str]) -> ArgumentSource {
        ArgumentSource::new(tokens.iter().copied())
    }

    #[test]
    fn test_cli_parses_host_args_after_separator() {
        let cli = Cli::try_parse_from([
            "buildrig",
            "build",
            "android-aab",
            "--report",
            "out/report.json",
            "--",
            "-batchmode",
            "-buildPath",
            "Builds/Android",
        ])
        .expect("parse");

        match cli.command {
            Commands::Build {
                targets,
                report,
                host_args,
            } => {
                assert_eq!(targets, vec!["android-aab"]);
                assert_eq!(report, Some(PathBuf::from("out/report.json")));
                assert_eq!(host_args, vec!["-batchmode", "-buildPath", "Builds/Android"]);
                assert_eq!(ModeDetector::detect(&host_args), ExecutionMode::Unattended);
            }
            _ => panic!("expected build command"),
        }
    }

    #[test]
    fn test_resolve_action_defaults_to_all_targets() {
        let action = resolve_action(&[], &source(&[])).unwrap();
        assert_eq!(action, BuildAction::Build(BuildTarget::ALL.to_vec()));
    }

    #[test]
    fn test_resolve_action_from_execute_method() {
        let args = source(&["-executeMethod", "BuildScript.BuildiOS"]);
        assert_eq!(
            resolve_action(&[], &args).unwrap(),
            BuildAction::Build(vec![BuildTarget::IosProject])
        );

        let args = source(&["-executeMethod", "BuildScript.ClearBuildFolder"]);
        assert_eq!(resolve_action(&[], &args).unwrap(), BuildAction::ClearBuildFolder);

        let args = source(&["-executeMethod", "BuildScript.Publish"]);
        assert!(resolve_action(&[], &args).is_err());
    }

    #[test]
    fn test_explicit_targets_override_execute_method_and_dedupe() {
        let args = source(&["-executeMethod", "BuildScript.BuildiOS"]);
        let requested = vec!["apk".to_string(), "all".to_string()];
        assert_eq!(
            resolve_action(&requested, &args).unwrap(),
            BuildAction::Build(vec![
                BuildTarget::AndroidPackage,
                BuildTarget::WindowsDesktop,
                BuildTarget::AndroidBundle,
                BuildTarget::IosProject,
            ])
        );
    }

    #[test]
    fn test_unknown_target_is_rejected() {
        let requested = vec!["switch".to_string()];
        assert!(resolve_action(&requested, &source(&[])).is_err());
    }

    #[test]
    fn test_clean_missing_folder_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        cmd_clean(&dir.path().join("Builds")).expect("clean");
    }
}
