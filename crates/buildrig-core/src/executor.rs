//! Single-job execution with a fault boundary.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use tracing::{error, info, warn};

use crate::artifact;
use crate::engine::BuildEngine;
use crate::error::EngineError;
use crate::job::PlatformBuildJob;
use crate::outcome::BuildOutcome;
use crate::target::BuildTarget;

/// Runs one job through the engine and normalizes the result.
///
/// Never fails: engine errors, host-reported failures and engine panics all
/// come back as a failed [`BuildOutcome`].
#[derive(Clone)]
pub struct BuildExecutor {
    engine: Arc<dyn BuildEngine>,
}

impl BuildExecutor {
    pub fn new(engine: Arc<dyn BuildEngine>) -> Self {
        Self { engine }
    }

    pub async fn execute(&self, job: &PlatformBuildJob) -> BuildOutcome {
        let start = Instant::now();
        let target = job.target();
        let output_path = job.output_path();
        let mut warnings = job.warnings().to_vec();

        info!(platform = %target, output = %output_path.display(), "Building {}", target.label());
        for warning in &warnings {
            warn!(platform = %target, "{warning}");
        }

        if let Err(message) = contained(target, self.engine.check_prerequisites(target)).await {
            error!(platform = %target, "{message}");
            return BuildOutcome::failed(target, output_path, start.elapsed(), vec![message], warnings);
        }

        if let Err(e) = std::fs::create_dir_all(&job.spec().output_dir) {
            let message = format!(
                "failed to create output directory {}: {e}",
                job.spec().output_dir.display()
            );
            error!(platform = %target, "{message}");
            return BuildOutcome::failed(target, output_path, start.elapsed(), vec![message], warnings);
        }

        let result = match contained(target, self.engine.build_player(job.spec())).await {
            Ok(result) => result,
            Err(message) => {
                error!(platform = %target, "Exception during {} build: {message}", target.label());
                return BuildOutcome::failed(target, output_path, start.elapsed(), vec![message], warnings);
            }
        };

        if !result.succeeded {
            let mut errors = result.error_messages();
            if errors.is_empty() {
                errors.push(format!("build failed with {} error(s)", result.total_errors));
            }
            for message in &errors {
                error!(platform = %target, "Build error: {message}");
            }
            error!(
                platform = %target,
                total_errors = result.total_errors,
                "{} build FAILED",
                target.label()
            );
            return BuildOutcome::failed(target, output_path, start.elapsed(), errors, warnings);
        }

        let size = artifact::measure(&output_path);
        match size {
            Some(bytes) => info!(
                platform = %target,
                size = %artifact::format_size(bytes),
                host_size = %artifact::format_size(result.total_size_bytes),
                "Artifact verified"
            ),
            None => {
                let message = format!("artifact missing at {}", output_path.display());
                warn!(platform = %target, "{message}");
                warnings.push(message);
            }
        }

        let elapsed = start.elapsed();
        info!(
            platform = %target,
            elapsed_ms = elapsed.as_millis() as u64,
            "{} build SUCCEEDED",
            target.label()
        );

        BuildOutcome::succeeded(
            target,
            output_path,
            elapsed,
            size,
            Some(result.total_size_bytes),
            warnings,
        )
    }
}

/// Await one engine call, turning its error or panic into a failure message.
async fn contained<T, F>(target: BuildTarget, call: F) -> Result<T, String>
where
    F: Future<Output = Result<T, EngineError>>,
{
    match AssertUnwindSafe(call).catch_unwind().await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(EngineError::PrerequisiteUnsupported { remediation, .. })) => Err(format!(
            "{} build support unavailable: {remediation}",
            target.label()
        )),
        Ok(Err(e)) => Err(e.to_string()),
        Err(payload) => Err(format!(
            "build engine panicked: {}",
            panic_message(payload.as_ref())
        )),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
