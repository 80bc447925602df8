//! Sequential orchestration of platform build jobs and the exit policy.

use std::time::Instant;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::executor::BuildExecutor;
use crate::job::PlatformBuildJob;
use crate::mode::ExecutionMode;
use crate::outcome::RunSummary;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;

/// Progress of one orchestration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    Running { index: usize, total: usize },
    Completed,
}

/// Runs jobs one at a time, in order, without short-circuiting.
///
/// Builds mutate host-global settings (active platform, signing), so at
/// most one job is ever in flight.
pub struct OrchestrationDriver {
    executor: BuildExecutor,
    mode: ExecutionMode,
    state: RunState,
}

impl OrchestrationDriver {
    pub fn new(executor: BuildExecutor, mode: ExecutionMode) -> Self {
        Self {
            executor,
            mode,
            state: RunState::NotStarted,
        }
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Execute every job and summarize. A failed job never prevents the
    /// next one from running.
    pub async fn run_all(&mut self, jobs: &[PlatformBuildJob]) -> RunSummary {
        let started_at = Utc::now();
        let start = Instant::now();
        let total = jobs.len();

        info!(jobs = total, mode = ?self.mode, "Starting build run");

        let mut outcomes = Vec::with_capacity(total);
        for (index, job) in jobs.iter().enumerate() {
            self.state = RunState::Running { index, total };
            info!(job = index + 1, of = total, platform = %job.target(), "Executing job");

            let outcome = self.executor.execute(job).await;
            if !outcome.success() {
                warn!(platform = %job.target(), "Job failed, continuing with remaining jobs");
            }
            outcomes.push(outcome);
        }

        self.state = RunState::Completed;
        let summary = RunSummary::from_outcomes(self.mode, started_at, start.elapsed(), outcomes);

        if summary.all_succeeded() {
            info!(
                run_id = %summary.run_id(),
                succeeded = summary.success_count(),
                "Build run completed successfully"
            );
        } else {
            error!(
                run_id = %summary.run_id(),
                succeeded = summary.success_count(),
                failed = summary.failure_count(),
                "Build run finished with failures"
            );
        }

        summary
    }

    /// Apply the exit policy for this driver's mode. Returns the code that
    /// was handed to `exit`, if any.
    pub fn finish(&self, summary: &RunSummary, exit: &dyn ProcessExit) -> Option<i32> {
        let code = ExitPolicy::exit_code(self.mode, summary)?;
        info!(code, "Exiting unattended run");
        exit.exit(code);
        Some(code)
    }
}

/// Maps a finished run to a process exit code.
pub struct ExitPolicy;

impl ExitPolicy {
    /// `Some(0)` or `Some(1)` for unattended runs; `None` for interactive
    /// runs, which must return control to the caller.
    pub fn exit_code(mode: ExecutionMode, summary: &RunSummary) -> Option<i32> {
        match mode {
            ExecutionMode::Interactive => None,
            ExecutionMode::Unattended if summary.all_succeeded() => Some(EXIT_SUCCESS),
            ExecutionMode::Unattended => Some(EXIT_FAILURE),
        }
    }
}

/// Process termination seam.
pub trait ProcessExit {
    fn exit(&self, code: i32);
}

/// Terminates the current process.
pub struct StdProcessExit;

impl ProcessExit for StdProcessExit {
    fn exit(&self, code: i32) {
        std::process::exit(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{Script, ScriptedEngine};
    use crate::target::BuildTarget;
    use std::cell::RefCell;
    use std::sync::Arc;

    #[derive(Default)]
    struct RecordingExit {
        codes: RefCell<Vec<i32>>,
    }

    impl ProcessExit for RecordingExit {
        fn exit(&self, code: i32) {
            self.codes.borrow_mut().push(code);
        }
    }

    fn driver(engine: ScriptedEngine, mode: ExecutionMode) -> OrchestrationDriver {
        OrchestrationDriver::new(BuildExecutor::new(Arc::new(engine)), mode)
    }

    #[tokio::test]
    async fn test_state_transitions() {
        let dir = tempfile::tempdir().unwrap();
        let mut driver = driver(ScriptedEngine::new(), ExecutionMode::Interactive);
        assert_eq!(driver.state(), RunState::NotStarted);

        let jobs = vec![PlatformBuildJob::ios(dir.path(), "Game", "1.0.0", "1")];
        driver.run_all(&jobs).await;
        assert_eq!(driver.state(), RunState::Completed);
    }

    #[tokio::test]
    async fn test_unattended_failure_exits_nonzero() {
        let dir = tempfile::tempdir().unwrap();
        let engine = ScriptedEngine::new().with_script(
            BuildTarget::WindowsDesktop,
            Script::Fault("license check failed".to_string()),
        );
        let mut driver = driver(engine, ExecutionMode::Unattended);
        let jobs = vec![PlatformBuildJob::windows(dir.path(), "Game", "1.0.0", "1")];

        let summary = driver.run_all(&jobs).await;
        let exit = RecordingExit::default();
        assert_eq!(driver.finish(&summary, &exit), Some(EXIT_FAILURE));
        assert_eq!(*exit.codes.borrow(), vec![EXIT_FAILURE]);
    }

    #[tokio::test]
    async fn test_unattended_success_exits_zero() {
        let dir = tempfile::tempdir().unwrap();
        let mut driver = driver(ScriptedEngine::new(), ExecutionMode::Unattended);
        let jobs = vec![PlatformBuildJob::windows(dir.path(), "Game", "1.0.0", "1")];

        let summary = driver.run_all(&jobs).await;
        let exit = RecordingExit::default();
        assert_eq!(driver.finish(&summary, &exit), Some(EXIT_SUCCESS));
        assert_eq!(*exit.codes.borrow(), vec![EXIT_SUCCESS]);
    }

    #[tokio::test]
    async fn test_interactive_never_exits() {
        let dir = tempfile::tempdir().unwrap();
        let engine = ScriptedEngine::new()
            .with_script(BuildTarget::IosProject, Script::Fault("xcode".to_string()));
        let mut driver = driver(engine, ExecutionMode::Interactive);
        let jobs = vec![PlatformBuildJob::ios(dir.path(), "Game", "1.0.0", "1")];

        let summary = driver.run_all(&jobs).await;
        let exit = RecordingExit::default();
        assert_eq!(driver.finish(&summary, &exit), None);
        assert!(exit.codes.borrow().is_empty());
    }
}
