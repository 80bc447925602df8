//! Normalized per-job outcomes and the run summary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::mode::ExecutionMode;
use crate::target::BuildTarget;

/// Result of running one job. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOutcome {
    target: BuildTarget,
    success: bool,
    elapsed_ms: u64,
    output_size_bytes: Option<u64>,
    host_size_bytes: Option<u64>,
    error_messages: Vec<String>,
    warnings: Vec<String>,
    output_path: PathBuf,
}

impl BuildOutcome {
    /// A successful build. `output_size_bytes` is `None` when the artifact
    /// could not be found on disk.
    pub fn succeeded(
        target: BuildTarget,
        output_path: PathBuf,
        elapsed: Duration,
        output_size_bytes: Option<u64>,
        host_size_bytes: Option<u64>,
        warnings: Vec<String>,
    ) -> Self {
        Self {
            target,
            success: true,
            elapsed_ms: elapsed.as_millis() as u64,
            output_size_bytes,
            host_size_bytes,
            error_messages: Vec::new(),
            warnings,
            output_path,
        }
    }

    /// A failed build. Always carries at least one error message.
    pub fn failed(
        target: BuildTarget,
        output_path: PathBuf,
        elapsed: Duration,
        mut error_messages: Vec<String>,
        warnings: Vec<String>,
    ) -> Self {
        if error_messages.is_empty() {
            error_messages.push(format!("{} build failed", target.label()));
        }
        Self {
            target,
            success: false,
            elapsed_ms: elapsed.as_millis() as u64,
            output_size_bytes: None,
            host_size_bytes: None,
            error_messages,
            warnings,
            output_path,
        }
    }

    pub fn target(&self) -> BuildTarget {
        self.target
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms)
    }

    pub fn output_size_bytes(&self) -> Option<u64> {
        self.output_size_bytes
    }

    /// Size the host claimed, independent of what is on disk.
    pub fn host_size_bytes(&self) -> Option<u64> {
        self.host_size_bytes
    }

    pub fn error_messages(&self) -> &[String] {
        &self.error_messages
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }
}

/// Aggregate over every outcome of one orchestration run.
///
/// Only constructible from the complete outcome list, so
/// `success_count + failure_count == outcomes.len()` always holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    run_id: Uuid,
    mode: ExecutionMode,
    started_at: DateTime<Utc>,
    elapsed_ms: u64,
    success_count: usize,
    failure_count: usize,
    outcomes: Vec<BuildOutcome>,
}

impl RunSummary {
    pub fn from_outcomes(
        mode: ExecutionMode,
        started_at: DateTime<Utc>,
        elapsed: Duration,
        outcomes: Vec<BuildOutcome>,
    ) -> Self {
        let success_count = outcomes.iter().filter(|o| o.success()).count();
        let failure_count = outcomes.len() - success_count;
        Self {
            run_id: Uuid::new_v4(),
            mode,
            started_at,
            elapsed_ms: elapsed.as_millis() as u64,
            success_count,
            failure_count,
            outcomes,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms)
    }

    pub fn success_count(&self) -> usize {
        self.success_count
    }

    pub fn failure_count(&self) -> usize {
        self.failure_count
    }

    pub fn outcomes(&self) -> &[BuildOutcome] {
        &self.outcomes
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failure_count == 0
    }
}
