//! Run reports for CI consumers.
//!
//! Two forms:
//! - a console summary, one line per job followed by its diagnostics
//! - `RunReport`, the machine-readable JSON written with `--report`

use std::fmt::Write as _;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::artifact::format_size;
use crate::error::Result;
use crate::job::PlatformBuildJob;
use crate::outcome::RunSummary;
use crate::spec::compute_plan_digest;

/// JSON report of a finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Digest of the ordered job plan, stable across re-runs of the same plan.
    pub plan_digest: String,

    #[serde(flatten)]
    pub summary: RunSummary,
}

impl RunReport {
    pub fn new(summary: RunSummary, jobs: &[PlatformBuildJob]) -> Self {
        Self {
            plan_digest: compute_plan_digest(jobs.iter().map(PlatformBuildJob::spec)),
            summary,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report, creating parent directories as needed.
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

fn format_elapsed(elapsed: Duration) -> String {
    let millis = Duration::from_millis(elapsed.as_millis() as u64);
    humantime::format_duration(millis).to_string()
}

/// Render the human-readable summary.
pub fn render_summary(summary: &RunSummary) -> String {
    let mut out = String::new();
    for outcome in summary.outcomes() {
        let mark = if outcome.success() { "✓" } else { "✗" };
        let size = outcome
            .output_size_bytes()
            .map(format_size)
            .unwrap_or_else(|| "N/A".to_string());
        let _ = writeln!(
            out,
            "  {} {} ({}, {}) -> {}",
            mark,
            outcome.target().label(),
            format_elapsed(outcome.elapsed()),
            size,
            outcome.output_path().display()
        );
        for message in outcome.error_messages() {
            let _ = writeln!(out, "      error: {message}");
        }
        for warning in outcome.warnings() {
            let _ = writeln!(out, "      warning: {warning}");
        }
    }
    let _ = writeln!(
        out,
        "Summary: {} succeeded, {} failed ({} total, {})",
        summary.success_count(),
        summary.failure_count(),
        summary.total(),
        format_elapsed(summary.elapsed())
    );
    out
}
