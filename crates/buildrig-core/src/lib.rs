//! buildrig - multi-platform player build orchestration
//!
//! Provides a build driver that:
//! - Resolves per-platform jobs from editor-style `-name value` arguments
//! - Runs them one at a time through a pluggable build engine
//! - Normalizes every host result into a `BuildOutcome`, containing faults
//! - Summarizes the run and maps it to a CI exit code

pub mod args;
pub mod artifact;
pub mod command;
pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod executor;
pub mod fakes;
pub mod job;
pub mod mode;
pub mod outcome;
pub mod report;
pub mod spec;
pub mod target;
pub mod telemetry;

// Re-export key types
pub use args::{ArgumentSource, ScriptMethod};
pub use command::CommandEngine;
pub use config::{CommandSpec, ProjectConfig, ProjectDefaults};
pub use driver::{ExitPolicy, OrchestrationDriver, ProcessExit, RunState, StdProcessExit};
pub use engine::{BuildEngine, HostBuildResult, HostMessage, MessageLevel};
pub use error::{BuildError, EngineError, Result};
pub use executor::BuildExecutor;
pub use job::{JobPlan, PlatformBuildJob, SigningCredentials};
pub use mode::{ExecutionMode, ModeDetector};
pub use outcome::{BuildOutcome, RunSummary};
pub use report::{render_summary, RunReport};
pub use spec::BuildJobSpec;
pub use target::{BuildTarget, Platform};
pub use telemetry::{init_tracing, LogFormat};
