//! Error types for build orchestration.

use std::path::PathBuf;

use thiserror::Error;

use crate::target::BuildTarget;

/// Errors raised at the build engine boundary.
///
/// The executor converts every one of these into a failed
/// [`BuildOutcome`](crate::outcome::BuildOutcome); none of them escape a job.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("{target} build is not supported: {remediation}")]
    PrerequisiteUnsupported {
        target: BuildTarget,
        remediation: String,
    },

    #[error("host invocation fault: {0}")]
    HostInvocationFault(String),

    #[error("{target} build timed out after {secs} seconds")]
    Timeout { target: BuildTarget, secs: u64 },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors for everything outside a running job: configuration, artifact
/// lookup, report output.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("unknown build target: {0}")]
    InvalidTarget(String),

    #[error("artifact not found: {}", .0.display())]
    ArtifactNotFound(PathBuf),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid configuration file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for orchestration operations.
pub type Result<T> = std::result::Result<T, BuildError>;
