//! Build engine boundary.
//!
//! The engine is the host that actually compiles and packages a player.
//! The orchestrator only sees this trait; see [`CommandEngine`] for the
//! process-backed implementation and [`crate::fakes::ScriptedEngine`] for
//! tests.
//!
//! [`CommandEngine`]: crate::command::CommandEngine

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::spec::BuildJobSpec;
use crate::target::BuildTarget;

/// Severity of a host-reported message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageLevel {
    Info,
    Warning,
    Error,
    Exception,
}

impl MessageLevel {
    /// Error and exception messages explain a failed build.
    pub fn is_error(&self) -> bool {
        matches!(self, MessageLevel::Error | MessageLevel::Exception)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HostMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl HostMessage {
    pub fn new(level: MessageLevel, content: impl Into<String>) -> Self {
        Self {
            level,
            content: content.into(),
        }
    }

    pub fn info(content: impl Into<String>) -> Self {
        Self::new(MessageLevel::Info, content)
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self::new(MessageLevel::Warning, content)
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self::new(MessageLevel::Error, content)
    }

    pub fn exception(content: impl Into<String>) -> Self {
        Self::new(MessageLevel::Exception, content)
    }

    /// Classify one line of host output by its leading keyword.
    pub fn classify(line: &str) -> Self {
        let trimmed = line.trim();
        let lower = trimmed.to_ascii_lowercase();
        let level = if lower.starts_with("exception") || trimmed.contains("Exception:") {
            MessageLevel::Exception
        } else if lower.starts_with("error") || lower.starts_with("fatal") {
            MessageLevel::Error
        } else if lower.starts_with("warning") {
            MessageLevel::Warning
        } else {
            MessageLevel::Info
        };
        Self::new(level, trimmed)
    }
}

/// What the host reports after a build call returns.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HostBuildResult {
    pub succeeded: bool,
    pub total_errors: u32,
    pub total_size_bytes: u64,
    pub elapsed: Duration,
    pub messages: Vec<HostMessage>,
}

impl HostBuildResult {
    pub fn success(total_size_bytes: u64, elapsed: Duration) -> Self {
        Self {
            succeeded: true,
            total_errors: 0,
            total_size_bytes,
            elapsed,
            messages: Vec::new(),
        }
    }

    pub fn failure(messages: Vec<HostMessage>, elapsed: Duration) -> Self {
        let total_errors = messages.iter().filter(|m| m.level.is_error()).count() as u32;
        Self {
            succeeded: false,
            total_errors,
            total_size_bytes: 0,
            elapsed,
            messages,
        }
    }

    /// Error and exception messages in reported order.
    pub fn error_messages(&self) -> Vec<String> {
        self.messages
            .iter()
            .filter(|m| m.level.is_error())
            .map(|m| m.content.clone())
            .collect()
    }
}

/// Host collaborator that performs platform builds.
///
/// Calls may be slow and may fail; implementations report failures as
/// `Err` and the executor contains them.
#[async_trait]
pub trait BuildEngine: Send + Sync {
    /// Detect a missing platform capability before starting a build.
    async fn check_prerequisites(&self, _target: BuildTarget) -> Result<(), EngineError> {
        Ok(())
    }

    /// Run the build described by `spec`.
    async fn build_player(&self, spec: &BuildJobSpec) -> Result<HostBuildResult, EngineError>;
}
