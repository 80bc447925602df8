//! In-memory build engine (testing only)
//!
//! `ScriptedEngine` plays back a per-target script instead of invoking a
//! real host, so orchestration can be exercised without an editor install.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::engine::{BuildEngine, HostBuildResult, HostMessage};
use crate::error::EngineError;
use crate::spec::BuildJobSpec;
use crate::target::BuildTarget;

/// What the fake host does for one target.
#[derive(Debug, Clone)]
pub enum Script {
    /// Report success, optionally writing an artifact of `size` bytes.
    Succeed { size: u64, write_artifact: bool },

    /// Return normally with `succeeded = false` and these messages.
    ReportFailure(Vec<HostMessage>),

    /// Fail the host call with an invocation fault.
    Fault(String),

    /// Panic inside the host call.
    Panic(String),
}

/// Scripted engine. Targets without a script succeed and write an artifact
/// of [`ScriptedEngine::DEFAULT_SIZE`] bytes.
#[derive(Debug, Default)]
pub struct ScriptedEngine {
    scripts: HashMap<BuildTarget, Script>,
    unsupported: HashSet<BuildTarget>,
    calls: Mutex<Vec<BuildTarget>>,
}

impl ScriptedEngine {
    pub const DEFAULT_SIZE: u64 = 64;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(mut self, target: BuildTarget, script: Script) -> Self {
        self.scripts.insert(target, script);
        self
    }

    /// Make the prerequisite check fail for `target`.
    pub fn without_support(mut self, target: BuildTarget) -> Self {
        self.unsupported.insert(target);
        self
    }

    /// Targets whose `build_player` was invoked, in call order.
    pub fn calls(&self) -> Vec<BuildTarget> {
        self.calls.lock().unwrap().clone()
    }

    fn write_artifact(spec: &BuildJobSpec, size: u64) -> std::io::Result<()> {
        let path = spec.output_path();
        let bytes = vec![0u8; size as usize];
        if spec.target.artifact_extension().is_some() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, bytes)
        } else {
            std::fs::create_dir_all(&path)?;
            std::fs::write(path.join("project.pbxproj"), bytes)
        }
    }
}

#[async_trait]
impl BuildEngine for ScriptedEngine {
    async fn check_prerequisites(&self, target: BuildTarget) -> Result<(), EngineError> {
        if self.unsupported.contains(&target) {
            return Err(EngineError::PrerequisiteUnsupported {
                target,
                remediation: format!("add {} build support to the editor install", target.label()),
            });
        }
        Ok(())
    }

    async fn build_player(&self, spec: &BuildJobSpec) -> Result<HostBuildResult, EngineError> {
        self.calls.lock().unwrap().push(spec.target);

        let script = self.scripts.get(&spec.target).cloned().unwrap_or(Script::Succeed {
            size: Self::DEFAULT_SIZE,
            write_artifact: true,
        });

        match script {
            Script::Succeed {
                size,
                write_artifact,
            } => {
                if write_artifact {
                    Self::write_artifact(spec, size)?;
                }
                Ok(HostBuildResult::success(size, Duration::from_millis(5)))
            }
            Script::ReportFailure(messages) => {
                Ok(HostBuildResult::failure(messages, Duration::from_millis(5)))
            }
            Script::Fault(message) => Err(EngineError::HostInvocationFault(message)),
            Script::Panic(message) => panic!("{message}"),
        }
    }
}
