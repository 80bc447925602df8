//! Project configuration: persisted version defaults and engine commands.
//!
//! Loaded from `buildrig.toml` when present. Every field has a default so a
//! repository without a config file still resolves jobs; it simply has no
//! engine commands until one is added.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BuildError, Result};
use crate::target::BuildTarget;

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProjectConfig {
    pub project: ProjectDefaults,

    /// Engine command per target, keyed by target name (`windows`,
    /// `android-apk`, ...).
    pub engine: BTreeMap<String, CommandSpec>,
}

/// Persisted defaults that `-versionNumber` / `-buildNumber` override.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProjectDefaults {
    pub product_name: String,
    pub version: String,
    pub build_number: String,
}

impl Default for ProjectDefaults {
    fn default() -> Self {
        Self {
            product_name: "Game".to_string(),
            version: "1.0.0".to_string(),
            build_number: "1".to_string(),
        }
    }
}

/// External command that performs one target's build.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommandSpec {
    /// Executable path or a name resolved through `PATH`.
    pub program: String,

    /// Arguments; `{output}`, `{output_dir}`, `{version}`, `{build_number}`,
    /// `{target}` and `{product}` are substituted per job.
    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default)]
    pub working_dir: Option<PathBuf>,

    /// Watchdog in seconds; 0 waits forever.
    #[serde(default)]
    pub timeout_secs: u64,

    /// Extra environment for the process.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            working_dir: None,
            timeout_secs: 0,
            env: BTreeMap::new(),
        }
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

impl ProjectConfig {
    /// Config file looked up in the working directory.
    pub const DEFAULT_PATH: &'static str = "buildrig.toml";

    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one, `buildrig.toml` is read
    /// when present and defaults are used otherwise. Environment overrides
    /// are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Path::new(Self::DEFAULT_PATH);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    Self::default()
                }
            }
        };
        Ok(config.with_env_overrides(|key| std::env::var(key).ok()))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BuildError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ProjectConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `BUILDRIG_PRODUCT_NAME`, `BUILDRIG_VERSION` and
    /// `BUILDRIG_BUILD_NUMBER` from `lookup`.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = lookup("BUILDRIG_PRODUCT_NAME") {
            self.project.product_name = name;
        }
        if let Some(version) = lookup("BUILDRIG_VERSION") {
            self.project.version = version;
        }
        if let Some(build_number) = lookup("BUILDRIG_BUILD_NUMBER") {
            self.project.build_number = build_number;
        }
        self
    }

    /// Engine commands keyed by parsed target.
    pub fn commands(&self) -> Result<BTreeMap<BuildTarget, CommandSpec>> {
        self.engine
            .iter()
            .map(|(key, spec)| -> Result<(BuildTarget, CommandSpec)> {
                Ok((key.parse::<BuildTarget>()?, spec.clone()))
            })
            .collect()
    }

    fn validate(&self) -> Result<()> {
        if self.project.product_name.trim().is_empty() {
            return Err(BuildError::Config(
                "project.product_name must not be empty".to_string(),
            ));
        }
        for (key, spec) in &self.engine {
            key.parse::<BuildTarget>()?;
            if spec.program.trim().is_empty() {
                return Err(BuildError::Config(format!(
                    "engine.{key}.program must not be empty"
                )));
            }
        }
        Ok(())
    }
}
