//! Build job specification.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::target::BuildTarget;

/// Everything the host needs to run one platform build.
///
/// `options` is opaque to the orchestrator and handed to the engine as-is
/// (signing credentials live there).
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuildJobSpec {
    pub target: BuildTarget,

    /// Versioned output directory, `<buildPath>/<versionNumber>`.
    pub output_dir: PathBuf,

    pub product_name: String,

    pub version: String,

    pub build_number: String,

    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

impl BuildJobSpec {
    pub fn new(
        target: BuildTarget,
        base_path: impl Into<PathBuf>,
        product_name: impl Into<String>,
        version: impl Into<String>,
        build_number: impl Into<String>,
    ) -> Self {
        let version = version.into();
        let output_dir = base_path.into().join(&version);
        Self {
            target,
            output_dir,
            product_name: product_name.into(),
            version,
            build_number: build_number.into(),
            options: BTreeMap::new(),
        }
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    /// Where the artifact is expected once the build succeeds.
    pub fn output_path(&self) -> PathBuf {
        self.target.artifact_path(&self.output_dir, &self.product_name)
    }
}

// Option values may hold passwords; keep them out of logs.
impl fmt::Debug for BuildJobSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let options: BTreeMap<&str, &str> = self
            .options
            .iter()
            .map(|(k, v)| {
                let shown = if is_secret_key(k) { "<redacted>" } else { v.as_str() };
                (k.as_str(), shown)
            })
            .collect();
        f.debug_struct("BuildJobSpec")
            .field("target", &self.target)
            .field("output_dir", &self.output_dir)
            .field("product_name", &self.product_name)
            .field("version", &self.version)
            .field("build_number", &self.build_number)
            .field("options", &options)
            .finish()
    }
}

fn is_secret_key(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key.contains("pass") || key.contains("secret") || key.contains("token")
}

/// Deterministic digest of an ordered job plan.
///
/// Covers target, output path, version and build number. Options are
/// excluded so credentials never influence the digest.
pub fn compute_plan_digest<'a, I>(specs: I) -> String
where
    I: IntoIterator<Item = &'a BuildJobSpec>,
{
    let mut hasher = Sha256::new();
    for spec in specs {
        hasher.update(spec.target.name().as_bytes());
        hasher.update(b"\0");
        hasher.update(spec.output_path().to_string_lossy().as_bytes());
        hasher.update(b"\0");
        hasher.update(spec.version.as_bytes());
        hasher.update(b"\0");
        hasher.update(spec.build_number.as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}
