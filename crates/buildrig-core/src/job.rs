//! Platform build jobs and their resolution from invocation arguments.

use std::path::PathBuf;

use tracing::debug;

use crate::args::ArgumentSource;
use crate::config::ProjectDefaults;
use crate::spec::BuildJobSpec;
use crate::target::{BuildTarget, Platform};

pub const KEYSTORE_PATH: &str = "keystore_path";
pub const KEYSTORE_PASS: &str = "keystore_pass";
pub const KEYALIAS_NAME: &str = "keyalias_name";
pub const KEYALIAS_PASS: &str = "keyalias_pass";

/// Android release signing credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningCredentials {
    pub keystore_path: String,
    pub keystore_pass: String,
    pub keyalias_name: String,
    pub keyalias_pass: String,
}

impl SigningCredentials {
    /// Read `-keystorePath`, `-keystorePass`, `-keyaliasName` and
    /// `-keyaliasPass`. Credentials only count when a keystore path is given.
    pub fn from_args(args: &ArgumentSource) -> Option<Self> {
        let keystore_path = args.get("keystorePath").filter(|p| !p.is_empty())?;
        Some(Self {
            keystore_path: keystore_path.to_string(),
            keystore_pass: args.get_or("keystorePass", ""),
            keyalias_name: args.get_or("keyaliasName", ""),
            keyalias_pass: args.get_or("keyaliasPass", ""),
        })
    }
}

impl std::fmt::Debug for SigningCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningCredentials")
            .field("keystore_path", &self.keystore_path)
            .field("keyalias_name", &self.keyalias_name)
            .finish_non_exhaustive()
    }
}

/// One platform's build step.
///
/// Platform differences live entirely in construction; execution is the
/// same for every target.
#[derive(Debug, Clone)]
pub struct PlatformBuildJob {
    spec: BuildJobSpec,
    warnings: Vec<String>,
}

impl PlatformBuildJob {
    pub fn new(spec: BuildJobSpec) -> Self {
        Self {
            spec,
            warnings: Vec::new(),
        }
    }

    pub fn windows(
        base_path: impl Into<PathBuf>,
        product_name: &str,
        version: &str,
        build_number: &str,
    ) -> Self {
        Self::new(BuildJobSpec::new(
            BuildTarget::WindowsDesktop,
            base_path,
            product_name,
            version,
            build_number,
        ))
    }

    pub fn android_apk(
        base_path: impl Into<PathBuf>,
        product_name: &str,
        version: &str,
        build_number: &str,
        signing: Option<SigningCredentials>,
    ) -> Self {
        Self::android(
            BuildTarget::AndroidPackage,
            base_path.into(),
            product_name,
            version,
            build_number,
            signing,
        )
    }

    pub fn android_aab(
        base_path: impl Into<PathBuf>,
        product_name: &str,
        version: &str,
        build_number: &str,
        signing: Option<SigningCredentials>,
    ) -> Self {
        Self::android(
            BuildTarget::AndroidBundle,
            base_path.into(),
            product_name,
            version,
            build_number,
            signing,
        )
    }

    pub fn ios(
        base_path: impl Into<PathBuf>,
        product_name: &str,
        version: &str,
        build_number: &str,
    ) -> Self {
        Self::new(BuildJobSpec::new(
            BuildTarget::IosProject,
            base_path,
            product_name,
            version,
            build_number,
        ))
    }

    fn android(
        target: BuildTarget,
        base_path: PathBuf,
        product_name: &str,
        version: &str,
        build_number: &str,
        signing: Option<SigningCredentials>,
    ) -> Self {
        let mut spec = BuildJobSpec::new(target, base_path, product_name, version, build_number);
        let mut warnings = Vec::new();

        match signing {
            Some(creds) => {
                spec = spec
                    .with_option(KEYSTORE_PATH, creds.keystore_path)
                    .with_option(KEYSTORE_PASS, creds.keystore_pass)
                    .with_option(KEYALIAS_NAME, creds.keyalias_name)
                    .with_option(KEYALIAS_PASS, creds.keyalias_pass);
            }
            None => warnings
                .push("no keystore provided, falling back to debug signing".to_string()),
        }

        if build_number.parse::<u32>().is_err() {
            warnings.push(format!(
                "build number '{build_number}' is not an integer; version code left unchanged"
            ));
        }

        Self { spec, warnings }
    }

    pub fn target(&self) -> BuildTarget {
        self.spec.target
    }

    pub fn spec(&self) -> &BuildJobSpec {
        &self.spec
    }

    pub fn output_path(&self) -> PathBuf {
        self.spec.output_path()
    }

    /// Non-fatal issues found while constructing the job.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

/// Resolves jobs from the CLI surface and persisted defaults.
pub struct JobPlan;

impl JobPlan {
    /// Build the job for `target` from `-buildPath`, `-versionNumber`,
    /// `-buildNumber` and, for Android, the signing flags.
    pub fn resolve(
        target: BuildTarget,
        args: &ArgumentSource,
        defaults: &ProjectDefaults,
    ) -> PlatformBuildJob {
        let base_path = args.get_or("buildPath", target.default_build_path());
        let version = args.get_or("versionNumber", &defaults.version);
        let build_number = args.get_or("buildNumber", &defaults.build_number);
        let product = defaults.product_name.as_str();

        debug!(
            platform = %target,
            base_path = %base_path,
            version = %version,
            build_number = %build_number,
            "Resolved job parameters"
        );

        match target.platform() {
            Platform::Windows => PlatformBuildJob::windows(base_path, product, &version, &build_number),
            Platform::Ios => PlatformBuildJob::ios(base_path, product, &version, &build_number),
            Platform::Android => {
                let signing = SigningCredentials::from_args(args);
                PlatformBuildJob::android(
                    target,
                    PathBuf::from(base_path),
                    product,
                    &version,
                    &build_number,
                    signing,
                )
            }
        }
    }

    pub fn resolve_all(
        targets: &[BuildTarget],
        args: &ArgumentSource,
        defaults: &ProjectDefaults,
    ) -> Vec<PlatformBuildJob> {
        targets
            .iter()
            .map(|target| Self::resolve(*target, args, defaults))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(tokens: &[&str]) -> ArgumentSource {
        ArgumentSource::new(tokens.iter().copied())
    }

    #[test]
    fn test_resolve_uses_defaults_when_flags_missing() {
        let job = JobPlan::resolve(
            BuildTarget::WindowsDesktop,
            &args(&["editor"]),
            &ProjectDefaults::default(),
        );
        assert_eq!(job.spec().version, "1.0.0");
        assert_eq!(job.spec().build_number, "1");
        assert_eq!(job.output_path(), PathBuf::from("Builds/Windows/1.0.0/Game.exe"));
        assert!(job.warnings().is_empty());
    }

    #[test]
    fn test_resolve_applies_overrides() {
        let job = JobPlan::resolve(
            BuildTarget::IosProject,
            &args(&["-buildPath", "out/ios", "-versionNumber", "2.0.1", "-buildNumber", "42"]),
            &ProjectDefaults::default(),
        );
        assert_eq!(job.output_path(), PathBuf::from("out/ios/2.0.1/Game"));
        assert_eq!(job.spec().build_number, "42");
    }

    #[test]
    fn test_android_without_keystore_warns() {
        let job = JobPlan::resolve(
            BuildTarget::AndroidBundle,
            &args(&["-versionNumber", "1.1.0"]),
            &ProjectDefaults::default(),
        );
        assert_eq!(job.output_path(), PathBuf::from("Builds/Android/1.1.0/Game.aab"));
        assert!(job.spec().option(KEYSTORE_PATH).is_none());
        assert_eq!(job.warnings().len(), 1);
        assert!(job.warnings()[0].contains("debug signing"));
    }

    #[test]
    fn test_android_with_keystore_carries_credentials() {
        let job = JobPlan::resolve(
            BuildTarget::AndroidPackage,
            &args(&[
                "-keystorePath",
                "release.keystore",
                "-keystorePass",
                "pw",
                "-keyaliasName",
                "upload",
                "-keyaliasPass",
                "pw2",
            ]),
            &ProjectDefaults::default(),
        );
        assert_eq!(job.spec().option(KEYSTORE_PATH), Some("release.keystore"));
        assert_eq!(job.spec().option(KEYALIAS_NAME), Some("upload"));
        assert_eq!(job.spec().option(KEYALIAS_PASS), Some("pw2"));
        assert!(job.warnings().is_empty());
    }

    #[test]
    fn test_non_numeric_build_number_warns_for_android() {
        let job = PlatformBuildJob::android_apk("out", "Game", "1.0.0", "nightly", None);
        assert!(job.warnings().iter().any(|w| w.contains("nightly")));
        assert_eq!(job.spec().build_number, "nightly");
    }

    #[test]
    fn test_signing_credentials_debug_hides_passwords() {
        let creds = SigningCredentials::from_args(&args(&[
            "-keystorePath",
            "k",
            "-keystorePass",
            "topsecret",
        ]))
        .expect("credentials");
        assert!(!format!("{:?}", creds).contains("topsecret"));
    }

    #[test]
    fn test_resolve_all_preserves_order() {
        let jobs = JobPlan::resolve_all(
            &BuildTarget::ALL,
            &args(&[]),
            &ProjectDefaults::default(),
        );
        let targets: Vec<_> = jobs.iter().map(|j| j.target()).collect();
        assert_eq!(targets, BuildTarget::ALL.to_vec());
    }
}
