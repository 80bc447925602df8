//! Build target definitions and artifact layout.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BuildError;

/// Platform variants a build job can produce.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BuildTarget {
    /// 64-bit Windows standalone player (`.exe`).
    #[serde(rename = "windows")]
    WindowsDesktop,

    /// Android package (`.apk`).
    #[serde(rename = "android-apk")]
    AndroidPackage,

    /// Android App Bundle (`.aab`).
    #[serde(rename = "android-aab")]
    AndroidBundle,

    /// iOS Xcode project directory (`<productName>/`).
    #[serde(rename = "ios")]
    IosProject,
}

/// Platform family. Targets in the same family share host settings
/// (signing, SDK modules).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Windows,
    Android,
    Ios,
}

impl BuildTarget {
    /// Every target, in the order a full build runs them.
    pub const ALL: [BuildTarget; 4] = [
        BuildTarget::WindowsDesktop,
        BuildTarget::AndroidPackage,
        BuildTarget::AndroidBundle,
        BuildTarget::IosProject,
    ];

    /// Stable identifier, used in config keys and on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            BuildTarget::WindowsDesktop => "windows",
            BuildTarget::AndroidPackage => "android-apk",
            BuildTarget::AndroidBundle => "android-aab",
            BuildTarget::IosProject => "ios",
        }
    }

    /// Human-readable label for log banners.
    pub fn label(&self) -> &'static str {
        match self {
            BuildTarget::WindowsDesktop => "Windows Standalone",
            BuildTarget::AndroidPackage => "Android APK",
            BuildTarget::AndroidBundle => "Android App Bundle (AAB)",
            BuildTarget::IosProject => "iOS Xcode Project",
        }
    }

    pub fn platform(&self) -> Platform {
        match self {
            BuildTarget::WindowsDesktop => Platform::Windows,
            BuildTarget::AndroidPackage | BuildTarget::AndroidBundle => Platform::Android,
            BuildTarget::IosProject => Platform::Ios,
        }
    }

    /// Base output directory used when `-buildPath` is not given.
    pub fn default_build_path(&self) -> &'static str {
        match self.platform() {
            Platform::Windows => "Builds/Windows",
            Platform::Android => "Builds/Android",
            Platform::Ios => "Builds/iOS",
        }
    }

    /// File extension of the artifact, or `None` when the artifact is a
    /// project directory.
    pub fn artifact_extension(&self) -> Option<&'static str> {
        match self {
            BuildTarget::WindowsDesktop => Some("exe"),
            BuildTarget::AndroidPackage => Some("apk"),
            BuildTarget::AndroidBundle => Some("aab"),
            BuildTarget::IosProject => None,
        }
    }

    /// Artifact location inside a versioned output directory.
    ///
    /// The iOS project gets its own `<productName>` subdirectory so it never
    /// overlaps with other targets sharing the same build path.
    pub fn artifact_path(&self, version_dir: &Path, product_name: &str) -> PathBuf {
        match self.artifact_extension() {
            Some(ext) => version_dir.join(format!("{product_name}.{ext}")),
            None => version_dir.join(product_name),
        }
    }
}

impl fmt::Display for BuildTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BuildTarget {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "windows" | "win" | "win64" => Ok(BuildTarget::WindowsDesktop),
            "android-apk" | "apk" => Ok(BuildTarget::AndroidPackage),
            "android-aab" | "aab" => Ok(BuildTarget::AndroidBundle),
            "ios" | "iphone" => Ok(BuildTarget::IosProject),
            _ => Err(BuildError::InvalidTarget(s.to_string())),
        }
    }
}
