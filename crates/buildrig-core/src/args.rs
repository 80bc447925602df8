//! Editor-style `-name value` argument lookup.

use crate::target::BuildTarget;

/// Named key/value lookup over a raw process argument list.
///
/// Flags use the single-dash long form the editor accepts
/// (`-buildPath Builds/Android`). A flag only yields a value when the next
/// token exists and is not itself a flag; callers supply their own
/// defaults for anything missing.
#[derive(Debug, Clone, Default)]
pub struct ArgumentSource {
    args: Vec<String>,
}

impl ArgumentSource {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Capture the current process arguments.
    pub fn from_env() -> Self {
        Self::new(std::env::args())
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Value following `-<name>`, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        let flag = format!("-{name}");
        self.args
            .windows(2)
            .find(|pair| pair[0] == flag && !is_flag_token(&pair[1]))
            .map(|pair| pair[1].as_str())
    }

    /// Value following `-<name>`, or `default` when absent.
    pub fn get_or(&self, name: &str, default: &str) -> String {
        self.get(name).unwrap_or(default).to_string()
    }

    /// Whether the bare token `-<name>` appears anywhere.
    pub fn has_flag(&self, name: &str) -> bool {
        let flag = format!("-{name}");
        self.args.iter().any(|arg| *arg == flag)
    }

    /// The build script method named by `-executeMethod`, if recognized.
    pub fn execute_method(&self) -> Option<ScriptMethod> {
        self.get("executeMethod").and_then(ScriptMethod::parse)
    }
}

/// A token is a flag when it starts with `-` followed by a letter, so
/// negative numbers still count as values.
fn is_flag_token(token: &str) -> bool {
    let rest = token.strip_prefix('-').map(|t| t.strip_prefix('-').unwrap_or(t));
    matches!(rest.and_then(|r| r.chars().next()), Some(c) if c.is_ascii_alphabetic())
}

/// Entry points a CI job can name with `-executeMethod`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptMethod {
    Build(Vec<BuildTarget>),
    ClearBuildFolder,
}

impl ScriptMethod {
    /// Parse `BuildScript.BuildAndroidAAB` style names. The class prefix is
    /// optional.
    pub fn parse(value: &str) -> Option<Self> {
        let method = value.rsplit('.').next().unwrap_or(value);
        let method = match method {
            "BuildWindows" => ScriptMethod::Build(vec![BuildTarget::WindowsDesktop]),
            "BuildAndroidAPK" => ScriptMethod::Build(vec![BuildTarget::AndroidPackage]),
            "BuildAndroidAAB" => ScriptMethod::Build(vec![BuildTarget::AndroidBundle]),
            "BuildiOS" => ScriptMethod::Build(vec![BuildTarget::IosProject]),
            "BuildAllPlatforms" => ScriptMethod::Build(BuildTarget::ALL.to_vec()),
            "ClearBuildFolder" => ScriptMethod::ClearBuildFolder,
            _ => return None,
        };
        Some(method)
    }
}
