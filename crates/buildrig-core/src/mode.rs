//! Interactive vs unattended execution detection.

use serde::{Deserialize, Serialize};

/// How the process was launched. Decided once per run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// A person is driving the session; the driver must hand control back.
    Interactive,

    /// CI or batch invocation; the process ends with an exit code.
    Unattended,
}

impl ExecutionMode {
    pub fn is_unattended(&self) -> bool {
        matches!(self, ExecutionMode::Unattended)
    }
}

/// Tokens that mark a headless or single-method invocation.
const UNATTENDED_FLAGS: &[&str] = &[
    "-batchmode",
    "-executeMethod",
    "-quit",
    "--batchmode",
    "--quit",
];

pub struct ModeDetector;

impl ModeDetector {
    pub fn detect<S: AsRef<str>>(args: &[S]) -> ExecutionMode {
        let unattended = args
            .iter()
            .any(|arg| UNATTENDED_FLAGS.contains(&arg.as_ref()));
        if unattended {
            ExecutionMode::Unattended
        } else {
            ExecutionMode::Interactive
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_invocation_is_interactive() {
        let args = ["buildrig", "build", "windows"];
        assert_eq!(ModeDetector::detect(&args), ExecutionMode::Interactive);
    }

    #[test]
    fn test_each_flag_triggers_unattended() {
        for flag in ["-batchmode", "-quit", "-executeMethod", "--batchmode"] {
            let args = vec!["editor".to_string(), flag.to_string()];
            assert_eq!(
                ModeDetector::detect(&args),
                ExecutionMode::Unattended,
                "{flag} should mark an unattended run"
            );
        }
    }

    #[test]
    fn test_flag_as_value_substring_does_not_count() {
        let args = ["-buildPath", "-batchmode-output"];
        assert_eq!(ModeDetector::detect(&args), ExecutionMode::Interactive);
    }

    #[test]
    fn test_empty_args() {
        let args: [&str; 0] = [];
        assert!(!ModeDetector::detect(&args).is_unattended());
    }
}
