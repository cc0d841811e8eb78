//! Exit codes for the cvar-grid CLI.
//!
//! Exit codes communicate the outcome without requiring output parsing.
//!
//! Exit code ranges:
//! - 0-9: Operational outcomes (the command ran; the code says how it ended)
//! - 10-19: User/environment errors (recoverable by user action)
//! - 20-29: Internal errors (bugs, should be reported)

use crate::error::Error;

/// Exit codes for cvar-grid operations.
///
/// These codes are a stable contract for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success; a solve converged
    Clean = 0,

    /// Solved, but the sweep cap was reached before convergence
    Capped = 1,

    /// The illustrative path revisited a state before reaching a goal
    PathCycle = 5,

    /// Invalid arguments (bad alpha, unknown cell)
    ArgsError = 10,

    /// Configuration could not be loaded or failed validation
    ConfigError = 11,

    /// Internal error (bug - please report)
    InternalError = 20,

    /// I/O error, including unreadable or mismatched snapshots
    IoError = 21,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the code name as a string constant (for JSON output).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::Capped => "OK_CAPPED",
            ExitCode::PathCycle => "OK_PATH_CYCLE",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }

    /// Map an error to the exit code the CLI reports for it.
    pub fn for_error(error: &Error) -> ExitCode {
        match error {
            Error::Config(_) | Error::Validation(_) => ExitCode::ConfigError,
            Error::Cvar(cg_math::CvarError::InvalidAlpha { .. }) | Error::UnknownState { .. } => {
                ExitCode::ArgsError
            }
            Error::PathCycle { .. } => ExitCode::PathCycle,
            Error::Io(_)
            | Error::Json(_)
            | Error::SchemaMismatch { .. }
            | Error::CorruptSnapshot(_) => ExitCode::IoError,
            Error::Cvar(_) | Error::InvalidTransitions { .. } | Error::NoActions { .. } => {
                ExitCode::InternalError
            }
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cg_common::State;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Clean.as_i32(), 0);
        assert_eq!(ExitCode::Capped.as_i32(), 1);
        assert_eq!(ExitCode::PathCycle.as_i32(), 5);
        assert_eq!(ExitCode::ArgsError.as_i32(), 10);
        assert_eq!(ExitCode::ConfigError.as_i32(), 11);
        assert_eq!(ExitCode::InternalError.as_i32(), 20);
        assert_eq!(ExitCode::IoError.as_i32(), 21);
    }

    #[test]
    fn test_error_mapping() {
        let cycle = Error::PathCycle {
            state: State::new(0, 0),
            steps: 1,
        };
        assert_eq!(ExitCode::for_error(&cycle), ExitCode::PathCycle);
        let alpha = Error::from(cg_math::CvarError::InvalidAlpha { alpha: 0.0 });
        assert_eq!(ExitCode::for_error(&alpha), ExitCode::ArgsError);
        let corrupt = Error::CorruptSnapshot("bad".to_string());
        assert_eq!(ExitCode::for_error(&corrupt), ExitCode::IoError);
    }

    #[test]
    fn test_display() {
        assert_eq!(ExitCode::Capped.to_string(), "OK_CAPPED (1)");
    }
}
