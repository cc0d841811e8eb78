//! Error types for cvar-grid.
//!
//! Errors carry a stable numeric code, a category for grouping, and a
//! recoverability hint for automation:
//!
//! ```json
//! {
//!   "code": 30,
//!   "category": "risk",
//!   "message": "risk level error: alpha must be in (0, 1], got 0",
//!   "recoverable": true
//! }
//! ```

use cg_common::{Action, State};
use cg_config::{ConfigError, ValidationError};
use cg_math::CvarError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for cvar-grid operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Configuration file and validation errors.
    Config,
    /// Invalid risk levels.
    Risk,
    /// Environment contract violations.
    Environment,
    /// Degenerate distributions and grids.
    Numerical,
    /// Persisted value function errors.
    Persistence,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Risk => write!(f, "risk"),
            ErrorCategory::Environment => write!(f, "environment"),
            ErrorCategory::Numerical => write!(f, "numerical"),
            ErrorCategory::Persistence => write!(f, "persistence"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for cvar-grid.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid configuration: {0}")]
    Validation(#[from] ValidationError),

    // Risk and numerical errors (30-39)
    #[error("risk level error: {0}")]
    Cvar(#[from] CvarError),

    // Environment errors (40-49)
    #[error("invalid transitions for {state} {action}: {message}")]
    InvalidTransitions {
        state: State,
        action: Action,
        message: String,
    },

    #[error("state {state} is not part of the value grid")]
    UnknownState { state: State },

    #[error("state {state} offers no actions")]
    NoActions { state: State },

    #[error("optimal path revisits {state} after {steps} steps without reaching a goal")]
    PathCycle { state: State, steps: usize },

    // Persistence errors (50-59)
    #[error("snapshot schema mismatch: expected {expected}, got {actual}")]
    SchemaMismatch { expected: String, actual: String },

    #[error("corrupt snapshot: {0}")]
    CorruptSnapshot(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Configuration errors
    /// - 30-39: Risk and numerical errors
    /// - 40-49: Environment errors
    /// - 50-59: Persistence errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::Validation(_) => 11,
            Error::Cvar(CvarError::InvalidAlpha { .. }) => 30,
            Error::Cvar(CvarError::EmptyDistribution { .. }) => 31,
            Error::Cvar(CvarError::LengthMismatch { .. }) => 32,
            Error::Cvar(CvarError::InvalidAtoms { .. }) => 33,
            Error::InvalidTransitions { .. } => 40,
            Error::UnknownState { .. } => 41,
            Error::NoActions { .. } => 42,
            Error::PathCycle { .. } => 43,
            Error::SchemaMismatch { .. } => 50,
            Error::CorruptSnapshot(_) => 51,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::Validation(_) => ErrorCategory::Config,

            Error::Cvar(CvarError::InvalidAlpha { .. }) => ErrorCategory::Risk,
            Error::Cvar(_) => ErrorCategory::Numerical,

            Error::InvalidTransitions { .. }
            | Error::UnknownState { .. }
            | Error::NoActions { .. }
            | Error::PathCycle { .. } => ErrorCategory::Environment,

            Error::SchemaMismatch { .. } | Error::CorruptSnapshot(_) => ErrorCategory::Persistence,

            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns whether this error is potentially recoverable by the caller.
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Fix the config file or pick a preset
            Error::Config(_) | Error::Validation(_) => true,

            // Ask again with a valid alpha
            Error::Cvar(CvarError::InvalidAlpha { .. }) => true,
            Error::Cvar(_) => false,

            // The environment broke its contract; a programming error
            Error::InvalidTransitions { .. } | Error::UnknownState { .. } | Error::NoActions { .. } => {
                false
            }
            // Diagnostic only; the value function is still usable
            Error::PathCycle { .. } => true,

            // Re-solve to regenerate the snapshot
            Error::SchemaMismatch { .. } | Error::CorruptSnapshot(_) => true,

            Error::Io(_) => true,
            Error::Json(_) => false,
        }
    }

    /// Structured form for JSON error output.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "code": self.code(),
            "category": self.category(),
            "message": self.to_string(),
            "recoverable": self.is_recoverable(),
        })
    }
}
