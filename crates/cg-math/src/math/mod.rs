//! Core math modules.

pub mod atoms;
pub mod backup;
pub mod curve;
pub mod samples;

use thiserror::Error;

/// Result alias for curve algebra.
pub type Result<T> = std::result::Result<T, CvarError>;

/// Errors raised by the curve algebra.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CvarError {
    #[error("invalid alpha: must be in (0, 1], got {alpha}")]
    InvalidAlpha { alpha: f64 },

    #[error("empty distribution: {context}")]
    EmptyDistribution { context: String },

    #[error("length mismatch in {context}: expected {expected}, got {actual}")]
    LengthMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    #[error("invalid atom grid: {message}")]
    InvalidAtoms { message: String },
}

/// Check that `alpha` is a usable risk level for a CVaR query.
///
/// CVaR at exactly 0 is the essential infimum and is tracked separately,
/// so 0 is rejected here along with anything outside (0, 1].
pub fn check_alpha(alpha: f64) -> Result<()> {
    if alpha.is_nan() || alpha <= 0.0 || alpha > 1.0 {
        return Err(CvarError::InvalidAlpha { alpha });
    }
    Ok(())
}
