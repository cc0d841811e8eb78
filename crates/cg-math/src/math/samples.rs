//! Empirical risk estimates from return samples.

use super::{check_alpha, CvarError, Result};

/// Empirical VaR and CVaR at `alpha` from a sample of returns.
///
/// Sorts ascending and averages the `round(alpha * n)` smallest samples
/// (at least one). Returns `(var, cvar)`.
pub fn empirical_var_cvar(samples: &[f64], alpha: f64) -> Result<(f64, f64)> {
    check_alpha(alpha)?;
    if samples.is_empty() {
        return Err(CvarError::EmptyDistribution {
            context: "empirical_var_cvar".to_string(),
        });
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let k = ((alpha * sorted.len() as f64).round() as usize).clamp(1, sorted.len());
    let var = sorted[k - 1];
    let cvar = sorted[..k].iter().sum::<f64>() / k as f64;
    Ok((var, cvar))
}
