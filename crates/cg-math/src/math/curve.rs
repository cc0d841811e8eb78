//! Conversions between a CVaR curve and its quantile (VaR) step function.
//!
//! A curve is stored as `yc[i] = atoms[i+1] * CVaR_{atoms[i+1]}`, one value per
//! atom above 0. Its discrete derivative is the quantile function, constant
//! on each atom interval.

use super::{check_alpha, CvarError, Result};

/// Quantile value on each atom interval: the slope of the curve between
/// consecutive atoms (with the implicit `yc(0) = 0`).
pub fn yc_to_var(atoms: &[f64], yc: &[f64]) -> Vec<f64> {
    let mut var = Vec::with_capacity(yc.len());
    let mut prev = 0.0;
    for (i, &y) in yc.iter().enumerate() {
        let width = atoms[i + 1] - atoms[i];
        var.push((y - prev) / width);
        prev = y;
    }
    var
}

/// Integrate a quantile step function back into curve samples.
pub fn var_to_yc(atom_p: &[f64], var: &[f64]) -> Vec<f64> {
    let mut acc = 0.0;
    atom_p
        .iter()
        .zip(var)
        .map(|(p, v)| {
            acc += p * v;
            acc
        })
        .collect()
}

/// CVaR at a single risk level from interval masses and quantile values.
///
/// Levels below the first atom resolve to the first quantile value, which is
/// the finest information the grid holds.
pub fn single_alpha_to_cvar(atom_p: &[f64], var: &[f64], alpha: f64) -> Result<f64> {
    check_alpha(alpha)?;
    if atom_p.len() != var.len() {
        return Err(CvarError::LengthMismatch {
            context: "single_alpha_to_cvar".to_string(),
            expected: atom_p.len(),
            actual: var.len(),
        });
    }
    if var.is_empty() {
        return Err(CvarError::EmptyDistribution {
            context: "single_alpha_to_cvar".to_string(),
        });
    }

    let mut p = 0.0;
    let mut cv = 0.0;
    for (&mass, &v) in atom_p.iter().zip(var) {
        if p + mass >= alpha {
            cv += (alpha - p) * v;
            return Ok(cv / alpha);
        }
        cv += mass * v;
        p += mass;
    }
    // Masses summed to slightly less than alpha = 1.
    Ok(cv / p)
}

/// Mean of the represented distribution.
pub fn expected_value(atom_p: &[f64], var: &[f64]) -> f64 {
    atom_p.iter().zip(var).map(|(p, v)| p * v).sum()
}

/// Whether a quantile sequence is non-decreasing up to `tol`.
pub fn is_monotone(var: &[f64], tol: f64) -> bool {
    var.windows(2).all(|w| w[1] >= w[0] - tol)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::atoms::{atom_masses, spaced_atoms};

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn var_yc_roundtrip() {
        let atoms = vec![0.0, 0.25, 0.5, 1.0];
        let atom_p = atom_masses(&atoms);
        let var = vec![-2.0, 1.0, 3.0];
        let yc = var_to_yc(&atom_p, &var);
        assert!(approx_eq(yc[0], -0.5, 1e-12));
        assert!(approx_eq(yc[1], -0.25, 1e-12));
        assert!(approx_eq(yc[2], 1.25, 1e-12));
        let back = yc_to_var(&atoms, &yc);
        for (a, b) in back.iter().zip(&var) {
            assert!(approx_eq(*a, *b, 1e-12));
        }
    }

    #[test]
    fn cvar_at_one_is_mean() {
        let atoms = spaced_atoms(5, 2.0, false);
        let atom_p = atom_masses(&atoms);
        let var = vec![-3.0, -1.0, 0.0, 2.0, 7.0];
        let mean = expected_value(&atom_p, &var);
        let cvar = single_alpha_to_cvar(&atom_p, &var, 1.0).unwrap();
        assert!(approx_eq(cvar, mean, 1e-12));
    }

    #[test]
    fn cvar_interpolates_within_interval() {
        let atom_p = vec![0.5, 0.5];
        let var = vec![0.0, 10.0];
        // Worst 75%: half at 0, quarter at 10.
        let cvar = single_alpha_to_cvar(&atom_p, &var, 0.75).unwrap();
        assert!(approx_eq(cvar, 2.5 / 0.75, 1e-12));
    }

    #[test]
    fn cvar_below_first_atom_uses_first_quantile() {
        let atom_p = vec![0.1, 0.9];
        let var = vec![-4.0, 1.0];
        let cvar = single_alpha_to_cvar(&atom_p, &var, 1e-9).unwrap();
        assert!(approx_eq(cvar, -4.0, 1e-9));
    }

    #[test]
    fn cvar_rejects_zero_alpha() {
        let err = single_alpha_to_cvar(&[1.0], &[1.0], 0.0).unwrap_err();
        assert_eq!(err, CvarError::InvalidAlpha { alpha: 0.0 });
    }

    #[test]
    fn cvar_rejects_mismatched_lengths() {
        assert!(matches!(
            single_alpha_to_cvar(&[0.5, 0.5], &[1.0], 0.5),
            Err(CvarError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn monotone_check() {
        assert!(is_monotone(&[-1.0, -1.0, 0.0, 5.0], 0.0));
        assert!(!is_monotone(&[0.0, -1.0], 1e-9));
    }
}
