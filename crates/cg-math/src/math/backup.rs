//! Sort-based combination of CVaR curves over a transition mixture.
//!
//! A one-step backup sees, for each transition of a (state, action) pair, the
//! child state's quantile step function shifted by `reward + gamma * value`.
//! Flattening every (transition probability × interval mass, quantile) pair
//! and sorting by quantile yields the exact quantile function of the mixture;
//! integrating it gives the CVaR curve, which is then sampled at the target
//! state's own atom grid.

use super::atoms::atom_masses;
use super::curve::yc_to_var;
use super::{check_alpha, CvarError, Result};

/// One transition of a mixture: its probability, the child's atom grid, and
/// the child's quantile values already shifted by reward and discount.
#[derive(Debug, Clone)]
pub struct Branch<'a> {
    pub prob: f64,
    pub atoms: &'a [f64],
    pub values: Vec<f64>,
}

impl<'a> Branch<'a> {
    pub fn new(prob: f64, atoms: &'a [f64], values: Vec<f64>) -> Self {
        Branch {
            prob,
            atoms,
            values,
        }
    }

    /// Branch whose values are `reward + gamma * child_var`.
    pub fn shifted(prob: f64, reward: f64, gamma: f64, atoms: &'a [f64], child_var: &[f64]) -> Self {
        let values = child_var.iter().map(|v| reward + gamma * v).collect();
        Branch {
            prob,
            atoms,
            values,
        }
    }
}

/// A single probability-weighted quantile value of the flattened mixture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Piece {
    pub mass: f64,
    /// Index of the branch the piece came from.
    pub branch: usize,
    pub value: f64,
}

/// Curve samples at a target grid, with the matching quantile values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CurveSample {
    pub var: Vec<f64>,
    pub yc: Vec<f64>,
}

/// VaR, CVaR and risk-envelope weights at one fixed risk level.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedAlpha {
    pub var: f64,
    pub cvar: f64,
    /// Per-branch fraction of its mass inside the alpha-worst set, in [0, 1].
    /// This is the risk level to continue with after that branch is realised.
    pub xis: Vec<f64>,
}

fn check_branches(branches: &[Branch<'_>], context: &str) -> Result<()> {
    if branches.is_empty() {
        return Err(CvarError::EmptyDistribution {
            context: context.to_string(),
        });
    }
    for branch in branches {
        let expected = branch.atoms.len().saturating_sub(1);
        if branch.values.len() != expected || expected == 0 {
            return Err(CvarError::LengthMismatch {
                context: context.to_string(),
                expected,
                actual: branch.values.len(),
            });
        }
    }
    Ok(())
}

/// Flatten a mixture into weighted quantile pieces sorted ascending by value.
///
/// Ties keep no particular order; they do not change any integral over the
/// sorted sequence.
pub fn extract_distribution(branches: &[Branch<'_>]) -> Vec<Piece> {
    let total: usize = branches.iter().map(|b| b.values.len()).sum();
    let mut pieces = Vec::with_capacity(total);
    for (ix, branch) in branches.iter().enumerate() {
        let masses = atom_masses(branch.atoms);
        for (mass, &value) in masses.iter().zip(&branch.values) {
            pieces.push(Piece {
                mass: branch.prob * mass,
                branch: ix,
                value,
            });
        }
    }
    pieces.sort_by(|a, b| a.value.total_cmp(&b.value));
    pieces
}

/// Combine a mixture into a CVaR curve sampled at `target_atoms`.
pub fn combine_sorted(target_atoms: &[f64], branches: &[Branch<'_>]) -> Result<CurveSample> {
    check_branches(branches, "combine_sorted")?;
    if target_atoms.len() < 2 {
        return Err(CvarError::InvalidAtoms {
            message: format!("target grid has {} atoms", target_atoms.len()),
        });
    }

    let pieces = extract_distribution(branches);
    let mut yc = Vec::with_capacity(target_atoms.len() - 1);
    let mut p = 0.0;
    let mut y = 0.0;
    let mut ix = 0;
    for &atom in &target_atoms[1..] {
        while ix < pieces.len() && p + pieces[ix].mass <= atom {
            p += pieces[ix].mass;
            y += pieces[ix].mass * pieces[ix].value;
            ix += 1;
        }
        let partial = match pieces.get(ix) {
            Some(piece) => (atom - p).max(0.0) * piece.value,
            None => 0.0,
        };
        yc.push(y + partial);
    }

    let var = yc_to_var(target_atoms, &yc);
    Ok(CurveSample { var, yc })
}

/// VaR, CVaR and xi weights of the mixture at a single risk level, in one
/// sorted sweep.
pub fn single_var_yc_xis(branches: &[Branch<'_>], alpha: f64) -> Result<FixedAlpha> {
    check_alpha(alpha)?;
    check_branches(branches, "single_var_yc_xis")?;

    let pieces = extract_distribution(branches);
    let mut xis = vec![0.0; branches.len()];
    let mut p = 0.0;
    let mut yc = 0.0;
    let mut var = f64::NAN;
    let mut reached = false;
    for piece in &pieces {
        if p + piece.mass >= alpha {
            let take = alpha - p;
            xis[piece.branch] += take;
            yc += take * piece.value;
            var = piece.value;
            reached = true;
            break;
        }
        xis[piece.branch] += piece.mass;
        yc += piece.mass * piece.value;
        p += piece.mass;
        var = piece.value;
    }

    let cvar = if reached {
        yc / alpha
    } else if p > 0.0 {
        // Total mass fell short of alpha = 1 by rounding.
        yc / p
    } else {
        return Err(CvarError::EmptyDistribution {
            context: "single_var_yc_xis: mixture has no mass".to_string(),
        });
    };

    for (xi, branch) in xis.iter_mut().zip(branches) {
        *xi = if branch.prob > 0.0 {
            (*xi / branch.prob).clamp(0.0, 1.0)
        } else {
            0.0
        };
    }

    Ok(FixedAlpha { var, cvar, xis })
}

/// Discounted worst-case (alpha -> 0) value of a transition mixture: the
/// minimum over its support of `reward + gamma * child_c0`.
pub fn worst_case_limit<I>(outcomes: I, gamma: f64) -> Result<f64>
where
    I: IntoIterator<Item = (f64, f64)>,
{
    outcomes
        .into_iter()
        .map(|(reward, child_c0)| reward + gamma * child_c0)
        .reduce(f64::min)
        .ok_or_else(|| CvarError::EmptyDistribution {
            context: "worst_case_limit".to_string(),
        })
}

/// Strategy for combining weighted child quantile arrays into a new curve
/// at a target grid.
pub trait CurveBackup: Send + Sync {
    fn name(&self) -> &'static str;

    fn combine(&self, target_atoms: &[f64], branches: &[Branch<'_>]) -> Result<CurveSample>;
}

/// Exact combination by sorting the flattened mixture.
#[derive(Debug, Clone, Copy, Default)]
pub struct SortBackup;

impl CurveBackup for SortBackup {
    fn name(&self) -> &'static str {
        "sort"
    }

    fn combine(&self, target_atoms: &[f64], branches: &[Branch<'_>]) -> Result<CurveSample> {
        combine_sorted(target_atoms, branches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    const HALF: [f64; 3] = [0.0, 0.5, 1.0];
    const WHOLE: [f64; 2] = [0.0, 1.0];
    const QUARTERS: [f64; 5] = [0.0, 0.25, 0.5, 0.75, 1.0];

    fn mixture() -> Vec<Branch<'static>> {
        vec![
            Branch::new(0.5, &HALF, vec![0.0, 10.0]),
            Branch::new(0.5, &WHOLE, vec![4.0]),
        ]
    }

    #[test]
    fn extract_sorts_ascending() {
        let pieces = extract_distribution(&mixture());
        let values: Vec<f64> = pieces.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![0.0, 4.0, 10.0]);
        let masses: Vec<f64> = pieces.iter().map(|p| p.mass).collect();
        assert_eq!(masses, vec![0.25, 0.5, 0.25]);
        assert_eq!(pieces[1].branch, 1);
    }

    #[test]
    fn combine_mixture_at_quarters() {
        let sample = combine_sorted(&QUARTERS, &mixture()).unwrap();
        let expected_yc = [0.0, 1.0, 2.0, 4.5];
        let expected_var = [0.0, 4.0, 4.0, 10.0];
        for (a, b) in sample.yc.iter().zip(expected_yc) {
            assert!(approx_eq(*a, b, 1e-12), "yc {:?}", sample.yc);
        }
        for (a, b) in sample.var.iter().zip(expected_var) {
            assert!(approx_eq(*a, b, 1e-12), "var {:?}", sample.var);
        }
    }

    #[test]
    fn combine_deterministic_branch_is_linear() {
        let branches = vec![Branch::shifted(1.0, -0.15, 0.95, &HALF, &[2.0, 2.0])];
        let sample = combine_sorted(&QUARTERS, &branches).unwrap();
        let v = -0.15 + 0.95 * 2.0;
        for (atom, y) in QUARTERS[1..].iter().zip(&sample.yc) {
            assert!(approx_eq(*y, atom * v, 1e-12));
        }
    }

    #[test]
    fn fixed_alpha_matches_curve() {
        let fixed = single_var_yc_xis(&mixture(), 0.5).unwrap();
        assert!(approx_eq(fixed.var, 4.0, 1e-12));
        assert!(approx_eq(fixed.cvar, 2.0, 1e-12));
        assert!(approx_eq(fixed.xis[0], 0.5, 1e-12));
        assert!(approx_eq(fixed.xis[1], 0.5, 1e-12));
    }

    #[test]
    fn fixed_alpha_one_is_mean_with_full_xis() {
        let fixed = single_var_yc_xis(&mixture(), 1.0).unwrap();
        assert!(approx_eq(fixed.cvar, 4.5, 1e-12));
        assert!(approx_eq(fixed.var, 10.0, 1e-12));
        for xi in fixed.xis {
            assert!(approx_eq(xi, 1.0, 1e-12));
        }
    }

    #[test]
    fn fixed_alpha_small_level_targets_worst_branch() {
        let fixed = single_var_yc_xis(&mixture(), 0.1).unwrap();
        assert!(approx_eq(fixed.cvar, 0.0, 1e-12));
        assert!(approx_eq(fixed.xis[0], 0.2, 1e-12));
        assert!(approx_eq(fixed.xis[1], 0.0, 1e-12));
    }

    #[test]
    fn fixed_alpha_rejects_zero() {
        assert!(matches!(
            single_var_yc_xis(&mixture(), 0.0),
            Err(CvarError::InvalidAlpha { .. })
        ));
    }

    #[test]
    fn empty_mixture_is_an_error() {
        assert!(matches!(
            combine_sorted(&QUARTERS, &[]),
            Err(CvarError::EmptyDistribution { .. })
        ));
    }

    #[test]
    fn mismatched_branch_is_an_error() {
        let bad = vec![Branch::new(1.0, &HALF, vec![1.0])];
        assert!(matches!(
            combine_sorted(&QUARTERS, &bad),
            Err(CvarError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn worst_case_takes_minimum_over_support() {
        let limit = worst_case_limit([(-0.15, 3.0), (-1.0, -2.0), (-0.15, 0.0)], 0.5).unwrap();
        assert!(approx_eq(limit, -2.0, 1e-12));
        assert!(worst_case_limit(std::iter::empty(), 0.5).is_err());
    }

    #[test]
    fn sort_backup_delegates() {
        let strategy = SortBackup;
        assert_eq!(strategy.name(), "sort");
        let direct = combine_sorted(&QUARTERS, &mixture()).unwrap();
        let via_trait = strategy.combine(&QUARTERS, &mixture()).unwrap();
        assert_eq!(direct, via_trait);
    }
}
