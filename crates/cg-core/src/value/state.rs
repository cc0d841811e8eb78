//! One state's CVaR curve.

use cg_math::{
    atom_masses, expected_value, single_alpha_to_cvar, spaced_atoms, validate_atoms, yc_to_var,
    CvarError,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;

/// Smallest atom refinement will insert.
pub const MIN_REFINEMENT_STEP: f64 = 1e-15;

/// The distributional value of one state: `yc[i] = atoms[i+1] * CVaR_{atoms[i+1]}`
/// on the state's own atom grid, plus a separate estimate `c_0` of the
/// worst-case (alpha -> 0) limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateValue {
    atoms: Vec<f64>,
    yc: Vec<f64>,
    atom_p: Vec<f64>,
    c_0: f64,
}

impl StateValue {
    /// A zero curve on a fresh grid.
    pub fn new(nb_atoms: usize, spacing: f64, log_spaced: bool) -> Self {
        let atoms = spaced_atoms(nb_atoms, spacing, log_spaced);
        let atom_p = atom_masses(&atoms);
        StateValue {
            yc: vec![0.0; atom_p.len()],
            atoms,
            atom_p,
            c_0: 0.0,
        }
    }

    /// Rebuild a state value from stored parts, checking every invariant.
    pub fn from_parts(atoms: Vec<f64>, yc: Vec<f64>, c_0: f64) -> Result<Self> {
        let value = StateValue {
            atom_p: atom_masses(&atoms),
            atoms,
            yc,
            c_0,
        };
        value.validate()?;
        Ok(value)
    }

    /// Check grid invariants and that the stored masses match the grid.
    pub fn validate(&self) -> Result<()> {
        validate_atoms(&self.atoms)?;
        let n = self.atoms.len() - 1;
        for (context, len) in [("yc", self.yc.len()), ("atom_p", self.atom_p.len())] {
            if len != n {
                return Err(CvarError::LengthMismatch {
                    context: context.to_string(),
                    expected: n,
                    actual: len,
                }
                .into());
            }
        }
        let derived = atom_masses(&self.atoms);
        if derived
            .iter()
            .zip(&self.atom_p)
            .any(|(a, b)| (a - b).abs() > 1e-12)
        {
            return Err(CvarError::InvalidAtoms {
                message: "atom_p does not match the atom grid".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Number of atom intervals.
    pub fn nb_atoms(&self) -> usize {
        self.yc.len()
    }

    pub fn atoms(&self) -> &[f64] {
        &self.atoms
    }

    pub fn yc(&self) -> &[f64] {
        &self.yc
    }

    pub fn atom_p(&self) -> &[f64] {
        &self.atom_p
    }

    /// Worst-case (alpha -> 0) estimate.
    pub fn c_0(&self) -> f64 {
        self.c_0
    }

    /// Quantile value on each atom interval.
    pub fn var(&self) -> Vec<f64> {
        yc_to_var(&self.atoms, &self.yc)
    }

    /// CVaR at `alpha` in (0, 1]. Levels finer than the first atom resolve to
    /// the first quantile value; use [`StateValue::c_0`] for the limit at 0.
    pub fn cvar_at(&self, alpha: f64) -> Result<f64> {
        Ok(single_alpha_to_cvar(&self.atom_p, &self.var(), alpha)?)
    }

    /// CVaR at each of this state's own atoms above 0.
    pub fn cvars(&self) -> Vec<f64> {
        self.atoms[1..]
            .iter()
            .zip(&self.yc)
            .map(|(a, y)| y / a)
            .collect()
    }

    pub fn expected_value(&self) -> f64 {
        expected_value(&self.atom_p, &self.var())
    }

    /// Smallest positive atom: the finest risk level this grid resolves.
    pub fn finest_atom(&self) -> f64 {
        self.atoms.get(1).copied().unwrap_or(1.0)
    }

    pub(crate) fn set_curve(&mut self, yc: Vec<f64>, c_0: f64) {
        debug_assert_eq!(yc.len(), self.yc.len());
        self.yc = yc;
        self.c_0 = c_0;
    }

    /// Refine the grid below its first atom so the gap between the first
    /// quantile and `c_0` costs at most `eps` of discretization error.
    ///
    /// New atoms start at `eps * atom_p[0] / |var_0 - c_0|` and grow by
    /// `spacing` until they reach the current first atom. They take the first
    /// interval's quantile value, so the represented distribution (and its
    /// mean) does not change. Returns how many atoms were inserted.
    pub fn increase_precision(&mut self, eps: f64, spacing: f64) -> usize {
        if spacing.is_nan() || spacing <= 1.0 || self.yc.is_empty() {
            return 0;
        }
        let first = self.atoms[1];
        let var_0 = self.yc[0] / self.atom_p[0];
        let gap = (var_0 - self.c_0).abs();
        if gap == 0.0 {
            return 0;
        }

        let mut y = eps * self.atom_p[0] / gap;
        if y.is_nan() || y < MIN_REFINEMENT_STEP {
            warn!(
                step = y,
                floor = MIN_REFINEMENT_STEP,
                gap,
                "refinement step below floor, clamping"
            );
            y = MIN_REFINEMENT_STEP;
        }

        let mut inserted = Vec::new();
        while y < first {
            inserted.push(y);
            y *= spacing;
        }
        if inserted.is_empty() {
            return 0;
        }

        let mut atoms = Vec::with_capacity(self.atoms.len() + inserted.len());
        atoms.push(0.0);
        atoms.extend_from_slice(&inserted);
        atoms.extend_from_slice(&self.atoms[1..]);

        let mut yc = Vec::with_capacity(self.yc.len() + inserted.len());
        yc.extend(inserted.iter().map(|a| a * var_0));
        yc.extend_from_slice(&self.yc);

        self.atom_p = atom_masses(&atoms);
        self.atoms = atoms;
        self.yc = yc;
        inserted.len()
    }
}
