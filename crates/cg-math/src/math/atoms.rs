//! Risk-level grids ("atoms") on [0, 1].

use super::{CvarError, Result};

/// Build an atom grid with `nb_atoms` intervals.
///
/// Linear grids are `{0, 1/n, 2/n, ..., 1}`. Log grids place atoms at
/// `{0, s^-(n-1), ..., s^-1, 1}` for spacing `s`, which concentrates
/// resolution near 0 where the CVaR curve bends the most.
pub fn spaced_atoms(nb_atoms: usize, spacing: f64, log_spaced: bool) -> Vec<f64> {
    let n = nb_atoms.max(1);
    let mut atoms = Vec::with_capacity(n + 1);
    atoms.push(0.0);
    if log_spaced {
        for i in 0..n {
            let exponent = (n - 1 - i) as i32;
            atoms.push(spacing.powi(-exponent));
        }
    } else {
        for i in 1..=n {
            atoms.push(i as f64 / n as f64);
        }
    }
    // Keep the endpoint exact regardless of rounding.
    if let Some(last) = atoms.last_mut() {
        *last = 1.0;
    }
    atoms
}

/// Probability mass of each interval of an atom grid.
pub fn atom_masses(atoms: &[f64]) -> Vec<f64> {
    atoms.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Validate the atom grid invariants: starts at exactly 0, ends at exactly 1,
/// strictly increasing.
pub fn validate_atoms(atoms: &[f64]) -> Result<()> {
    if atoms.len() < 2 {
        return Err(CvarError::InvalidAtoms {
            message: format!("need at least 2 atoms, got {}", atoms.len()),
        });
    }
    if atoms[0] != 0.0 {
        return Err(CvarError::InvalidAtoms {
            message: format!("first atom must be 0, got {}", atoms[0]),
        });
    }
    let last = atoms[atoms.len() - 1];
    if last != 1.0 {
        return Err(CvarError::InvalidAtoms {
            message: format!("last atom must be 1, got {}", last),
        });
    }
    if let Some(ix) = atoms.windows(2).position(|w| w[1] <= w[0]) {
        return Err(CvarError::InvalidAtoms {
            message: format!(
                "atoms must be strictly increasing (atoms[{}]={} >= atoms[{}]={})",
                ix,
                atoms[ix],
                ix + 1,
                atoms[ix + 1]
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_atoms() {
        let atoms = spaced_atoms(4, 2.0, false);
        assert_eq!(atoms, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert!(validate_atoms(&atoms).is_ok());
    }

    #[test]
    fn log_atoms() {
        let atoms = spaced_atoms(3, 2.0, true);
        assert_eq!(atoms, vec![0.0, 0.25, 0.5, 1.0]);
        assert!(validate_atoms(&atoms).is_ok());
    }

    #[test]
    fn masses_sum_to_one() {
        for log in [false, true] {
            let atoms = spaced_atoms(20, 2.0, log);
            let sum: f64 = atom_masses(&atoms).iter().sum();
            assert!((sum - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn single_atom_grid() {
        let atoms = spaced_atoms(1, 2.0, true);
        assert_eq!(atoms, vec![0.0, 1.0]);
    }

    #[test]
    fn validate_rejects_bad_grids() {
        assert!(validate_atoms(&[0.0]).is_err());
        assert!(validate_atoms(&[0.1, 1.0]).is_err());
        assert!(validate_atoms(&[0.0, 0.9]).is_err());
        assert!(validate_atoms(&[0.0, 0.5, 0.5, 1.0]).is_err());
    }
}
