//! Fuzz target for CVaR curve combination.
//!
//! Feeds arbitrary child quantiles and branch probabilities through
//! `combine_sorted` and fixed-alpha extraction. Inputs that violate the
//! preconditions must come back as errors.

#![no_main]

use arbitrary::Arbitrary;
use cg_math::{combine_sorted, single_var_yc_xis, spaced_atoms, Branch};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    nb_atoms: u8,
    alpha: f64,
    children: Vec<(f64, f64, Vec<f64>)>,
}

fuzz_target!(|input: Input| {
    let n = (input.nb_atoms as usize % 32) + 1;
    let atoms = spaced_atoms(n, 2.0, false);
    let children: Vec<(f64, f64, Vec<f64>)> = input
        .children
        .into_iter()
        .take(8)
        .filter(|(p, r, _)| p.is_finite() && r.is_finite())
        .map(|(p, r, mut var)| {
            var.resize(n, 0.0);
            var.iter_mut().for_each(|v| {
                if !v.is_finite() {
                    *v = 0.0;
                }
            });
            var.sort_by(|a, b| a.total_cmp(b));
            (p.abs().fract(), r.clamp(-1e6, 1e6), var)
        })
        .collect();
    let branches: Vec<Branch<'_>> = children
        .iter()
        .map(|(p, r, var)| Branch::shifted(*p, *r, 0.95, &atoms, var))
        .collect();

    let _ = combine_sorted(&atoms, &branches);
    let _ = single_var_yc_xis(&branches, input.alpha);
});
