//! CVaR curve algebra.
//!
//! Pure functions over risk-level grids and CVaR curves used by the
//! distributional value iteration in `cg-core`.

pub mod math;

pub use math::atoms::*;
pub use math::backup::{
    combine_sorted, extract_distribution, single_var_yc_xis, worst_case_limit, Branch,
    CurveBackup, CurveSample, FixedAlpha, Piece, SortBackup,
};
pub use math::curve::*;
pub use math::samples::empirical_var_cvar;
pub use math::{check_alpha, CvarError, Result};
