//! Distributional value function: per-state CVaR curves on a grid, the
//! Bellman backup over them, and the queries policies are built on.

pub mod backup;
mod function;
pub mod grid;
pub mod state;

pub use backup::{validate_transitions, Backup, BackupParams, BackupReport};
pub use function::ValueFunction;
pub use grid::ValueGrid;
pub use state::StateValue;
