//! cvar-grid core library
//!
//! Distributional value iteration for the Conditional Value-at-Risk of
//! discounted returns on grid-shaped MDPs:
//! - Environments (the cliff-walker grid world)
//! - Per-state CVaR curves and the distributional Bellman backup
//! - Double-buffered value iteration with adaptive atom refinement
//! - Fixed-alpha and time-consistent policies, optimal paths
//! - Monte-Carlo policy evaluation
//! - Snapshot persistence, error model, logging and exit codes
//!
//! The binary entry point is in `main.rs`.

pub mod error;
pub mod exit_codes;
pub mod iterate;
pub mod logging;
pub mod persist;
pub mod policy;
pub mod rollout;
pub mod value;
pub mod world;

pub use error::{Error, ErrorCategory, Result};
pub use exit_codes::ExitCode;
pub use iterate::{IterationOutcome, IterationStatus, ValueIteration};
pub use persist::{load_snapshot, save_snapshot, Snapshot};
pub use policy::{make_policy, FixedAlphaPolicy, Policy, PolicyKind, TimeConsistentPolicy};
pub use rollout::{
    evaluate_policy, rollout_returns, run_episode, sweep_policies, PolicyStats, SWEEP_ALPHAS,
};
pub use value::{StateValue, ValueFunction, ValueGrid};
pub use world::{Environment, GridWorld};
