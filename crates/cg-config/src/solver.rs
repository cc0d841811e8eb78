//! Solver and rollout settings.

use serde::{Deserialize, Serialize};

/// Distributional value iteration settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverConfig {
    /// Discount factor, in (0, 1).
    pub gamma: f64,

    /// Number of atom intervals per state before refinement.
    pub nb_atoms: usize,

    /// Ratio between consecutive atoms on log grids, and between inserted
    /// atoms during refinement.
    pub atom_spacing: f64,

    /// Use a log-spaced initial grid instead of a linear one.
    pub log_spaced: bool,

    /// Gap between the first quantile and the worst-case limit above which
    /// a state's grid is refined near 0.
    pub precision_tolerance: f64,

    /// Sweep-to-sweep CVaR change below which iteration stops.
    pub convergence_tolerance: f64,

    /// Sweep cap.
    pub max_iters: usize,

    /// Back up states of a sweep on worker threads.
    pub parallel: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            gamma: 0.95,
            nb_atoms: 20,
            atom_spacing: 2.0,
            log_spaced: false,
            precision_tolerance: 1.0,
            convergence_tolerance: 1e-6,
            max_iters: 1000,
            parallel: false,
        }
    }
}

/// Monte-Carlo policy evaluation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RolloutConfig {
    /// Total episodes, split evenly across workers.
    pub episodes: usize,

    /// Worker threads, each with its own RNG stream.
    pub workers: usize,

    /// Steps per episode.
    pub horizon: usize,

    /// Base seed; worker `i` uses `seed + i`.
    pub seed: u64,
}

impl Default for RolloutConfig {
    fn default() -> Self {
        RolloutConfig {
            episodes: 10_000,
            workers: 4,
            horizon: 100,
            seed: 6,
        }
    }
}

impl RolloutConfig {
    /// Episodes each worker runs. Any remainder is dropped.
    pub fn episodes_per_worker(&self) -> usize {
        if self.workers == 0 {
            0
        } else {
            self.episodes / self.workers
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solver_defaults() {
        let s = SolverConfig::default();
        assert_eq!(s.gamma, 0.95);
        assert_eq!(s.nb_atoms, 20);
        assert_eq!(s.atom_spacing, 2.0);
        assert!(!s.log_spaced);
        assert_eq!(s.max_iters, 1000);
    }

    #[test]
    fn episodes_split_across_workers() {
        let r = RolloutConfig {
            episodes: 10,
            workers: 3,
            ..Default::default()
        };
        assert_eq!(r.episodes_per_worker(), 3);
        let none = RolloutConfig {
            workers: 0,
            ..Default::default()
        };
        assert_eq!(none.episodes_per_worker(), 0);
    }
}
