//! The iteration controller: full-grid sweeps until the CVaR curves stop
//! moving or the sweep cap is hit.
//!
//! Two grids are kept. Each sweep starts every new cell from its previous
//! value (so refined atom grids carry over), backs it up reading only the
//! previous grid, compares the two, then swaps them.

use std::time::Instant;

use cg_common::State;
use cg_config::SolverConfig;
use cg_math::{CurveBackup, SortBackup};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::logging::{event_names, Stage};
use crate::value::{Backup, BackupParams, BackupReport, StateValue, ValueFunction, ValueGrid};
use crate::world::Environment;

/// How iteration ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IterationStatus {
    /// The largest CVaR change fell below tolerance.
    Converged,
    /// The sweep cap was reached first; the grid is the last one computed.
    Capped,
}

impl std::fmt::Display for IterationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IterationStatus::Converged => write!(f, "converged"),
            IterationStatus::Capped => write!(f, "capped"),
        }
    }
}

/// Summary of a value iteration run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationOutcome {
    pub status: IterationStatus,
    pub sweeps: usize,
    /// Largest CVaR change of the last sweep, if its grids were comparable.
    pub last_deviation: Option<f64>,
    /// Atoms inserted by refinement over the whole run.
    pub inserted_atoms: usize,
    /// Atom intervals summed over all states at the end.
    pub total_atoms: usize,
}

impl IterationOutcome {
    pub fn converged(&self) -> bool {
        self.status == IterationStatus::Converged
    }
}

/// Distributional value iteration over an environment.
pub struct ValueIteration<E> {
    env: E,
    solver: SolverConfig,
    strategy: Box<dyn CurveBackup>,
}

impl<E: Environment> ValueIteration<E> {
    pub fn new(env: E, solver: SolverConfig) -> Self {
        ValueIteration {
            env,
            solver,
            strategy: Box::new(SortBackup),
        }
    }

    /// Use a different curve combination strategy.
    pub fn with_strategy(mut self, strategy: Box<dyn CurveBackup>) -> Self {
        self.strategy = strategy;
        self
    }

    /// Run sweeps from zero curves until convergence or the cap.
    pub fn run(self) -> Result<(ValueFunction<E>, IterationOutcome)> {
        let start = Instant::now();
        let solver = self.solver.clone();
        let params = BackupParams::from_solver(&solver);

        let mut prev = ValueGrid::initial(&self.env, &solver);
        let mut next = prev.clone();
        let mut inserted_atoms = 0;
        let mut last_deviation = None;
        let mut status = IterationStatus::Capped;
        let mut sweeps = 0;

        info!(
            event = event_names::SOLVE_STARTED,
            stage = %Stage::Solve,
            height = self.env.height(),
            width = self.env.width(),
            states = prev.iter().count(),
            strategy = self.strategy.name(),
            parallel = solver.parallel,
            "starting value iteration"
        );

        for i in 0..solver.max_iters {
            next.copy_from(&prev);
            let backup = Backup::new(&self.env, &prev, self.strategy.as_ref(), params);
            let inserted = sweep(&backup, &mut next, solver.parallel)?;
            inserted_atoms += inserted;
            sweeps = i + 1;

            let deviation = prev.max_deviation(&next);
            last_deviation = deviation;
            debug!(
                event = event_names::SWEEP_FINISHED,
                sweep = sweeps,
                deviation = deviation.unwrap_or(f64::NAN),
                inserted,
                "sweep finished"
            );

            std::mem::swap(&mut prev, &mut next);
            if i != 0 && deviation.is_some_and(|d| d < solver.convergence_tolerance) {
                status = IterationStatus::Converged;
                break;
            }
        }

        let outcome = IterationOutcome {
            status,
            sweeps,
            last_deviation,
            inserted_atoms,
            total_atoms: prev.total_atoms(),
        };
        let elapsed_ms = start.elapsed().as_millis() as u64;
        match status {
            IterationStatus::Converged => info!(
                event = event_names::SOLVE_CONVERGED,
                sweeps,
                total_atoms = outcome.total_atoms,
                elapsed_ms,
                "value iteration converged"
            ),
            IterationStatus::Capped => warn!(
                event = event_names::SOLVE_CAPPED,
                sweeps,
                deviation = last_deviation.unwrap_or(f64::NAN),
                elapsed_ms,
                "value iteration hit the sweep cap without converging"
            ),
        }

        let vf = ValueFunction::from_grid(self.env, solver, prev)?;
        Ok((vf, outcome))
    }
}

/// Back up every present cell of `next` against the backup's grid.
/// Returns the number of atoms inserted by refinement.
fn sweep<E: Environment>(
    backup: &Backup<'_, E>,
    next: &mut ValueGrid,
    parallel: bool,
) -> Result<usize> {
    let states: Vec<State> = (0..next.cells().len()).map(|ix| next.state_at(ix)).collect();
    let update = |(state, cell): (&State, &mut Option<StateValue>)| -> Result<usize> {
        match cell {
            Some(value) => backup
                .update(*state, value, true)
                .map(|r: BackupReport| r.inserted_atoms),
            None => Ok(0),
        }
    };

    let counts: Vec<usize> = if parallel {
        states
            .par_iter()
            .zip(next.cells_mut().par_iter_mut())
            .map(update)
            .collect::<Result<_>>()?
    } else {
        states
            .iter()
            .zip(next.cells_mut().iter_mut())
            .map(update)
            .collect::<Result<_>>()?
    };
    Ok(counts.into_iter().sum())
}
