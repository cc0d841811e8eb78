//! The per-state distributional Bellman backup.
//!
//! Every backup reads child values from one immutable grid (the previous
//! sweep) and writes only the state value it is handed.

use cg_common::{Action, State, Transition};
use cg_config::SolverConfig;
use cg_math::{worst_case_limit, Branch, CurveBackup, CurveSample, FixedAlpha};
use tracing::debug;

use super::grid::ValueGrid;
use super::state::StateValue;
use crate::error::{Error, Result};
use crate::logging::event_names;
use crate::world::Environment;

/// Tolerance on the sum of one action's transition probabilities.
pub const PROBABILITY_TOLERANCE: f64 = 1e-9;

/// Check one action's transition list: non-empty, each probability in
/// [0, 1], summing to 1.
pub fn validate_transitions(state: State, action: Action, transitions: &[Transition]) -> Result<()> {
    let fail = |message: String| Error::InvalidTransitions {
        state,
        action,
        message,
    };
    if transitions.is_empty() {
        return Err(fail("empty transition list".to_string()));
    }
    let mut sum = 0.0;
    for t in transitions {
        if !(0.0..=1.0).contains(&t.prob) {
            return Err(fail(format!("probability {} to {} outside [0, 1]", t.prob, t.state)));
        }
        sum += t.prob;
    }
    if (sum - 1.0).abs() > PROBABILITY_TOLERANCE {
        return Err(fail(format!("probabilities sum to {}", sum)));
    }
    Ok(())
}

/// Backup parameters shared by a whole sweep.
#[derive(Debug, Clone, Copy)]
pub struct BackupParams {
    pub gamma: f64,
    pub precision_tolerance: f64,
    pub atom_spacing: f64,
}

impl BackupParams {
    pub fn from_solver(solver: &SolverConfig) -> Self {
        BackupParams {
            gamma: solver.gamma,
            precision_tolerance: solver.precision_tolerance,
            atom_spacing: solver.atom_spacing,
        }
    }
}

/// A read-only view of the environment and one grid, used to back up states
/// and to answer fixed-alpha queries.
pub struct Backup<'a, E: ?Sized> {
    env: &'a E,
    grid: &'a ValueGrid,
    strategy: &'a dyn CurveBackup,
    params: BackupParams,
}

/// Result of backing up one state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackupReport {
    /// Atoms inserted by refinement.
    pub inserted_atoms: usize,
}

impl<'a, E: Environment + ?Sized> Backup<'a, E> {
    pub fn new(
        env: &'a E,
        grid: &'a ValueGrid,
        strategy: &'a dyn CurveBackup,
        params: BackupParams,
    ) -> Self {
        Backup {
            env,
            grid,
            strategy,
            params,
        }
    }

    /// Child curves of one action, shifted by reward and discount.
    fn branches(&self, state: State, action: Action, transitions: &[Transition]) -> Result<Vec<Branch<'a>>> {
        validate_transitions(state, action, transitions)?;
        let grid: &'a ValueGrid = self.grid;
        transitions
            .iter()
            .map(|t| {
                let child = grid.value(t.state)?;
                Ok(Branch::shifted(
                    t.prob,
                    t.reward,
                    self.params.gamma,
                    child.atoms(),
                    &child.var(),
                ))
            })
            .collect()
    }

    fn worst_case(&self, transitions: &[Transition]) -> Result<f64> {
        let outcomes = transitions
            .iter()
            .map(|t| Ok((t.reward, self.grid.value(t.state)?.c_0())))
            .collect::<Result<Vec<_>>>()?;
        Ok(worst_case_limit(outcomes, self.params.gamma)?)
    }

    fn action_lists(&self, state: State) -> Result<Vec<(Action, Vec<Transition>)>> {
        let lists = self.env.transitions(state);
        if lists.is_empty() {
            return Err(Error::NoActions { state });
        }
        Ok(Action::ALL.iter().copied().zip(lists).collect())
    }

    /// Back up `state` into `cell`, which must hold the state's value from
    /// the previous sweep (its atom grid is kept).
    ///
    /// Each atom independently takes its value from the action that is best
    /// at that risk level. When `deep` is set and the first quantile of the
    /// new curve sits more than the precision tolerance above `c_0`, the
    /// cell's grid is refined near 0 and the backup runs once more without
    /// further refinement.
    pub fn update(&self, state: State, cell: &mut StateValue, deep: bool) -> Result<BackupReport> {
        let actions = self.action_lists(state)?;

        let mut samples: Vec<CurveSample> = Vec::with_capacity(actions.len());
        let mut c_0 = f64::NEG_INFINITY;
        for (action, transitions) in &actions {
            let branches = self.branches(state, *action, transitions)?;
            samples.push(self.strategy.combine(cell.atoms(), &branches)?);
            c_0 = c_0.max(self.worst_case(transitions)?);
        }

        let n = cell.nb_atoms();
        let mut yc = vec![f64::NEG_INFINITY; n];
        let mut best_first = 0;
        for i in 0..n {
            let mut best = 0;
            for (a, sample) in samples.iter().enumerate().skip(1) {
                if sample.yc[i] > samples[best].yc[i] {
                    best = a;
                }
            }
            yc[i] = samples[best].yc[i];
            if i == 0 {
                best_first = best;
            }
        }
        cell.set_curve(yc, c_0);

        let var_0 = samples[best_first].var.first().copied().unwrap_or(c_0);
        let gap = var_0 - c_0;
        if deep && gap > self.params.precision_tolerance {
            let inserted = cell.increase_precision(self.params.precision_tolerance, self.params.atom_spacing);
            if inserted > 0 {
                debug!(
                    event = event_names::BACKUP_REFINED,
                    %state,
                    gap,
                    inserted,
                    nb_atoms = cell.nb_atoms(),
                    "refined atom grid"
                );
                let report = self.update(state, cell, false)?;
                return Ok(BackupReport {
                    inserted_atoms: inserted + report.inserted_atoms,
                });
            }
        }
        Ok(BackupReport::default())
    }

    /// VaR, CVaR and xi weights of one action at a single risk level.
    pub fn single_var_yc_xis(&self, state: State, action: Action, alpha: f64) -> Result<FixedAlpha> {
        let transitions = self.env.enumerate_transitions(state, action);
        let branches = self.branches(state, action, &transitions)?;
        Ok(cg_math::single_var_yc_xis(&branches, alpha)?)
    }

    /// Curve of one action sampled at the state's own atoms.
    pub fn action_curve(&self, state: State, action: Action) -> Result<CurveSample> {
        let transitions = self.env.enumerate_transitions(state, action);
        let branches = self.branches(state, action, &transitions)?;
        let target = self.grid.value(state)?;
        Ok(self.strategy.combine(target.atoms(), &branches)?)
    }

    /// Action with the highest CVaR at `alpha`, with its VaR, CVaR and xi
    /// weights. Ties go to the first action in [`Action::ALL`] order.
    pub fn next_action(&self, state: State, alpha: f64) -> Result<(Action, FixedAlpha)> {
        cg_math::check_alpha(alpha)?;
        let mut best: Option<(Action, FixedAlpha)> = None;
        for (action, transitions) in self.action_lists(state)? {
            let branches = self.branches(state, action, &transitions)?;
            let fixed = cg_math::single_var_yc_xis(&branches, alpha)?;
            let better = match &best {
                Some((_, current)) => fixed.cvar > current.cvar,
                None => true,
            };
            if better {
                best = Some((action, fixed));
            }
        }
        best.ok_or(Error::NoActions { state })
    }
}
