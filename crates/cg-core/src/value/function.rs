use cg_common::{Action, State};
use cg_config::SolverConfig;
use cg_math::{FixedAlpha, SortBackup};

use super::backup::{Backup, BackupParams};
use super::grid::ValueGrid;
use crate::error::{Error, Result};
use crate::world::Environment;

/// A solved (or partially solved) value function over an environment.
#[derive(Debug, Clone)]
pub struct ValueFunction<E> {
    env: E,
    solver: SolverConfig,
    grid: ValueGrid,
}

impl<E: Environment> ValueFunction<E> {
    /// Zero curves everywhere.
    pub fn new(env: E, solver: SolverConfig) -> Self {
        let grid = ValueGrid::initial(&env, &solver);
        ValueFunction { env, solver, grid }
    }

    /// Wrap an existing grid; its layout must match the environment.
    pub fn from_grid(env: E, solver: SolverConfig, grid: ValueGrid) -> Result<Self> {
        if grid.height() != env.height() || grid.width() != env.width() {
            return Err(Error::CorruptSnapshot(format!(
                "value grid is {}x{} but the world is {}x{}",
                grid.height(),
                grid.width(),
                env.height(),
                env.width()
            )));
        }
        for state in env.states() {
            grid.value(state)?;
        }
        Ok(ValueFunction { env, solver, grid })
    }

    pub fn env(&self) -> &E {
        &self.env
    }

    pub fn solver(&self) -> &SolverConfig {
        &self.solver
    }

    pub fn grid(&self) -> &ValueGrid {
        &self.grid
    }

    pub fn into_grid(self) -> ValueGrid {
        self.grid
    }

    fn backup(&self) -> Backup<'_, E> {
        Backup::new(
            &self.env,
            &self.grid,
            &SortBackup,
            BackupParams::from_solver(&self.solver),
        )
    }

    /// CVaR of the return from `state` at risk level `alpha` in (0, 1].
    pub fn cvar_at(&self, state: State, alpha: f64) -> Result<f64> {
        self.grid.value(state)?.cvar_at(alpha)
    }

    /// Mean return from `state`.
    pub fn expected_value(&self, state: State) -> Result<f64> {
        Ok(self.grid.value(state)?.expected_value())
    }

    /// Worst-case (alpha -> 0) return estimate.
    pub fn worst_case_value(&self, state: State) -> Result<f64> {
        Ok(self.grid.value(state)?.c_0())
    }

    /// Action maximizing CVaR at `alpha`, with its full fixed-alpha result.
    pub fn next_action(&self, state: State, alpha: f64) -> Result<(Action, FixedAlpha)> {
        self.backup().next_action(state, alpha)
    }

    /// Action maximizing CVaR at `alpha`, with the risk-envelope weight of
    /// each of its transitions.
    pub fn best_action(&self, state: State, alpha: f64) -> Result<(Action, Vec<f64>)> {
        let (action, fixed) = self.next_action(state, alpha)?;
        Ok((action, fixed.xis))
    }

    /// VaR, CVaR and xi weights of one action at `alpha`.
    pub fn single_var_yc_xis(&self, state: State, action: Action, alpha: f64) -> Result<FixedAlpha> {
        self.backup().single_var_yc_xis(state, action, alpha)
    }

    /// CVaR at `alpha` for every cell, row by row; obstacles are `None`.
    pub fn cvar_map(&self, alpha: f64) -> Result<Vec<Vec<Option<f64>>>> {
        cg_math::check_alpha(alpha)?;
        let mut rows = Vec::with_capacity(self.grid.height());
        for row in 0..self.grid.height() {
            let mut cells = Vec::with_capacity(self.grid.width());
            for col in 0..self.grid.width() {
                let cell = match self.grid.get(State::new(row, col)) {
                    Some(value) => Some(value.cvar_at(alpha)?),
                    None => None,
                };
                cells.push(cell);
            }
            rows.push(cells);
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::GridWorld;
    use cg_config::WorldConfig;

    #[test]
    fn fresh_function_is_zero() {
        let vf = ValueFunction::new(GridWorld::new(WorldConfig::default()), SolverConfig::default());
        assert_eq!(vf.cvar_at(State::new(0, 0), 0.5).unwrap(), 0.0);
        assert_eq!(vf.worst_case_value(State::new(6, 9)).unwrap(), 0.0);
        assert!(vf.cvar_at(State::new(0, 4), 0.5).is_err());
    }

    #[test]
    fn cvar_map_marks_obstacles() {
        let vf = ValueFunction::new(GridWorld::new(WorldConfig::default()), SolverConfig::default());
        let map = vf.cvar_map(0.1).unwrap();
        assert_eq!(map.len(), 7);
        assert_eq!(map[0].len(), 10);
        assert_eq!(map[0][2], None);
        assert_eq!(map[2][2], Some(0.0));
        assert!(vf.cvar_map(0.0).is_err());
    }

    #[test]
    fn from_grid_rejects_wrong_shape() {
        let world = GridWorld::new(WorldConfig::default());
        let small = GridWorld::new(WorldConfig::cliff_walker(3, 5, 0.1));
        let grid = ValueGrid::initial(&small, &SolverConfig::default());
        assert!(ValueFunction::from_grid(world, SolverConfig::default(), grid).is_err());
    }

    #[test]
    fn best_action_returns_one_weight_per_transition() {
        let world = GridWorld::new(WorldConfig::default());
        let vf = ValueFunction::new(world, SolverConfig::default());
        let state = State::new(3, 3);
        let (action, xis) = vf.best_action(state, 0.3).unwrap();
        let n = vf.env().enumerate_transitions(state, action).len();
        assert_eq!(xis.len(), n);
        // All actions tie on a zero grid; the first wins.
        assert_eq!(action, Action::Left);
    }
}
