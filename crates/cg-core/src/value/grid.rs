//! Row-major storage of state values, one cell per grid coordinate.

use cg_common::State;
use cg_config::SolverConfig;
use serde::{Deserialize, Serialize};

use super::state::StateValue;
use crate::error::{Error, Result};
use crate::world::Environment;

/// One optional state value per cell. Obstacle cells hold `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueGrid {
    height: usize,
    width: usize,
    cells: Vec<Option<StateValue>>,
}

impl ValueGrid {
    /// Zero curves at every state of `env`, on the solver's initial atom grid.
    pub fn initial<E: Environment + ?Sized>(env: &E, solver: &SolverConfig) -> Self {
        let (height, width) = (env.height(), env.width());
        let mut cells = vec![None; height * width];
        let template = StateValue::new(solver.nb_atoms, solver.atom_spacing, solver.log_spaced);
        for state in env.states() {
            if state.row < height && state.col < width {
                cells[state.row * width + state.col] = Some(template.clone());
            }
        }
        ValueGrid {
            height,
            width,
            cells,
        }
    }

    /// Rebuild from stored cells, checking shape and every cell's invariants.
    pub fn from_cells(height: usize, width: usize, cells: Vec<Option<StateValue>>) -> Result<Self> {
        let grid = ValueGrid {
            height,
            width,
            cells,
        };
        grid.validate()?;
        Ok(grid)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cells.len() != self.height * self.width {
            return Err(Error::CorruptSnapshot(format!(
                "grid {}x{} holds {} cells",
                self.height,
                self.width,
                self.cells.len()
            )));
        }
        for (state, value) in self.iter() {
            value
                .validate()
                .map_err(|e| Error::CorruptSnapshot(format!("cell {state}: {e}")))?;
        }
        Ok(())
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    fn index(&self, state: State) -> Option<usize> {
        (state.row < self.height && state.col < self.width)
            .then_some(state.row * self.width + state.col)
    }

    /// State stored at a row-major cell index.
    pub fn state_at(&self, index: usize) -> State {
        State::new(index / self.width.max(1), index % self.width.max(1))
    }

    pub fn get(&self, state: State) -> Option<&StateValue> {
        self.index(state).and_then(|ix| self.cells[ix].as_ref())
    }

    pub fn get_mut(&mut self, state: State) -> Option<&mut StateValue> {
        let ix = self.index(state)?;
        self.cells[ix].as_mut()
    }

    /// Like [`ValueGrid::get`], with a missing cell as an error.
    pub fn value(&self, state: State) -> Result<&StateValue> {
        self.get(state).ok_or(Error::UnknownState { state })
    }

    pub fn cells(&self) -> &[Option<StateValue>] {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [Option<StateValue>] {
        &mut self.cells
    }

    /// Present cells with their coordinates, row-major.
    pub fn iter(&self) -> impl Iterator<Item = (State, &StateValue)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter_map(move |(ix, cell)| cell.as_ref().map(|v| (self.state_at(ix), v)))
    }

    /// Overwrite each present cell with the matching cell of `other`,
    /// reusing allocations.
    pub fn copy_from(&mut self, other: &ValueGrid) {
        self.height = other.height;
        self.width = other.width;
        self.cells.clone_from(&other.cells);
    }

    /// Largest change in CVaR, over every state and every atom of its grid,
    /// between two sweeps. `None` when the grids are not comparable because
    /// a state's atom count changed or the layouts differ.
    pub fn max_deviation(&self, other: &ValueGrid) -> Option<f64> {
        if self.height != other.height || self.width != other.width {
            return None;
        }
        let mut max = 0.0_f64;
        for (a, b) in self.cells.iter().zip(&other.cells) {
            match (a, b) {
                (None, None) => {}
                (Some(a), Some(b)) => {
                    if a.nb_atoms() != b.nb_atoms() {
                        return None;
                    }
                    for (x, y) in a.cvars().iter().zip(b.cvars()) {
                        max = max.max((x - y).abs());
                    }
                }
                _ => return None,
            }
        }
        Some(max)
    }

    /// Total number of atom intervals across all states.
    pub fn total_atoms(&self) -> usize {
        self.cells.iter().flatten().map(StateValue::nb_atoms).sum()
    }
}
