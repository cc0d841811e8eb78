//! Environment interface consumed by the solver, and the cliff-walker grid.

mod grid_world;

pub use grid_world::GridWorld;

use cg_common::{Action, State, Transition};
use rand::Rng;

/// A finite grid MDP, seen only through its transitions.
///
/// Transition lists must be stable across calls for the same state and
/// action, and the probabilities of one list must sum to 1.
pub trait Environment: Sync {
    fn height(&self) -> usize;

    fn width(&self) -> usize;

    /// Every state that carries a value: all cells except obstacles.
    fn states(&self) -> Vec<State>;

    /// Outcomes of every action at once, indexed by [`Action::index`].
    fn transitions(&self, state: State) -> Vec<Vec<Transition>>;

    /// Outcomes of one action.
    fn enumerate_transitions(&self, state: State, action: Action) -> Vec<Transition> {
        self.transitions(state)
            .into_iter()
            .nth(action.index())
            .unwrap_or_default()
    }

    fn initial_state(&self) -> State;

    fn is_goal(&self, state: State) -> bool;

    fn is_obstacle(&self, state: State) -> bool;

    /// Draw one outcome of taking `action` in `state`, with its index in
    /// the action's transition list.
    fn sample_transition<R: Rng>(
        &self,
        state: State,
        action: Action,
        rng: &mut R,
    ) -> Option<(usize, Transition)>
    where
        Self: Sized,
    {
        let transitions = self.enumerate_transitions(state, action);
        let draw: f64 = rng.random();
        let mut acc = 0.0;
        for (ix, t) in transitions.iter().enumerate() {
            acc += t.prob;
            if draw < acc {
                return Some((ix, *t));
            }
        }
        // Rounding left the cumulative sum just below 1.
        transitions.last().map(|t| (transitions.len() - 1, *t))
    }
}
