use cg_common::{Action, State, Transition};
use cg_config::WorldConfig;

use super::Environment;

/// The cliff walker: move on a bounded grid, fall off the cliff and restart,
/// or reach the goal and stay there.
#[derive(Debug, Clone)]
pub struct GridWorld {
    config: WorldConfig,
}

impl GridWorld {
    pub fn new(config: WorldConfig) -> Self {
        GridWorld { config }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Cell reached by a move when it executes as intended, clamped to the grid.
    pub fn target_state(&self, state: State, action: Action) -> State {
        let State { row, col } = state;
        match action {
            Action::Left => State::new(row, col.saturating_sub(1)),
            Action::Right => State::new(row, (col + 1).min(self.config.width - 1)),
            Action::Up => State::new(row.saturating_sub(1), col),
            Action::Down => State::new((row + 1).min(self.config.height - 1), col),
        }
    }

    fn action_transitions(&self, state: State, action: Action) -> Vec<Transition> {
        let p = self.config.random_action_p;
        let rewards = &self.config.rewards;
        Action::ALL
            .iter()
            .filter_map(|&executed| {
                let prob = if executed == action {
                    1.0 - p
                } else {
                    p / 3.0
                };
                if prob == 0.0 {
                    return None;
                }
                let target = self.target_state(state, executed);
                let transition = if self.config.is_cliff(target) {
                    Transition::new(self.config.initial, prob, rewards.fall)
                } else {
                    Transition::new(target, prob, rewards.step)
                };
                Some(transition)
            })
            .collect()
    }
}

impl Environment for GridWorld {
    fn height(&self) -> usize {
        self.config.height
    }

    fn width(&self) -> usize {
        self.config.width
    }

    fn states(&self) -> Vec<State> {
        let mut states = Vec::with_capacity(self.config.cell_count());
        for row in 0..self.config.height {
            for col in 0..self.config.width {
                let s = State::new(row, col);
                if !self.config.is_cliff(s) {
                    states.push(s);
                }
            }
        }
        states
    }

    fn transitions(&self, state: State) -> Vec<Vec<Transition>> {
        if self.is_goal(state) {
            let absorbing = Transition::new(state, 1.0, self.config.rewards.goal);
            return Action::ALL.iter().map(|_| vec![absorbing]).collect();
        }
        Action::ALL
            .iter()
            .map(|&a| self.action_transitions(state, a))
            .collect()
    }

    fn initial_state(&self) -> State {
        self.config.initial
    }

    fn is_goal(&self, state: State) -> bool {
        self.config.is_goal(state)
    }

    fn is_obstacle(&self, state: State) -> bool {
        self.config.is_cliff(state)
    }
}
