//! Grid world layout and rewards.

use cg_common::State;
use serde::{Deserialize, Serialize};

/// Rewards of the cliff walker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RewardConfig {
    /// Collected on every ordinary move.
    pub step: f64,
    /// Collected when a move lands on a cliff cell.
    pub fall: f64,
    /// Collected on every step spent in a goal cell.
    pub goal: f64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        RewardConfig {
            step: -3.0 / 20.0,
            fall: -1.0,
            goal: 1.0,
        }
    }
}

/// Shape of the grid, its special cells and its dynamics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorldConfig {
    pub height: usize,
    pub width: usize,

    /// Probability that the chosen move is replaced by one of the other
    /// three, uniformly.
    #[serde(default = "default_random_action_p")]
    pub random_action_p: f64,

    /// Start cell for rollouts and path extraction; falling off a cliff
    /// returns here.
    #[serde(default)]
    pub initial: State,

    pub goals: Vec<State>,

    #[serde(default)]
    pub cliffs: Vec<State>,

    #[serde(default)]
    pub rewards: RewardConfig,
}

fn default_random_action_p() -> f64 {
    0.1
}

impl Default for WorldConfig {
    fn default() -> Self {
        WorldConfig::cliff_walker(7, 10, default_random_action_p())
    }
}

impl WorldConfig {
    /// The classic layout: start at the top-left corner, goal at the top-right
    /// corner, and a cliff over rows 0-1 and columns 2-7 (clipped to the grid).
    /// Single-row grids get no cliff.
    pub fn cliff_walker(height: usize, width: usize, random_action_p: f64) -> Self {
        let mut cliffs = Vec::new();
        if height > 1 {
            for row in 0..2.min(height) {
                for col in (2..=7).filter(|&c| c + 1 < width) {
                    cliffs.push(State::new(row, col));
                }
            }
        }
        WorldConfig {
            height,
            width,
            random_action_p,
            initial: State::new(0, 0),
            goals: vec![State::new(0, width.saturating_sub(1))],
            cliffs,
            rewards: RewardConfig::default(),
        }
    }

    pub fn contains(&self, state: State) -> bool {
        state.row < self.height && state.col < self.width
    }

    pub fn is_cliff(&self, state: State) -> bool {
        self.cliffs.contains(&state)
    }

    pub fn is_goal(&self, state: State) -> bool {
        self.goals.contains(&state)
    }

    pub fn cell_count(&self) -> usize {
        self.height * self.width
    }
}
