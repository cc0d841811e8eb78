//! Grid coordinates, moves and transition outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A cell of the grid, addressed by (row, column).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct State {
    pub row: usize,
    pub col: usize,
}

impl State {
    pub const fn new(row: usize, col: usize) -> Self {
        State { row, col }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

impl From<(usize, usize)> for State {
    fn from((row, col): (usize, usize)) -> Self {
        State { row, col }
    }
}

/// The four grid moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Left,
    Right,
    Up,
    Down,
}

impl Action {
    /// All actions, in index order.
    pub const ALL: [Action; 4] = [Action::Left, Action::Right, Action::Up, Action::Down];

    /// Position of this action in [`Action::ALL`].
    pub fn index(self) -> usize {
        match self {
            Action::Left => 0,
            Action::Right => 1,
            Action::Up => 2,
            Action::Down => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Left => "left",
            Action::Right => "right",
            Action::Up => "up",
            Action::Down => "down",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One stochastic outcome of taking an action: where it lands, how likely it is,
/// and the reward collected on the way.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub state: State,
    pub prob: f64,
    pub reward: f64,
}

impl Transition {
    pub const fn new(state: State, prob: f64, reward: f64) -> Self {
        Transition {
            state,
            prob,
            reward,
        }
    }
}
