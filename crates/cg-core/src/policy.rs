//! Acting on a value function at a fixed risk level.

use std::collections::HashSet;

use cg_common::{Action, State, Transition};
use tracing::debug;

use crate::error::{Error, Result};
use crate::logging::{event_names, Stage};
use crate::value::ValueFunction;
use crate::world::Environment;

/// An action-selection rule that may carry state across the steps of one
/// episode.
pub trait Policy: Send {
    fn name(&self) -> &'static str;

    /// Forget per-episode state before a new episode.
    fn reset(&mut self);

    /// Choose the action in `state`. `previous` is the index of the
    /// transition realised by the previous step within its action's list,
    /// `None` at the start of an episode.
    fn next_action(&mut self, state: State, previous: Option<usize>) -> Result<Action>;
}

/// Which policy to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum PolicyKind {
    /// Propagate the risk level through xi weights.
    #[default]
    TimeConsistent,
    /// Use the same risk level at every step.
    Fixed,
}

impl PolicyKind {
    pub const ALL: [PolicyKind; 2] = [PolicyKind::TimeConsistent, PolicyKind::Fixed];

    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyKind::TimeConsistent => "time-consistent",
            PolicyKind::Fixed => "fixed",
        }
    }
}

impl std::fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Greedy CVaR_alpha action at every step, with the same alpha throughout.
/// Not time-consistent: it ignores how much of the risk budget earlier
/// outcomes already used.
#[derive(Debug, Clone)]
pub struct FixedAlphaPolicy<'v, E> {
    vf: &'v ValueFunction<E>,
    alpha: f64,
}

impl<'v, E: Environment> FixedAlphaPolicy<'v, E> {
    pub fn new(vf: &'v ValueFunction<E>, alpha: f64) -> Result<Self> {
        cg_math::check_alpha(alpha)?;
        Ok(FixedAlphaPolicy { vf, alpha })
    }
}

impl<E: Environment> Policy for FixedAlphaPolicy<'_, E> {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn reset(&mut self) {}

    fn next_action(&mut self, state: State, _previous: Option<usize>) -> Result<Action> {
        Ok(self.vf.best_action(state, self.alpha)?.0)
    }
}

/// Time-consistent CVaR policy: after each step the risk level becomes the
/// xi weight of the transition that was realised, i.e. the fraction of that
/// outcome's probability that lies inside the current alpha-worst set.
#[derive(Debug, Clone)]
pub struct TimeConsistentPolicy<'v, E> {
    vf: &'v ValueFunction<E>,
    initial_alpha: f64,
    alpha: f64,
    xis: Option<Vec<f64>>,
}

impl<'v, E: Environment> TimeConsistentPolicy<'v, E> {
    pub fn new(vf: &'v ValueFunction<E>, alpha: f64) -> Result<Self> {
        cg_math::check_alpha(alpha)?;
        Ok(TimeConsistentPolicy {
            vf,
            initial_alpha: alpha,
            alpha,
            xis: None,
        })
    }

    /// Risk level used for the most recent decision.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}

impl<E: Environment> Policy for TimeConsistentPolicy<'_, E> {
    fn name(&self) -> &'static str {
        "time-consistent"
    }

    fn reset(&mut self) {
        self.alpha = self.initial_alpha;
        self.xis = None;
    }

    fn next_action(&mut self, state: State, previous: Option<usize>) -> Result<Action> {
        if let (Some(ix), Some(xis)) = (previous, &self.xis) {
            let xi = xis.get(ix).copied().unwrap_or(self.alpha);
            self.alpha = if xi > 0.0 {
                xi.min(1.0)
            } else {
                // The realised outcome lay outside the worst set; act at the
                // finest level this state resolves.
                self.vf.grid().value(state)?.finest_atom()
            };
        }
        let (action, fixed) = self.vf.next_action(state, self.alpha)?;
        self.xis = Some(fixed.xis);
        Ok(action)
    }
}

/// Build a boxed policy of the given kind.
pub fn make_policy<'v, E: Environment>(
    kind: PolicyKind,
    vf: &'v ValueFunction<E>,
    alpha: f64,
) -> Result<Box<dyn Policy + 'v>> {
    Ok(match kind {
        PolicyKind::TimeConsistent => Box::new(TimeConsistentPolicy::new(vf, alpha)?),
        PolicyKind::Fixed => Box::new(FixedAlphaPolicy::new(vf, alpha)?),
    })
}

impl<E: Environment> ValueFunction<E> {
    /// Deterministic illustrative path from the initial state: follow the
    /// time-consistent policy at `alpha`, always taking the most probable
    /// outcome. Fails with [`Error::PathCycle`] if a state repeats before a
    /// goal is reached.
    pub fn optimal_path(&self, alpha: f64) -> Result<Vec<State>> {
        let mut policy = TimeConsistentPolicy::new(self, alpha)?;
        let env = self.env();
        let mut state = env.initial_state();
        let mut path = vec![state];
        let mut seen: HashSet<State> = HashSet::from([state]);
        let mut previous = None;

        while !env.is_goal(state) {
            let action = policy.next_action(state, previous)?;
            let transitions = env.enumerate_transitions(state, action);
            // Most probable outcome; ties go to the first listed.
            let (ix, transition) = transitions
                .iter()
                .enumerate()
                .fold(None, |best: Option<(usize, &Transition)>, (ix, t)| match best {
                    Some((_, b)) if b.prob >= t.prob => best,
                    _ => Some((ix, t)),
                })
                .ok_or(Error::NoActions { state })?;

            debug!(
                event = event_names::PATH_STEP,
                from = %state,
                %action,
                to = %transition.state,
                alpha = policy.alpha(),
                "path step"
            );
            previous = Some(ix);
            state = transition.state;
            if !seen.insert(state) {
                debug!(
                    event = event_names::PATH_CYCLE,
                    stage = %Stage::Extract,
                    %state,
                    steps = path.len(),
                    "path cycle"
                );
                return Err(Error::PathCycle {
                    state,
                    steps: path.len(),
                });
            }
            path.push(state);
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iterate::ValueIteration;
    use crate::world::GridWorld;
    use cg_config::{get_preset, PresetName};

    fn corridor() -> ValueFunction<GridWorld> {
        let config = get_preset(PresetName::Corridor);
        ValueIteration::new(GridWorld::new(config.world), config.solver)
            .run()
            .unwrap()
            .0
    }

    #[test]
    fn corridor_path_moves_right() {
        let vf = corridor();
        let path = vf.optimal_path(0.5).unwrap();
        let cols: Vec<usize> = path.iter().map(|s| s.col).collect();
        assert_eq!(cols, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn unsolved_grid_cycles() {
        // On zero curves every action ties and the first (left) wins, which
        // keeps the walker at the left wall.
        let config = get_preset(PresetName::Corridor);
        let vf = ValueFunction::new(GridWorld::new(config.world), config.solver);
        let err = vf.optimal_path(0.5).unwrap_err();
        assert!(matches!(err, Error::PathCycle { steps: 1, .. }));
    }

    #[test]
    fn policies_reject_zero_alpha() {
        let vf = corridor();
        assert!(FixedAlphaPolicy::new(&vf, 0.0).is_err());
        assert!(TimeConsistentPolicy::new(&vf, 0.0).is_err());
    }

    #[test]
    fn time_consistent_policy_tracks_xi() {
        let vf = corridor();
        let mut policy = TimeConsistentPolicy::new(&vf, 0.3).unwrap();
        let a = policy.next_action(State::new(0, 0), None).unwrap();
        assert_eq!(a, Action::Right);
        // A single deterministic outcome carries the whole risk level over.
        let _ = policy.next_action(State::new(0, 1), Some(0)).unwrap();
        assert!((policy.alpha() - 0.3).abs() < 1e-12);
        policy.reset();
        assert_eq!(policy.alpha(), 0.3);
    }

    #[test]
    fn fixed_policy_names() {
        let vf = corridor();
        let fixed = make_policy(PolicyKind::Fixed, &vf, 0.1).unwrap();
        assert_eq!(fixed.name(), "fixed");
        let tc = make_policy(PolicyKind::TimeConsistent, &vf, 0.1).unwrap();
        assert_eq!(tc.name(), "time-consistent");
        assert_eq!(PolicyKind::TimeConsistent.to_string(), "time-consistent");
    }
}
