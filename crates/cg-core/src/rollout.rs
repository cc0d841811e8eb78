//! Monte-Carlo evaluation of policies by parallel rollouts.
//!
//! Workers share nothing mutable: each builds its own policy and a RNG seeded
//! with `seed + worker`, runs its share of episodes, and returns its returns.
//! Results are concatenated in worker order, so a fixed seed reproduces the
//! same sample array.

use cg_config::RolloutConfig;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::logging::{event_names, Stage};
use crate::policy::{make_policy, Policy, PolicyKind};
use crate::value::ValueFunction;
use crate::world::Environment;

/// Empirical risk statistics of a policy's discounted returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyStats {
    pub policy: String,
    pub alpha: f64,
    pub episodes: usize,
    pub mean: f64,
    pub var: f64,
    pub cvar: f64,
}

impl PolicyStats {
    pub fn from_returns(policy: &str, alpha: f64, returns: &[f64]) -> Result<Self> {
        let (var, cvar) = cg_math::empirical_var_cvar(returns, alpha)?;
        let mean = returns.iter().sum::<f64>() / returns.len() as f64;
        Ok(PolicyStats {
            policy: policy.to_string(),
            alpha,
            episodes: returns.len(),
            mean,
            var,
            cvar,
        })
    }
}

/// Discounted return of one episode of `horizon` steps from the initial state.
pub fn run_episode<E, P, R>(env: &E, policy: &mut P, horizon: usize, gamma: f64, rng: &mut R) -> Result<f64>
where
    E: Environment,
    P: Policy + ?Sized,
    R: rand::Rng,
{
    let mut state = env.initial_state();
    let mut previous = None;
    let mut total = 0.0;
    let mut discount = 1.0;
    for _ in 0..horizon {
        let action = policy.next_action(state, previous)?;
        let (ix, transition) = env
            .sample_transition(state, action, rng)
            .ok_or(Error::NoActions { state })?;
        total += discount * transition.reward;
        discount *= gamma;
        previous = Some(ix);
        state = transition.state;
    }
    Ok(total)
}

/// Discounted returns of `config.episodes` rollouts (rounded down to a
/// multiple of the worker count), in worker order.
pub fn rollout_returns<E: Environment>(
    vf: &ValueFunction<E>,
    kind: PolicyKind,
    alpha: f64,
    config: &RolloutConfig,
) -> Result<Vec<f64>> {
    let per_worker = config.episodes_per_worker();
    let gamma = vf.solver().gamma;
    info!(
        event = event_names::ROLLOUT_STARTED,
        stage = %Stage::Evaluate,
        policy = %kind,
        alpha,
        workers = config.workers,
        per_worker,
        horizon = config.horizon,
        seed = config.seed,
        "starting rollouts"
    );

    let batches = (0..config.workers)
        .into_par_iter()
        .map(|worker| -> Result<Vec<f64>> {
            let mut policy = make_policy(kind, vf, alpha)?;
            let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(worker as u64));
            let mut returns = Vec::with_capacity(per_worker);
            for _ in 0..per_worker {
                policy.reset();
                returns.push(run_episode(
                    vf.env(),
                    policy.as_mut(),
                    config.horizon,
                    gamma,
                    &mut rng,
                )?);
            }
            debug!(
                event = event_names::ROLLOUT_WORKER_DONE,
                worker,
                episodes = returns.len(),
                "rollout worker finished"
            );
            Ok(returns)
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    Ok(batches.into_iter().flatten().collect())
}

/// Run rollouts and summarize them at `alpha`.
pub fn evaluate_policy<E: Environment>(
    vf: &ValueFunction<E>,
    kind: PolicyKind,
    alpha: f64,
    config: &RolloutConfig,
) -> Result<PolicyStats> {
    let returns = rollout_returns(vf, kind, alpha, config)?;
    let stats = PolicyStats::from_returns(kind.as_str(), alpha, &returns)?;
    info!(
        event = event_names::ROLLOUT_FINISHED,
        policy = %kind,
        episodes = stats.episodes,
        mean = stats.mean,
        cvar = stats.cvar,
        "rollouts finished"
    );
    Ok(stats)
}

/// Risk levels of the policy comparison table, coarsest first.
pub const SWEEP_ALPHAS: [f64; 9] = [1.0, 0.5, 0.25, 0.1, 0.05, 0.025, 0.01, 0.005, 0.001];

/// Evaluate every policy kind at every risk level, policy-major: all of
/// `kinds[0]`'s levels come first. Each cell reuses the same rollout seed.
pub fn sweep_policies<E: Environment>(
    vf: &ValueFunction<E>,
    kinds: &[PolicyKind],
    alphas: &[f64],
    config: &RolloutConfig,
) -> Result<Vec<PolicyStats>> {
    let mut table = Vec::with_capacity(kinds.len() * alphas.len());
    for &kind in kinds {
        for &alpha in alphas {
            table.push(evaluate_policy(vf, kind, alpha, config)?);
        }
        debug!(
            event = event_names::ROLLOUT_FINISHED,
            stage = %Stage::Evaluate,
            policy = %kind,
            levels = alphas.len(),
            "policy sweep row done"
        );
    }
    Ok(table)
}
