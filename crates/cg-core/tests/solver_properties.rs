//! Property-based tests for solved value functions on random cliff worlds.

use cg_config::{SolverConfig, WorldConfig};
use cg_core::{Environment, GridWorld, ValueIteration};
use proptest::prelude::*;

const TOL: f64 = 1e-9;

fn world_strategy() -> impl Strategy<Value = WorldConfig> {
    (1usize..4, 3usize..8, 0.0..0.3f64)
        .prop_map(|(h, w, p)| WorldConfig::cliff_walker(h, w, p))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Every stored curve yields CVaR that is bounded below by the
    /// worst case and grows with alpha.
    #[test]
    fn cvar_is_ordered_at_every_state(world in world_strategy(), sweeps in 1usize..12) {
        let solver = SolverConfig {
            max_iters: sweeps,
            nb_atoms: 8,
            ..SolverConfig::default()
        };
        let (vf, outcome) = ValueIteration::new(GridWorld::new(world), solver).run().unwrap();
        prop_assert!(outcome.sweeps <= sweeps);

        for state in vf.env().states() {
            let worst = vf.worst_case_value(state).unwrap();
            let mut prev = f64::NEG_INFINITY;
            for alpha in [0.01, 0.1, 0.3, 0.6, 1.0] {
                let cvar = vf.cvar_at(state, alpha).unwrap();
                prop_assert!(cvar + TOL >= worst, "{} alpha={} cvar={} worst={}", state, alpha, cvar, worst);
                prop_assert!(cvar + TOL >= prev, "{} not monotone at alpha={}", state, alpha);
                prev = cvar;
            }
        }
    }

    /// Parallel and sequential sweeps agree exactly.
    #[test]
    fn parallel_matches_sequential(world in world_strategy()) {
        let solver = SolverConfig {
            max_iters: 6,
            nb_atoms: 6,
            ..SolverConfig::default()
        };
        let (seq, _) = ValueIteration::new(GridWorld::new(world.clone()), solver.clone()).run().unwrap();
        let (par, _) = ValueIteration::new(
            GridWorld::new(world),
            SolverConfig { parallel: true, ..solver },
        )
        .run()
        .unwrap();
        prop_assert_eq!(seq.grid(), par.grid());
    }
}
