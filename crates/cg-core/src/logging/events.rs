//! Structured event names and solver stages.

use serde::{Deserialize, Serialize};

/// Stages of a cvar-grid run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Startup and configuration.
    Init,
    /// Value iteration sweeps.
    Solve,
    /// Policy and path extraction.
    Extract,
    /// Monte-Carlo rollouts.
    Evaluate,
    /// Reading or writing snapshots.
    Persist,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::Solve => "solve",
            Stage::Extract => "extract",
            Stage::Evaluate => "evaluate",
            Stage::Persist => "persist",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names used in logging.
pub mod event_names {
    // Run lifecycle
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";

    // Config
    pub const CONFIG_LOADED: &str = "config.loaded";

    // Solve stage
    pub const SOLVE_STARTED: &str = "solve.started";
    pub const SWEEP_FINISHED: &str = "sweep.finished";
    pub const BACKUP_REFINED: &str = "backup.refined";
    pub const SOLVE_CONVERGED: &str = "solve.converged";
    pub const SOLVE_CAPPED: &str = "solve.capped";

    // Extract stage
    pub const PATH_STEP: &str = "path.step";
    pub const PATH_CYCLE: &str = "path.cycle";

    // Evaluate stage
    pub const ROLLOUT_STARTED: &str = "rollout.started";
    pub const ROLLOUT_WORKER_DONE: &str = "rollout.worker_done";
    pub const ROLLOUT_FINISHED: &str = "rollout.finished";

    // Persist stage
    pub const SNAPSHOT_SAVED: &str = "snapshot.saved";
    pub const SNAPSHOT_LOADED: &str = "snapshot.loaded";

    // Error events
    pub const INTERNAL_ERROR: &str = "internal_error";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_serialization() {
        assert_eq!(serde_json::to_string(&Stage::Solve).unwrap(), "\"solve\"");
        assert_eq!(Stage::Evaluate.to_string(), "evaluate");
    }
}
