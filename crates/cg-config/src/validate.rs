//! Configuration validation errors and semantic validation.

use crate::world::WorldConfig;
use crate::{Config, RolloutConfig, SolverConfig, CONFIG_SCHEMA_VERSION};
use cg_common::State;
use thiserror::Error;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Semantic validation failed: {0}")]
    SemanticError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::SemanticError(_) => 63,
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::VersionMismatch { .. } => 66,
        }
    }
}

fn invalid(field: impl Into<String>, message: impl Into<String>) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        message: message.into(),
    }
}

/// Validate a full configuration semantically.
pub fn validate_config(config: &Config) -> ValidationResult<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }
    validate_world(&config.world)?;
    validate_solver(&config.solver)?;
    validate_rollout(&config.rollout)?;
    Ok(())
}

/// Validate grid shape, special cells and noise level.
pub fn validate_world(world: &WorldConfig) -> ValidationResult<()> {
    if world.height == 0 || world.width == 0 {
        return Err(invalid(
            "world",
            format!("Grid must be non-empty, got {}x{}", world.height, world.width),
        ));
    }

    let p = world.random_action_p;
    if !(0.0..1.0).contains(&p) {
        return Err(invalid(
            "world.random_action_p",
            format!("Must be in [0, 1), got {}", p),
        ));
    }

    check_cell(world, "world.initial", world.initial)?;
    if world.is_cliff(world.initial) {
        return Err(invalid(
            "world.initial",
            format!("Initial state {} is a cliff cell", world.initial),
        ));
    }

    if world.goals.is_empty() {
        return Err(ValidationError::SemanticError(
            "At least one goal state is required".to_string(),
        ));
    }
    for (i, &goal) in world.goals.iter().enumerate() {
        let field = format!("world.goals[{}]", i);
        check_cell(world, &field, goal)?;
        if world.is_cliff(goal) {
            return Err(invalid(field, format!("Goal {} is a cliff cell", goal)));
        }
    }

    for (i, &cliff) in world.cliffs.iter().enumerate() {
        check_cell(world, &format!("world.cliffs[{}]", i), cliff)?;
    }

    let r = &world.rewards;
    for (field, value) in [
        ("world.rewards.step", r.step),
        ("world.rewards.fall", r.fall),
        ("world.rewards.goal", r.goal),
    ] {
        if !value.is_finite() {
            return Err(invalid(field, format!("Must be finite, got {}", value)));
        }
    }

    Ok(())
}

fn check_cell(world: &WorldConfig, field: &str, state: State) -> ValidationResult<()> {
    if world.contains(state) {
        Ok(())
    } else {
        Err(invalid(
            field,
            format!(
                "Cell {} is outside the {}x{} grid",
                state, world.height, world.width
            ),
        ))
    }
}

/// Validate discount, atom grid and stopping parameters.
pub fn validate_solver(solver: &SolverConfig) -> ValidationResult<()> {
    if solver.gamma.is_nan() || solver.gamma <= 0.0 || solver.gamma >= 1.0 {
        return Err(invalid(
            "solver.gamma",
            format!("Must be in (0, 1), got {}", solver.gamma),
        ));
    }
    if solver.nb_atoms == 0 {
        return Err(invalid("solver.nb_atoms", "Must be at least 1"));
    }
    if !solver.atom_spacing.is_finite() || solver.atom_spacing <= 1.0 {
        return Err(invalid(
            "solver.atom_spacing",
            format!("Must be a finite value > 1, got {}", solver.atom_spacing),
        ));
    }
    if solver.precision_tolerance.is_nan() || solver.precision_tolerance <= 0.0 {
        return Err(invalid(
            "solver.precision_tolerance",
            format!("Must be positive, got {}", solver.precision_tolerance),
        ));
    }
    if solver.convergence_tolerance.is_nan() || solver.convergence_tolerance <= 0.0 {
        return Err(invalid(
            "solver.convergence_tolerance",
            format!("Must be positive, got {}", solver.convergence_tolerance),
        ));
    }
    if solver.max_iters == 0 {
        return Err(invalid("solver.max_iters", "Must be at least 1"));
    }
    Ok(())
}

/// Validate rollout sizes.
pub fn validate_rollout(rollout: &RolloutConfig) -> ValidationResult<()> {
    if rollout.workers == 0 {
        return Err(invalid("rollout.workers", "Must be at least 1"));
    }
    if rollout.episodes < rollout.workers {
        return Err(invalid(
            "rollout.episodes",
            format!(
                "Must be at least the worker count ({}), got {}",
                rollout.workers, rollout.episodes
            ),
        ));
    }
    if rollout.horizon == 0 {
        return Err(invalid("rollout.horizon", "Must be at least 1"));
    }
    Ok(())
}
