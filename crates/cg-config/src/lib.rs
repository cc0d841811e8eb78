//! cvar-grid configuration loading and validation.
//!
//! This crate provides:
//! - Typed structs for the world, solver and rollout settings
//! - Built-in presets (corridor, cliff, large)
//! - Config resolution (CLI → env → XDG → system → defaults)
//! - Semantic validation
//! - Config snapshots with content hashes for persisted results

pub mod load;
pub mod preset;
pub mod resolve;
pub mod snapshot;
pub mod solver;
pub mod validate;
pub mod world;

pub use load::{load_config, ConfigError, ConfigOptions, LoadedConfig};
pub use preset::{get_preset, list_presets, PresetError, PresetInfo, PresetName};
pub use resolve::{resolve_config, ConfigPath, ConfigSource};
pub use snapshot::ConfigSnapshot;
pub use solver::{RolloutConfig, SolverConfig};
pub use validate::{validate_config, ValidationError, ValidationResult};
pub use world::{RewardConfig, WorldConfig};

use serde::{Deserialize, Serialize};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";

fn default_schema_version() -> String {
    CONFIG_SCHEMA_VERSION.to_string()
}

/// Complete run configuration: which world to solve, how to solve it, and
/// how to evaluate the resulting policies.
///
/// Every section is optional in JSON; missing sections take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    #[serde(default)]
    pub world: WorldConfig,

    #[serde(default)]
    pub solver: SolverConfig,

    #[serde(default)]
    pub rollout: RolloutConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            schema_version: default_schema_version(),
            world: WorldConfig::default(),
            solver: SolverConfig::default(),
            rollout: RolloutConfig::default(),
        }
    }
}

impl Config {
    /// Parse a configuration from JSON text without semantic validation.
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Canonical JSON form, used for hashing and `config show`.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
