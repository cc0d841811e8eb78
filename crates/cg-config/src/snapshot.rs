//! Configuration snapshots for persisted results.
//!
//! A snapshot records exactly which configuration produced a solved value
//! function, so results can be audited and reproduced later.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::resolve::ConfigSource;
use crate::Config;

/// A frozen snapshot of configuration state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    /// When this snapshot was taken.
    pub timestamp: DateTime<Utc>,

    /// Schema version of the configuration.
    pub schema_version: String,

    /// Where the configuration was loaded from.
    pub source: String,

    /// Path of the config file, if one was read.
    #[serde(default)]
    pub path: Option<String>,

    /// SHA-256 of the canonical JSON form of the configuration.
    pub config_hash: String,

    /// Key configuration values for quick reference.
    pub summary: ConfigSummary,
}

/// Summary of key configuration values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSummary {
    pub height: usize,
    pub width: usize,
    pub random_action_p: f64,
    pub gamma: f64,
    pub nb_atoms: usize,
    pub log_spaced: bool,
}

impl ConfigSnapshot {
    /// Create a new snapshot from a loaded configuration.
    pub fn new(config: &Config, source: ConfigSource, path: Option<&std::path::Path>) -> Self {
        ConfigSnapshot {
            timestamp: Utc::now(),
            schema_version: config.schema_version.clone(),
            source: source.to_string(),
            path: path.map(|p| p.display().to_string()),
            config_hash: config_hash(config),
            summary: ConfigSummary {
                height: config.world.height,
                width: config.world.width,
                random_action_p: config.world.random_action_p,
                gamma: config.solver.gamma,
                nb_atoms: config.solver.nb_atoms,
                log_spaced: config.solver.log_spaced,
            },
        }
    }

    /// Whether this snapshot describes the given configuration.
    pub fn matches(&self, config: &Config) -> bool {
        self.config_hash == config_hash(config)
    }
}

/// Compute SHA-256 hash of content.
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Hash of the configuration's canonical (compact) JSON form.
pub fn config_hash(config: &Config) -> String {
    // Plain data; serialization does not fail in practice.
    let canonical = serde_json::to_string(config).unwrap_or_else(|_| format!("{:?}", config));
    hash_content(&canonical)
}
