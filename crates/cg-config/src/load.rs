//! Loading a configuration with provenance.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::preset::{get_preset, PresetName};
use crate::resolve::{resolve_config, ConfigSource};
use crate::snapshot::ConfigSnapshot;
use crate::validate::{validate_config, ValidationError};
use crate::Config;

/// Errors that can occur during config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Invalid JSON in config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Semantic validation failed: {0}")]
    ValidationError(#[from] ValidationError),

    #[error("I/O error reading {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration resolution options.
#[derive(Debug, Default, Clone)]
pub struct ConfigOptions {
    /// Explicit config file path (highest priority).
    pub config_path: Option<PathBuf>,
    /// Built-in preset, used when no explicit path is given.
    pub preset: Option<PresetName>,
}

/// A validated configuration and where it came from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub source: ConfigSource,
    pub path: Option<PathBuf>,
}

impl LoadedConfig {
    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot::new(&self.config, self.source, self.path.as_deref())
    }
}

/// Load and validate configuration.
///
/// Resolution order (highest to lowest priority):
/// 1. Explicit `--config` path
/// 2. `--preset`
/// 3. Environment, XDG and system config files (see [`resolve_config`])
/// 4. Built-in defaults
pub fn load_config(options: &ConfigOptions) -> Result<LoadedConfig, ConfigError> {
    if options.config_path.is_none() {
        if let Some(preset) = options.preset {
            let config = get_preset(preset);
            validate_config(&config)?;
            return Ok(LoadedConfig {
                config,
                source: ConfigSource::Preset,
                path: None,
            });
        }
    }

    let resolved = resolve_config(options.config_path.as_deref());
    let config = match &resolved.path {
        Some(path) => load_config_file(path)?,
        None => Config::default(),
    };
    validate_config(&config)?;

    Ok(LoadedConfig {
        config,
        source: resolved.source,
        path: resolved.path,
    })
}

/// Read and parse a config file without semantic validation.
pub fn load_config_file(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}
