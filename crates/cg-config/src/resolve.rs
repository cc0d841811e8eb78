//! Configuration file discovery.
//!
//! Resolution order: CLI argument → environment variables → XDG path →
//! system path → built-in defaults.

use std::path::{Path, PathBuf};

/// Where the configuration came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,

    /// Selected with `--preset`.
    Preset,

    /// Set via environment variable.
    Environment,

    /// Found in XDG config directory.
    XdgConfig,

    /// Found in /etc/cvar-grid/.
    SystemConfig,

    /// Using built-in defaults.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Preset => write!(f, "preset"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::SystemConfig => write!(f, "system config"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// A discovered configuration file, or none when defaults apply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigPath {
    pub path: Option<PathBuf>,
    pub source: ConfigSource,
}

/// Environment variable names.
pub const ENV_CONFIG_PATH: &str = "CVAR_GRID_CONFIG";
pub const ENV_CONFIG_DIR: &str = "CVAR_GRID_CONFIG_DIR";

/// Standard config file name.
pub const CONFIG_FILENAME: &str = "config.json";

/// Application name for XDG directories.
const APP_NAME: &str = "cvar-grid";

/// Resolve the configuration file using the process environment.
///
/// 1. Explicit CLI path (returned even if missing, so the caller can report it)
/// 2. `CVAR_GRID_CONFIG`
/// 3. `CVAR_GRID_CONFIG_DIR` + config.json
/// 4. XDG config directory (~/.config/cvar-grid/config.json)
/// 5. System config (/etc/cvar-grid/config.json)
/// 6. Built-in defaults (None)
pub fn resolve_config(cli_path: Option<&Path>) -> ConfigPath {
    resolve_with(
        cli_path,
        |name| std::env::var(name).ok(),
        xdg_config_dir(),
        system_config_dir(),
    )
}

/// Resolution with injectable environment lookup and base directories.
pub fn resolve_with<F>(
    cli_path: Option<&Path>,
    env: F,
    xdg_dir: Option<PathBuf>,
    system_dir: PathBuf,
) -> ConfigPath
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = cli_path {
        return ConfigPath {
            path: Some(path.to_path_buf()),
            source: ConfigSource::CliArgument,
        };
    }

    if let Some(env_path) = env(ENV_CONFIG_PATH) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return found(path, ConfigSource::Environment);
        }
    }

    if let Some(dir) = env(ENV_CONFIG_DIR) {
        let path = PathBuf::from(dir).join(CONFIG_FILENAME);
        if path.exists() {
            return found(path, ConfigSource::Environment);
        }
    }

    if let Some(dir) = xdg_dir {
        let path = dir.join(CONFIG_FILENAME);
        if path.exists() {
            return found(path, ConfigSource::XdgConfig);
        }
    }

    let system_path = system_dir.join(CONFIG_FILENAME);
    if system_path.exists() {
        return found(system_path, ConfigSource::SystemConfig);
    }

    ConfigPath::default()
}

fn found(path: PathBuf, source: ConfigSource) -> ConfigPath {
    ConfigPath {
        path: Some(path),
        source,
    }
}

/// Get the XDG config directory for cvar-grid.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Get the system config directory.
pub fn system_config_dir() -> PathBuf {
    PathBuf::from("/etc").join(APP_NAME)
}
