//! Logging configuration.
//!
//! The filter comes from, in order: `-v`/`-q`, then `CG_LOG`, then `info`.
//! `CG_LOG` holds either a bare level, applied to the cvar-grid crates, or a
//! full `EnvFilter` directive string. `RUST_LOG` is not consulted.

use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

pub const ENV_LOG_LEVEL: &str = "CG_LOG";
pub const ENV_LOG_FORMAT: &str = "CG_LOG_FORMAT";

/// Targets that log: the library and the binary.
const LOG_TARGETS: [&str; 2] = ["cg_core", "cvar_grid"];

/// Log output format on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines (default).
    #[default]
    Human,
    /// One JSON object per line.
    Json,
}

/// Log level filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Off,
}

impl LogLevel {
    const LADDER: [LogLevel; 6] = [
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::Off,
    ];

    /// Level for a `-v`/`-q` count pair: each `-v` is one step more verbose,
    /// each `-q` one step quieter. `None` when neither flag was given.
    pub fn from_verbosity(verbose: u8, quiet: u8) -> Option<LogLevel> {
        if verbose == 0 && quiet == 0 {
            return None;
        }
        let ix = (2 - i32::from(verbose) + i32::from(quiet)).clamp(0, 5);
        Some(Self::LADDER[ix as usize])
    }

    fn parse(s: &str) -> Option<LogLevel> {
        Self::LADDER
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        }
    }

    /// Directive applying this level to every cvar-grid target.
    pub fn directives(self) -> String {
        LOG_TARGETS
            .iter()
            .map(|target| format!("{target}={}", self.as_str()))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Resolved logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub format: LogFormat,
    /// `EnvFilter` directives, already checked to parse.
    pub directives: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            format: LogFormat::Human,
            directives: LogLevel::Info.directives(),
        }
    }
}

impl LogConfig {
    /// Resolve from the process environment and CLI overrides.
    pub fn from_env(cli_level: Option<LogLevel>, cli_format: Option<LogFormat>) -> Self {
        Self::from_lookup(cli_level, cli_format, |name| std::env::var(name).ok())
    }

    /// Same as [`LogConfig::from_env`] with an injectable variable lookup.
    pub fn from_lookup<F>(cli_level: Option<LogLevel>, cli_format: Option<LogFormat>, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = LogConfig::default();

        if let Some(level) = cli_level {
            config.directives = level.directives();
        } else if let Some(val) = env(ENV_LOG_LEVEL) {
            if let Some(level) = LogLevel::parse(&val) {
                config.directives = level.directives();
            } else if !val.trim().is_empty() && EnvFilter::try_new(val.trim()).is_ok() {
                config.directives = val.trim().to_string();
            }
        }

        config.format = cli_format
            .or_else(|| {
                env(ENV_LOG_FORMAT).and_then(|val| LogFormat::from_str(val.trim(), true).ok())
            })
            .unwrap_or_default();

        config
    }

    /// The subscriber filter for these directives.
    pub fn filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.directives)
            .unwrap_or_else(|_| EnvFilter::new(LogLevel::Info.directives()))
    }
}
