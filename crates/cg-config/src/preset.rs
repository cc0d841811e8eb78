//! Built-in configurations for common experiments.
//!
//! - Corridor: a deterministic 1×5 strip, small enough to check by hand
//! - Cliff: the classic 7×10 cliff walker with 10% action noise
//! - Large: a 50×60 cliff walker for performance runs

use crate::solver::{RolloutConfig, SolverConfig};
use crate::world::{RewardConfig, WorldConfig};
use crate::Config;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Available configuration presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetName {
    /// Deterministic 1×5 corridor with a zero-reward goal
    Corridor,
    /// 7×10 cliff walker, the default world
    Cliff,
    /// 50×60 cliff walker with light noise
    Large,
}

impl PresetName {
    /// All available preset names.
    pub const ALL: &'static [PresetName] =
        &[PresetName::Corridor, PresetName::Cliff, PresetName::Large];

    pub fn as_str(&self) -> &'static str {
        match self {
            PresetName::Corridor => "corridor",
            PresetName::Cliff => "cliff",
            PresetName::Large => "large",
        }
    }

    /// Parse preset name from string.
    pub fn parse(s: &str) -> Option<PresetName> {
        match s.to_lowercase().as_str() {
            "corridor" | "line" => Some(PresetName::Corridor),
            "cliff" | "default" | "cliffwalker" => Some(PresetName::Cliff),
            "large" | "big" => Some(PresetName::Large),
            _ => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            PresetName::Corridor => "Deterministic 1x5 corridor, converges in a handful of sweeps",
            PresetName::Cliff => "Classic 7x10 cliff walker with 10% random actions",
            PresetName::Large => "50x60 cliff walker with 5% random actions, for timing runs",
        }
    }
}

impl fmt::Display for PresetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PresetName {
    type Err = PresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PresetName::parse(s).ok_or_else(|| PresetError::UnknownPreset(s.to_string()))
    }
}

/// Errors related to preset operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresetError {
    UnknownPreset(String),
}

impl fmt::Display for PresetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresetError::UnknownPreset(name) => write!(
                f,
                "Unknown preset '{}'. Available: {}",
                name,
                PresetName::ALL
                    .iter()
                    .map(|p| p.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }
}

impl std::error::Error for PresetError {}

/// Summary of a preset for `config presets`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetInfo {
    pub name: PresetName,
    pub description: String,
    pub height: usize,
    pub width: usize,
    pub random_action_p: f64,
}

/// Build the configuration for a preset.
pub fn get_preset(name: PresetName) -> Config {
    match name {
        PresetName::Corridor => corridor_preset(),
        PresetName::Cliff => Config::default(),
        PresetName::Large => large_preset(),
    }
}

/// Describe every preset.
pub fn list_presets() -> Vec<PresetInfo> {
    PresetName::ALL
        .iter()
        .map(|&name| {
            let config = get_preset(name);
            PresetInfo {
                name,
                description: name.description().to_string(),
                height: config.world.height,
                width: config.world.width,
                random_action_p: config.world.random_action_p,
            }
        })
        .collect()
}

fn corridor_preset() -> Config {
    let mut world = WorldConfig::cliff_walker(1, 5, 0.0);
    // A zero goal reward makes the fixed point reachable in finitely many sweeps.
    world.rewards = RewardConfig {
        goal: 0.0,
        ..RewardConfig::default()
    };
    Config {
        world,
        solver: SolverConfig {
            nb_atoms: 4,
            ..SolverConfig::default()
        },
        rollout: RolloutConfig {
            episodes: 100,
            workers: 2,
            horizon: 20,
            ..RolloutConfig::default()
        },
        ..Config::default()
    }
}

fn large_preset() -> Config {
    Config {
        world: WorldConfig::cliff_walker(50, 60, 0.05),
        solver: SolverConfig {
            parallel: true,
            ..SolverConfig::default()
        },
        ..Config::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::validate_config;

    #[test]
    fn parse_aliases() {
        assert_eq!(PresetName::parse("CLIFF"), Some(PresetName::Cliff));
        assert_eq!(PresetName::parse("default"), Some(PresetName::Cliff));
        assert_eq!(PresetName::parse("line"), Some(PresetName::Corridor));
        assert_eq!(PresetName::parse("huge"), None);
    }

    #[test]
    fn from_str_reports_available_presets() {
        let err = "nope".parse::<PresetName>().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("nope"));
        assert!(msg.contains("corridor, cliff, large"));
    }

    #[test]
    fn every_preset_validates() {
        for &name in PresetName::ALL {
            let config = get_preset(name);
            assert!(
                validate_config(&config).is_ok(),
                "preset {} failed validation",
                name
            );
        }
    }

    #[test]
    fn corridor_is_deterministic() {
        let config = get_preset(PresetName::Corridor);
        assert_eq!(config.world.random_action_p, 0.0);
        assert_eq!((config.world.height, config.world.width), (1, 5));
        assert!(config.world.cliffs.is_empty());
    }

    #[test]
    fn list_covers_all() {
        let infos = list_presets();
        assert_eq!(infos.len(), PresetName::ALL.len());
        assert_eq!(infos[2].height, 50);
    }
}
