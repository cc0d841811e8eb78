//! Saving and loading solved value functions.
//!
//! A snapshot is a single JSON document: the configuration that produced the
//! grid, its content hash, how iteration ended, and every cell's curve.
//! Floats are written with enough digits to read back bit-for-bit.

use std::fs;
use std::path::Path;

use cg_common::SCHEMA_VERSION;
use cg_config::{validate_config, Config, ConfigSnapshot, ConfigSource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};
use crate::iterate::IterationOutcome;
use crate::logging::{event_names, Stage};
use crate::value::{ValueFunction, ValueGrid};
use crate::world::GridWorld;

/// On-disk form of a solved value function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub schema_version: String,
    pub created_at: DateTime<Utc>,
    pub config: Config,
    pub config_snapshot: ConfigSnapshot,
    pub outcome: IterationOutcome,
    pub grid: ValueGrid,
}

impl Snapshot {
    /// Package a finished run.
    pub fn new(
        config: Config,
        config_snapshot: ConfigSnapshot,
        outcome: IterationOutcome,
        grid: ValueGrid,
    ) -> Self {
        Snapshot {
            schema_version: SCHEMA_VERSION.to_string(),
            created_at: Utc::now(),
            config,
            config_snapshot,
            outcome,
            grid,
        }
    }

    /// Package a finished run whose configuration came from `source`.
    pub fn from_run(
        config: Config,
        source: ConfigSource,
        path: Option<&Path>,
        vf: ValueFunction<GridWorld>,
        outcome: IterationOutcome,
    ) -> Self {
        let config_snapshot = ConfigSnapshot::new(&config, source, path);
        Snapshot::new(config, config_snapshot, outcome, vf.into_grid())
    }

    /// Parse and check a snapshot from JSON text.
    pub fn from_json(content: &str) -> Result<Self> {
        let snapshot: Snapshot = serde_json::from_str(content)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Schema, configuration and grid consistency.
    pub fn validate(&self) -> Result<()> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(Error::SchemaMismatch {
                expected: SCHEMA_VERSION.to_string(),
                actual: self.schema_version.clone(),
            });
        }
        validate_config(&self.config)?;
        let world = &self.config.world;
        if self.grid.height() != world.height || self.grid.width() != world.width {
            return Err(Error::CorruptSnapshot(format!(
                "grid is {}x{} but the world is {}x{}",
                self.grid.height(),
                self.grid.width(),
                world.height,
                world.width
            )));
        }
        self.grid.validate()
    }

    /// Rebuild the value function over the snapshot's world.
    pub fn value_function(&self) -> Result<ValueFunction<GridWorld>> {
        ValueFunction::from_grid(
            GridWorld::new(self.config.world.clone()),
            self.config.solver.clone(),
            self.grid.clone(),
        )
    }
}

/// Write `snapshot` to `path` as pretty JSON. The file is written beside the
/// target first and renamed into place.
pub fn save_snapshot(path: &Path, snapshot: &Snapshot) -> Result<()> {
    let content = serde_json::to_string_pretty(snapshot)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    fs::write(&tmp, content)?;
    fs::rename(&tmp, path)?;
    info!(
        event = event_names::SNAPSHOT_SAVED,
        stage = %Stage::Persist,
        path = %path.display(),
        status = %snapshot.outcome.status,
        total_atoms = snapshot.outcome.total_atoms,
        "snapshot saved"
    );
    Ok(())
}

/// Read and check a snapshot written by [`save_snapshot`].
pub fn load_snapshot(path: &Path) -> Result<Snapshot> {
    let content = fs::read_to_string(path)?;
    let snapshot = Snapshot::from_json(&content)?;
    info!(
        event = event_names::SNAPSHOT_LOADED,
        stage = %Stage::Persist,
        path = %path.display(),
        config_hash = %snapshot.config_snapshot.config_hash,
        "snapshot loaded"
    );
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iterate::ValueIteration;
    use cg_config::{get_preset, PresetName};

    fn solved_corridor() -> Snapshot {
        let config = get_preset(PresetName::Corridor);
        let (vf, outcome) = ValueIteration::new(GridWorld::new(config.world.clone()), config.solver.clone())
            .run()
            .unwrap();
        Snapshot::from_run(config, ConfigSource::Preset, None, vf, outcome)
    }

    #[test]
    fn schema_mismatch_is_rejected() {
        let mut snapshot = solved_corridor();
        snapshot.schema_version = "0.1.0".to_string();
        let err = snapshot.validate().unwrap_err();
        assert_eq!(err.code(), 50);
    }

    #[test]
    fn grid_must_match_world() {
        let mut snapshot = solved_corridor();
        snapshot.config.world.width = 6;
        snapshot.config.world.goals = vec![cg_common::State::new(0, 5)];
        let err = snapshot.validate().unwrap_err();
        assert!(matches!(err, Error::CorruptSnapshot(_)));
    }

    #[test]
    fn json_round_trip_is_exact() {
        let snapshot = solved_corridor();
        let text = serde_json::to_string(&snapshot).unwrap();
        let back = Snapshot::from_json(&text).unwrap();
        assert_eq!(back, snapshot);
        assert!(back.config_snapshot.matches(&back.config));
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corridor.json");
        let snapshot = solved_corridor();
        save_snapshot(&path, &snapshot).unwrap();
        let loaded = load_snapshot(&path).unwrap();
        let vf = loaded.value_function().unwrap();
        let start = cg_common::State::new(0, 0);
        assert_eq!(
            vf.cvar_at(start, 0.2).unwrap(),
            snapshot.value_function().unwrap().cvar_at(start, 0.2).unwrap()
        );
    }
}
