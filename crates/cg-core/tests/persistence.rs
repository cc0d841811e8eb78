//! Snapshot save/load tests.

use std::fs;

use cg_common::State;
use cg_config::{get_preset, ConfigSource, PresetName, SolverConfig, WorldConfig};
use cg_core::{load_snapshot, save_snapshot, Error, GridWorld, Snapshot, ValueIteration};
use tempfile::tempdir;

fn solved(world: WorldConfig, solver: SolverConfig) -> Snapshot {
    let mut config = get_preset(PresetName::Cliff);
    config.world = world;
    config.solver = solver;
    let (vf, outcome) = ValueIteration::new(GridWorld::new(config.world.clone()), config.solver.clone())
        .run()
        .unwrap();
    Snapshot::from_run(config, ConfigSource::BuiltinDefault, None, vf, outcome)
}

#[test]
fn noisy_world_round_trips_bit_for_bit() {
    let snapshot = solved(
        WorldConfig::cliff_walker(3, 8, 0.1),
        SolverConfig {
            max_iters: 25,
            ..SolverConfig::default()
        },
    );
    let dir = tempdir().unwrap();
    let path = dir.path().join("solution.json");
    save_snapshot(&path, &snapshot).unwrap();

    let loaded = load_snapshot(&path).unwrap();
    assert_eq!(loaded.grid, snapshot.grid);
    assert_eq!(loaded.outcome, snapshot.outcome);

    let before = snapshot.value_function().unwrap();
    let after = loaded.value_function().unwrap();
    for alpha in [0.01, 0.3, 1.0] {
        assert_eq!(
            before.cvar_map(alpha).unwrap(),
            after.cvar_map(alpha).unwrap()
        );
    }
    let start = State::new(0, 0);
    assert_eq!(
        before.next_action(start, 0.2).unwrap().0,
        after.next_action(start, 0.2).unwrap().0
    );
}

#[test]
fn cliff_cells_are_stored_as_null() {
    let snapshot = solved(
        WorldConfig::cliff_walker(2, 10, 0.0),
        SolverConfig {
            max_iters: 30,
            ..SolverConfig::default()
        },
    );
    let json: serde_json::Value = serde_json::to_value(&snapshot).unwrap();
    let cells = json["grid"]["cells"].as_array().unwrap();
    assert_eq!(cells.len(), 20);
    // Row 0, column 2 is a cliff.
    assert!(cells[2].is_null());
    assert!(cells[0].is_object());
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempdir().unwrap();
    let err = load_snapshot(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn garbage_is_json_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.json");
    fs::write(&path, "{\"schema_version\": ").unwrap();
    let err = load_snapshot(&path).unwrap_err();
    assert!(matches!(err, Error::Json(_)));
}

#[test]
fn tampered_cell_is_rejected() {
    let snapshot = solved(
        WorldConfig::cliff_walker(1, 4, 0.0),
        SolverConfig {
            nb_atoms: 4,
            ..SolverConfig::default()
        },
    );
    let mut json: serde_json::Value = serde_json::to_value(&snapshot).unwrap();
    json["grid"]["cells"][0]["yc"] = serde_json::json!([0.0]);

    let dir = tempdir().unwrap();
    let path = dir.path().join("tampered.json");
    fs::write(&path, serde_json::to_string(&json).unwrap()).unwrap();
    let err = load_snapshot(&path).unwrap_err();
    assert!(matches!(err, Error::CorruptSnapshot(_)), "{}", err);
    assert_eq!(err.code(), 51);
    assert!(err.to_string().contains("cell (0, 0)"), "{}", err);
}

#[test]
fn unordered_atoms_are_a_corrupt_snapshot() {
    let snapshot = solved(
        WorldConfig::cliff_walker(1, 4, 0.0),
        SolverConfig {
            nb_atoms: 4,
            ..SolverConfig::default()
        },
    );
    let mut json: serde_json::Value = serde_json::to_value(&snapshot).unwrap();
    json["grid"]["cells"][0]["atoms"] = serde_json::json!([0.0, 0.6, 0.5, 0.75, 1.0]);

    let err = Snapshot::from_json(&serde_json::to_string(&json).unwrap()).unwrap_err();
    assert!(matches!(err, Error::CorruptSnapshot(_)), "{}", err);
    assert_eq!(cg_core::ExitCode::for_error(&err), cg_core::ExitCode::IoError);
}
