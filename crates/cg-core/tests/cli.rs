//! CLI tests for the cvar-grid binary.
//!
//! Every test pins the configuration with `--preset` or `--config` so a
//! developer's own config files do not leak in.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

/// Get a Command for the cvar-grid binary.
fn cvar_grid() -> Command {
    let mut cmd = Command::cargo_bin("cvar-grid").expect("cvar-grid binary should exist");
    cmd.env_remove("CVAR_GRID_CONFIG")
        .env_remove("CVAR_GRID_CONFIG_DIR")
        .env("CG_LOG", "error");
    cmd
}

fn solve_corridor(out: &Path) {
    cvar_grid()
        .args(["--preset", "corridor", "solve", "--out"])
        .arg(out)
        .assert()
        .success()
        .code(0);
}

fn stdout_json(cmd: &mut Command) -> Value {
    let output = cmd.output().unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).unwrap()
}

// ============================================================================
// solve
// ============================================================================

#[test]
fn solve_writes_snapshot_and_reports_convergence() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("corridor.json");
    let json = stdout_json(
        cvar_grid()
            .args(["--preset", "corridor", "solve", "--out"])
            .arg(&out),
    );
    assert_eq!(json["command"], "solve");
    assert_eq!(json["outcome"]["status"], "converged");
    assert!(out.exists());
    let saved: Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(saved["config"]["world"]["width"], 5);
}

#[test]
fn capped_solve_exits_one() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("capped.json");
    cvar_grid()
        .args(["--preset", "corridor", "solve", "--max-iters", "1", "--out"])
        .arg(&out)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"capped\""));
    assert!(out.exists());
}

// ============================================================================
// queries
// ============================================================================

#[test]
fn cvar_for_one_cell() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("corridor.json");
    solve_corridor(&out);

    let json = stdout_json(
        cvar_grid()
            .args(["cvar", "--alpha", "0.5", "--row", "0", "--col", "0", "--input"])
            .arg(&out),
    );
    let expected: f64 = (0..4).map(|k| -0.15 * 0.95_f64.powi(k)).sum();
    let got = json["cvar"].as_f64().unwrap();
    assert!((got - expected).abs() < 1e-9);
    assert_eq!(json["action"], "right");
}

#[test]
fn cvar_map_covers_grid() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("corridor.json");
    solve_corridor(&out);

    let json = stdout_json(cvar_grid().args(["cvar", "--alpha", "1", "--input"]).arg(&out));
    assert_eq!(json["height"], 1);
    assert_eq!(json["cvar"][0].as_array().unwrap().len(), 5);
}

#[test]
fn path_walks_the_corridor() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("corridor.json");
    solve_corridor(&out);

    let json = stdout_json(cvar_grid().args(["path", "--alpha", "0.1", "--input"]).arg(&out));
    assert_eq!(json["steps"], 4);
    assert_eq!(json["path"][4]["col"], 4);
}

#[test]
fn evaluate_reports_stats() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("corridor.json");
    solve_corridor(&out);

    let json = stdout_json(
        cvar_grid()
            .args([
                "evaluate", "--alpha", "0.25", "--policy", "fixed", "--episodes", "20",
                "--workers", "2", "--seed", "3", "--input",
            ])
            .arg(&out),
    );
    assert_eq!(json["stats"]["episodes"], 20);
    assert_eq!(json["stats"]["policy"], "fixed");
    let cvar = json["stats"]["cvar"].as_f64().unwrap();
    let predicted = json["predicted_cvar"].as_f64().unwrap();
    assert!((cvar - predicted).abs() < 1e-9);
}

#[test]
fn evaluate_sweep_tabulates_both_policies() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("corridor.json");
    solve_corridor(&out);

    let json = stdout_json(
        cvar_grid()
            .args(["evaluate", "--sweep", "--episodes", "4", "--workers", "2", "--input"])
            .arg(&out),
    );
    let alphas = json["alphas"].as_array().unwrap();
    assert_eq!(alphas.len(), 9);
    assert_eq!(alphas[0], 1.0);
    let sweep = json["sweep"].as_array().unwrap();
    assert_eq!(sweep.len(), 18);
    assert_eq!(sweep[0]["policy"], "time-consistent");
    assert_eq!(sweep[9]["policy"], "fixed");
    assert_eq!(sweep[17]["alpha"], 0.001);
    let predicted = json["predicted_cvar"].as_array().unwrap();
    for (row, stats) in sweep.iter().enumerate() {
        let cvar = stats["cvar"].as_f64().unwrap();
        let model = predicted[row % 9].as_f64().unwrap();
        assert!((cvar - model).abs() < 1e-9, "row {}: {} vs {}", row, cvar, model);
    }
}

#[test]
fn evaluate_needs_alpha_or_sweep() {
    cvar_grid()
        .args(["evaluate", "--input", "x.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--alpha"));
    cvar_grid()
        .args(["evaluate", "--sweep", "--alpha", "0.5", "--input", "x.json"])
        .assert()
        .failure();
}

#[test]
fn human_format_prints_text() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("corridor.json");
    solve_corridor(&out);

    cvar_grid()
        .args(["--format", "human", "path", "--alpha", "0.5", "--input"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("4 steps"));
}

// ============================================================================
// errors
// ============================================================================

#[test]
fn zero_alpha_is_an_argument_error() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("corridor.json");
    solve_corridor(&out);

    cvar_grid()
        .args(["cvar", "--alpha", "0", "--input"])
        .arg(&out)
        .assert()
        .code(10)
        .stderr(predicate::str::contains("\"code\": 30"));
}

#[test]
fn cell_outside_grid_is_an_argument_error() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("corridor.json");
    solve_corridor(&out);

    cvar_grid()
        .args(["cvar", "--alpha", "0.5", "--row", "3", "--col", "0", "--input"])
        .arg(&out)
        .assert()
        .code(10);
}

#[test]
fn missing_snapshot_is_io_error() {
    let dir = tempdir().unwrap();
    cvar_grid()
        .args(["path", "--alpha", "0.5", "--input"])
        .arg(dir.path().join("absent.json"))
        .assert()
        .code(21)
        .stderr(predicate::str::contains("ERR_IO"));
}

#[test]
fn corrupt_cell_is_io_error() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("corridor.json");
    solve_corridor(&out);

    let mut json: Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    json["grid"]["cells"][0]["atoms"] = serde_json::json!([0.0, 0.6, 0.5, 0.75, 1.0]);
    fs::write(&out, serde_json::to_string(&json).unwrap()).unwrap();

    cvar_grid()
        .args(["cvar", "--alpha", "0.5", "--input"])
        .arg(&out)
        .assert()
        .code(21)
        .stderr(predicate::str::contains("ERR_IO"))
        .stderr(predicate::str::contains("\"code\": 51"));
}

#[test]
fn row_without_col_is_rejected_by_clap() {
    cvar_grid()
        .args(["cvar", "--input", "x.json", "--alpha", "0.5", "--row", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

// ============================================================================
// config
// ============================================================================

#[test]
fn config_presets_lists_all() {
    cvar_grid()
        .args(["config", "presets"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("corridor")
                .and(predicate::str::contains("cliff"))
                .and(predicate::str::contains("large")),
        );
}

#[test]
fn config_show_preset() {
    let json = stdout_json(cvar_grid().args(["--preset", "large", "config", "show"]));
    assert_eq!(json["config"]["world"]["height"], 50);
    assert_eq!(json["source"]["kind"], "preset");
}

#[test]
fn config_validate_accepts_good_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, r#"{"solver": {"gamma": 0.9}}"#).unwrap();
    cvar_grid()
        .args(["config", "validate"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("valid"));
}

#[test]
fn config_validate_rejects_bad_gamma() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, r#"{"solver": {"gamma": 1.5}}"#).unwrap();
    cvar_grid()
        .args(["config", "validate"])
        .arg(&path)
        .assert()
        .code(11)
        .stderr(predicate::str::contains("ERR_CONFIG"));
}

#[test]
fn unknown_preset_is_rejected() {
    cvar_grid()
        .args(["--preset", "volcano", "config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown preset"));
}
