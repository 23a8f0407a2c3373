use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../fixtures/monaco").join(name)
}

fn racesim() -> Command {
    Command::cargo_bin("racesim").unwrap()
}

fn with(out: &Path, model: &Path, trials: &str) -> Command {
    let mut cmd = racesim();
    cmd.arg("--features")
        .arg(fixture("features.json"))
        .arg("--model")
        .arg(model)
        .arg("--config")
        .arg(fixture("config.json"))
        .arg("--trials")
        .arg(trials)
        .arg("--out")
        .arg(out);
    cmd
}

fn base(out: &Path) -> Command {
    with(out, &fixture("model.json"), "200")
}

#[test]
fn run_writes_report_and_prints_table() {
    let d = tempfile::tempdir().unwrap();
    base(d.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Monaco"))
        .stdout(predicate::str::contains("VER"));

    let report: Value = serde_json::from_slice(&fs::read(d.path().join("report.json")).unwrap()).unwrap();
    assert!(report["id"].as_str().unwrap().starts_with("SIM:"));
    assert_eq!(report["trials_completed"], 200);
    assert_eq!(report["drivers"].as_object().unwrap().len(), 13);

    let record: Value = serde_json::from_slice(&fs::read(d.path().join("run_record.json")).unwrap()).unwrap();
    assert_eq!(record["report_id"], report["id"]);
    assert_eq!(record["seed"], 2025);
    assert_eq!(record["seed_source"], "config");
}

#[test]
fn same_seed_same_bytes_across_worker_counts() {
    let a = tempfile::tempdir().unwrap();
    let b = tempfile::tempdir().unwrap();
    base(a.path()).args(["--workers", "1", "--quiet"]).assert().success();
    base(b.path()).args(["--workers", "4", "--batch-size", "7", "--quiet"]).assert().success();
    let ra = fs::read(a.path().join("report.json")).unwrap();
    let rb = fs::read(b.path().join("report.json")).unwrap();
    assert_eq!(ra, rb);
}

#[test]
fn seed_flag_changes_report_id() {
    let a = tempfile::tempdir().unwrap();
    let b = tempfile::tempdir().unwrap();
    base(a.path()).args(["--quiet"]).assert().success();
    base(b.path()).args(["--seed", "0x2A", "--quiet"]).assert().success();
    let ia: Value = serde_json::from_slice(&fs::read(a.path().join("report.json")).unwrap()).unwrap();
    let ib: Value = serde_json::from_slice(&fs::read(b.path().join("report.json")).unwrap()).unwrap();
    assert_ne!(ia["id"], ib["id"]);
    assert_eq!(ib["seed"], 42);
}

#[test]
fn zero_trials_is_validation_error() {
    let d = tempfile::tempdir().unwrap();
    with(d.path(), &fixture("model.json"), "0")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("trial_count"));
    assert!(!d.path().join("report.json").exists());
}

#[test]
fn missing_input_file_is_io_error() {
    let d = tempfile::tempdir().unwrap();
    racesim()
        .arg("--features")
        .arg(d.path().join("nope.json"))
        .arg("--model")
        .arg(fixture("model.json"))
        .arg("--out")
        .arg(d.path())
        .assert()
        .code(4);
}

#[test]
fn model_needing_unknown_feature_is_schema_error() {
    let d = tempfile::tempdir().unwrap();
    let model = d.path().join("model.json");
    fs::write(&model, r#"{"intercept": 0.0, "weights": {"qualifying_time": 1.0, "tyre_wear": 0.5}}"#).unwrap();
    with(d.path(), &model, "200")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("tyre_wear"));
}

#[test]
fn validate_only_writes_nothing() {
    let d = tempfile::tempdir().unwrap();
    base(d.path())
        .arg("--validate-only")
        .assert()
        .success()
        .stderr(predicate::str::contains("inputs OK"));
    assert!(!d.path().join("report.json").exists());
}

#[test]
fn bad_seed_is_usage_error() {
    let d = tempfile::tempdir().unwrap();
    base(d.path()).args(["--seed", "0xZZ"]).assert().code(2);
}

#[test]
fn remote_paths_are_rejected() {
    let d = tempfile::tempdir().unwrap();
    racesim()
        .args(["--features", "https://example.org/f.json"])
        .arg("--model")
        .arg(fixture("model.json"))
        .arg("--out")
        .arg(d.path())
        .assert()
        .code(2);
}

#[test]
fn html_and_view_renderings() {
    let d = tempfile::tempdir().unwrap();
    base(d.path()).args(["--render", "html", "json", "--quiet"]).assert().success().stdout("");
    let html = fs::read_to_string(d.path().join("report.html")).unwrap();
    assert!(html.contains("<table"));
    assert!(html.contains("VER"));
    let view: Value = serde_json::from_slice(&fs::read(d.path().join("report_view.json")).unwrap()).unwrap();
    assert!(view.is_object());
}

#[test]
fn non_finite_score_is_predictor_failure() {
    let d = tempfile::tempdir().unwrap();
    let model = d.path().join("model.json");
    fs::write(
        &model,
        r#"{"intercept": 0.0, "weights": {"qualifying_time": 1e308, "clean_air_race_pace": 1e308}}"#,
    )
    .unwrap();
    with(d.path(), &model, "200")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("predictor failure"));
    assert!(!d.path().join("report.json").exists());
}
