//! Smoke tests for the `exstore` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;

fn exstore(dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("exstore").unwrap();
    cmd.arg("--dir").arg(dir);
    cmd
}

#[test]
fn save_get_list_roundtrip() {
    let tmp = tempfile::tempdir().unwrap();
    let store_dir = tmp.path().join("store");

    let payload = json!({
        "type": "tf",
        "slug": "ser-vs-estar",
        "title_es": "Ser o estar",
        "instructions_es": "Marca verdadero o falso.",
        "items": [{"statement_es": "Hola", "answer": "true", "order": 1}],
    });
    let file = tmp.path().join("payload.json");
    std::fs::write(&file, payload.to_string()).unwrap();

    exstore(&store_dir)
        .arg("save")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("tf/ser-vs-estar version 001"));

    exstore(&store_dir)
        .args(["get", "tf", "ser-vs-estar"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"checksum\": \"sha256:"));

    exstore(&store_dir)
        .args(["list", "--type", "tf"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tf/ser-vs-estar"));

    exstore(&store_dir)
        .args(["versions", "tf", "ser-vs-estar"])
        .assert()
        .success()
        .stdout(predicate::str::contains("001"));
}

#[test]
fn save_rejects_invalid_payload() {
    let tmp = tempfile::tempdir().unwrap();
    let store_dir = tmp.path().join("store");

    let file = tmp.path().join("bad.json");
    std::fs::write(&file, r#"{"type": "tf", "slug": "x"}"#).unwrap();

    exstore(&store_dir)
        .arg("save")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Validation failed"));
}

#[test]
fn get_unknown_exercise_fails() {
    let tmp = tempfile::tempdir().unwrap();

    exstore(tmp.path())
        .args(["get", "mcq", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn doctor_reports_store_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let store_dir = tmp.path().join("store");

    exstore(&store_dir)
        .arg("doctor")
        .assert()
        .success()
        .stdout(predicate::str::contains(store_dir.to_str().unwrap()))
        .stdout(predicate::str::contains("pointers repaired: 0"));
}

#[test]
fn hard_delete_prompts_unless_confirmed() {
    let tmp = tempfile::tempdir().unwrap();
    let store_dir = tmp.path().join("store");

    let payload = json!({
        "type": "tf",
        "slug": "temp",
        "title_es": "T",
        "instructions_es": "I",
        "items": [{"statement_es": "Hola", "answer": "true", "order": 1}],
    });
    let file = tmp.path().join("payload.json");
    std::fs::write(&file, payload.to_string()).unwrap();
    exstore(&store_dir).arg("save").arg(&file).assert().success();

    // Declined prompt leaves the exercise in place
    exstore(&store_dir)
        .args(["delete", "tf", "temp", "--hard"])
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("cancelled"));
    assert!(store_dir.join("tf/temp/001.json").is_file());

    exstore(&store_dir)
        .args(["delete", "tf", "temp", "--hard", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed"));
    assert!(!store_dir.join("tf/temp").exists());
}
