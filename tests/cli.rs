use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Runs glyphpad with config and data directories inside `home`.
fn glyphpad_cmd(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("glyphpad").expect("binary exists");
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env("XDG_DATA_HOME", home.path().join("data"));
    cmd
}

fn store_path(home: &TempDir) -> std::path::PathBuf {
    home.path().join("data").join("glyphpad").join("symbols.json")
}

fn write_store(home: &TempDir) {
    let path = store_path(home);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(
        path,
        r#"{
  "version": 1,
  "symbols": [
    { "name": "circle", "training_size": 5, "command": "firefox", "arguments": [] },
    { "name": "square", "training_size": 6, "active": false, "command": "" }
  ]
}"#,
    )
    .unwrap();
}

#[test]
fn help_prints_usage() {
    let home = TempDir::new().unwrap();
    glyphpad_cmd(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Draw symbols on your touchpad to trigger shell commands",
        ));
}

#[test]
fn add_rejects_small_training_size() {
    let home = TempDir::new().unwrap();
    glyphpad_cmd(&home)
        .args(["add", "3", "circle", "touch", "/tmp/glyphpad-circle"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("at least 5"));
}

#[test]
fn run_rejects_unknown_mode() {
    let home = TempDir::new().unwrap();
    glyphpad_cmd(&home)
        .args(["run", "16"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn list_without_store_reports_nothing() {
    let home = TempDir::new().unwrap();
    glyphpad_cmd(&home)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No symbols stored."));
}

#[test]
fn list_shows_stored_symbols() {
    let home = TempDir::new().unwrap();
    write_store(&home);
    glyphpad_cmd(&home)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("circle").and(predicate::str::contains("firefox")))
        .stdout(predicate::str::contains("inactive"));
}

#[test]
fn deactivate_and_delete_update_store() {
    let home = TempDir::new().unwrap();
    write_store(&home);

    glyphpad_cmd(&home)
        .args(["deactivate", "-s", "circle"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deactivated 1 symbol(s)."));

    glyphpad_cmd(&home)
        .args(["delete", "-s", "square"])
        .assert()
        .success();

    let stored = std::fs::read_to_string(store_path(&home)).unwrap();
    assert!(stored.contains("\"circle\""));
    assert!(!stored.contains("\"square\""));
    assert!(stored.contains("\"active\": false"));
}

#[test]
fn delete_unknown_symbol_fails() {
    let home = TempDir::new().unwrap();
    write_store(&home);
    glyphpad_cmd(&home)
        .args(["delete", "-s", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown symbol 'nope'"));
}

#[test]
fn modify_rebinds_command() {
    let home = TempDir::new().unwrap();
    write_store(&home);
    glyphpad_cmd(&home)
        .args(["modify", "square", "notify-send", "square drawn"])
        .assert()
        .success()
        .stdout(predicate::str::contains("'square' now runs: notify-send square drawn"));
}

#[test]
fn corrupt_store_is_reported_with_path() {
    let home = TempDir::new().unwrap();
    let path = store_path(&home);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "{ not json").unwrap();

    glyphpad_cmd(&home)
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("symbols.json"));
}

#[test]
fn offline_repeat_without_symbols() {
    let home = TempDir::new().unwrap();
    glyphpad_cmd(&home)
        .args(["repeat", "--offline"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Rebuilt 0 template(s)."));
}
