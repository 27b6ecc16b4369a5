//! CLI integration tests using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const STARTER: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../catalogs/starter.toml");

fn cluecraft() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("cluecraft").unwrap()
}

/// A command isolated from any real config or data directory.
fn isolated(dir: &TempDir) -> Command {
    let mut cmd = cluecraft();
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env("CLUECRAFT_DATA_DIR", dir.path().join("data"))
        .env_remove("CLUECRAFT_CATALOG")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn validate_starter_catalog() {
    cluecraft()
        .arg("validate")
        .arg("--catalog")
        .arg(STARTER)
        .assert()
        .success()
        .stdout(predicate::str::contains("Starter Catalog (29 clues)"))
        .stdout(predicate::str::contains("All catalogs valid"));
}

#[test]
fn validate_reports_problems() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(
        &path,
        r#"
[[clues]]
id = "a"
category = "Science"
prompt = "p"
answer = "x"
value = 200

[[clues]]
id = "a"
category = "Science"
answer = "y"
"#,
    )
    .unwrap();

    cluecraft()
        .arg("validate")
        .arg("--catalog")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("duplicate clue ID"))
        .stdout(predicate::str::contains("no clues at tier 5"))
        .stdout(predicate::str::contains("warning(s) found"));
}

#[test]
fn validate_nonexistent_file() {
    cluecraft()
        .arg("validate")
        .arg("--catalog")
        .arg("nonexistent.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn categories_lists_counts() {
    let dir = TempDir::new().unwrap();
    isolated(&dir)
        .arg("categories")
        .arg("--catalog")
        .arg(STARTER)
        .assert()
        .success()
        .stdout(predicate::str::contains("SCIENCE"))
        .stdout(predicate::str::contains("WORLD HISTORY"))
        .stdout(predicate::str::contains("6 categories, 29 clues"));
}

#[test]
fn categories_without_catalog_fails() {
    let dir = TempDir::new().unwrap();
    isolated(&dir)
        .arg("categories")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no catalog configured"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    isolated(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created cluecraft.toml"))
        .stdout(predicate::str::contains("Created catalogs/starter.toml"));

    assert!(dir.path().join("cluecraft.toml").exists());
    assert!(dir.path().join("catalogs/starter.toml").exists());

    // The generated config points at the generated catalog
    isolated(&dir)
        .arg("categories")
        .assert()
        .success()
        .stdout(predicate::str::contains("29 clues"));
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    isolated(&dir).arg("init").assert().success();

    isolated(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn play_records_progress() {
    let dir = TempDir::new().unwrap();

    isolated(&dir)
        .args(["play", "--catalog", STARTER, "--user", "tester"])
        .args(["--mode", "practice", "--category", "science"])
        .args(["--rounds", "2", "--seed", "7"])
        .write_stdin("no idea\nstill no idea\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("[1/2] SCIENCE"))
        .stdout(predicate::str::contains("Incorrect. The answer was:"))
        .stdout(predicate::str::contains("Accuracy"));

    isolated(&dir)
        .args(["insights", "--user", "tester"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Answered"))
        .stdout(predicate::str::contains("0.0%"));

    isolated(&dir)
        .args(["insights", "--user", "tester", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"answered\": 2"));

    isolated(&dir)
        .args(["history", "--user", "tester"])
        .assert()
        .success()
        .stdout(predicate::str::contains("practice"))
        .stdout(predicate::str::contains("SCIENCE"))
        .stdout(predicate::str::contains("0/2"));
}

#[test]
fn play_accepts_correct_answer() {
    let dir = TempDir::new().unwrap();

    // Word Origins holds a single clue
    isolated(&dir)
        .args(["play", "--catalog", STARTER, "--mode", "practice"])
        .args(["--category", "word origins", "--rounds", "1"])
        .write_stdin("sisyphean\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Correct!"));
}

#[test]
fn play_stops_on_quit() {
    let dir = TempDir::new().unwrap();

    isolated(&dir)
        .args(["play", "--catalog", STARTER, "--rounds", "5"])
        .write_stdin("quit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("[1/5]"))
        .stdout(predicate::str::contains("[2/5]").not());
}

#[test]
fn play_rejects_unknown_mode() {
    let dir = TempDir::new().unwrap();

    isolated(&dir)
        .args(["play", "--catalog", STARTER, "--mode", "marathon"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown mode"));
}

#[test]
fn play_with_unmatched_category_is_exhausted() {
    let dir = TempDir::new().unwrap();

    isolated(&dir)
        .args(["play", "--catalog", STARTER, "--category", "opera"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No more clues available"));
}

#[test]
fn history_for_new_user_is_empty() {
    let dir = TempDir::new().unwrap();

    isolated(&dir)
        .args(["history", "--user", "nobody"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No sessions recorded for nobody"));
}

#[test]
fn help_output() {
    cluecraft()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Adaptive trivia trainer"));
}

#[test]
fn version_output() {
    cluecraft()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("cluecraft"));
}
