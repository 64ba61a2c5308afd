use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn test_help_shows_all_commands() {
    cargo_bin_cmd!("typist")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("chat"))
        .stdout(predicate::str::contains("type"))
        .stdout(predicate::str::contains("ports"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_help_shows_global_overrides() {
    cargo_bin_cmd!("typist")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--port"))
        .stdout(predicate::str::contains("--baud"))
        .stdout(predicate::str::contains("--system-prompt"));
}

#[test]
fn test_type_help_shows_clean_flag() {
    cargo_bin_cmd!("typist")
        .args(["type", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--clean"))
        .stdout(predicate::str::contains("TEXT"));
}

#[test]
fn test_version_flag() {
    cargo_bin_cmd!("typist")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}
