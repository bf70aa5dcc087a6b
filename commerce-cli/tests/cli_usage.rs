//! Usage errors are reported before any configuration or database access

use assert_cmd::Command;
use predicates::prelude::*;

fn migrate() -> Command {
    let mut cmd = Command::cargo_bin("commerce-migrate").unwrap();
    // Unreachable on purpose: a usage error must fail before connecting.
    cmd.env("DATABASE_URL", "postgres://nobody@127.0.0.1:1/none");
    cmd
}

#[test]
fn test_no_args_is_usage_error() {
    migrate()
        .assert()
        .failure()
        .stderr(predicate::str::contains("DIRECTION"));
}

#[test]
fn test_unknown_direction_is_rejected() {
    migrate()
        .arg("sideways")
        .assert()
        .failure()
        .stderr(predicate::str::contains("-up").and(predicate::str::contains("-down")));
}

#[test]
fn test_two_args_are_rejected() {
    migrate()
        .arg("-up")
        .arg("-down")
        .assert()
        .failure()
        .stderr(predicate::str::contains("connect").not());
}

#[test]
fn test_help_is_not_an_argument() {
    migrate().arg("--help").assert().failure().code(2);
    migrate().arg("--version").assert().failure().code(2);
}

#[test]
fn test_flag_plus_direction_is_two_args() {
    migrate()
        .arg("--debug")
        .arg("-up")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("connect").not());
}
