//! CLI structure and argument parsing tests.

#![allow(clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;

fn stratus() -> Command {
    Command::cargo_bin("stratus").expect("stratus binary should exist")
}

#[test]
fn no_args_shows_help_and_exits_nonzero() {
    // clap with arg_required_else_help prints help on stderr and exits 2
    stratus()
        .assert()
        .code(2)
        .stderr(predicate::str::contains(
            "Automated MySQL cluster topologies on EC2",
        ));
}

#[test]
fn help_lists_every_topology_and_cleanup() {
    stratus()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("standalone"))
        .stdout(predicate::str::contains("cluster"))
        .stdout(predicate::str::contains("gatekeeper"))
        .stdout(predicate::str::contains("cleanup"));
}

#[test]
fn version_flag_reports_version() {
    stratus()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("stratus"));
}

#[test]
fn unknown_subcommand_is_rejected() {
    stratus()
        .arg("teardown")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn deploy_flags_are_global() {
    stratus()
        .args(["cluster", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--keypair"))
        .stdout(predicate::str::contains("--identity-file"))
        .stdout(predicate::str::contains("--root-password"));
}
