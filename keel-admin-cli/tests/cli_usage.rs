use assert_cmd::prelude::*;
use predicates::str::contains;
use std::process::Command;

fn cli() -> Command {
    let mut cmd = Command::cargo_bin("keel-admin").expect("binary exists");
    cmd.env_remove("KEEL_ADMIN_CONFIG")
        .env_remove("KEEL_NAME_SERVERS");
    cmd
}

#[test]
fn help_lists_subcommands() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("clusters"))
        .stdout(contains("monitor"));
}

#[test]
fn malformed_name_server_is_rejected() {
    cli()
        .args(["--name-servers", "no-port", "clusters", "list"])
        .assert()
        .failure()
        .stderr(contains("no-port"));
}

#[test]
fn missing_config_file_is_reported() {
    cli()
        .args(["--config", "/nonexistent/keel-admin.yaml", "clusters", "list"])
        .assert()
        .failure()
        .stderr(contains("/nonexistent/keel-admin.yaml"));
}

#[test]
fn unreachable_name_server_fails_the_command() {
    // nothing listens on port 1, so no name server ever connects
    cli()
        .args(["--name-servers", "127.0.0.1:1", "clusters", "list"])
        .assert()
        .failure()
        .stderr(contains("no available name server"));
}

#[test]
fn monitor_rejects_zero_interval() {
    cli()
        .args(["--name-servers", "127.0.0.1:1", "monitor", "--interval", "0"])
        .assert()
        .failure()
        .stderr(contains("scan_interval_seconds must be greater than zero"));
}
