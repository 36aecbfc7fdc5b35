//! Smoke tests for the admin binary's argument and error surface.

use std::process::Command;

#[test]
fn help_lists_subcommands() {
    let output = Command::new(env!("CARGO_BIN_EXE_agentgate-admin"))
        .arg("--help")
        .output()
        .expect("run agentgate-admin --help");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("add-api"));
    assert!(stdout.contains("add-lambda"));
    assert!(stdout.contains("list-targets"));
}

#[test]
fn unknown_subcommand_fails() {
    let output = Command::new(env!("CARGO_BIN_EXE_agentgate-admin"))
        .arg("frobnicate")
        .output()
        .expect("run agentgate-admin frobnicate");
    assert!(!output.status.success());
}

#[test]
fn missing_config_fails_cleanly() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = Command::new(env!("CARGO_BIN_EXE_agentgate-admin"))
        .current_dir(dir.path())
        .arg("list-targets")
        .output()
        .expect("run agentgate-admin list-targets");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("gateway_config.json"));
}
