//! CLI tests for the `coder` binary.
//!
//! Spawns the binary and verifies exit codes for failures that occur before
//! any model call, so no network access is needed.

use std::process::Command;

use coder::exit_codes;

fn coder() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_coder"));
    cmd.env("RUST_LOG", "off");
    cmd
}

#[test]
fn unknown_workflow_exits_with_dedicated_code() {
    let temp = tempfile::tempdir().expect("tempdir");
    let workspace = temp.path().join("ws");

    let output = coder()
        .args(["--request", "anything", "--agent", "swarm", "--workspace"])
        .arg(&workspace)
        .output()
        .expect("run coder");

    assert_eq!(output.status.code(), Some(exit_codes::UNKNOWN_WORKFLOW));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("workflow 'swarm' is not implemented"));
    assert!(!workspace.exists(), "workspace untouched on fatal selector");
}

#[test]
fn missing_ignore_file_fails_and_creates_workspace() {
    let temp = tempfile::tempdir().expect("tempdir");
    let workspace = temp.path().join("fresh");

    let output = coder()
        .args(["--request", "add a module", "--workspace"])
        .arg(&workspace)
        .output()
        .expect("run coder");

    assert_eq!(output.status.code(), Some(exit_codes::FAILED));
    assert!(workspace.is_dir());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("missing ignore file"));
    assert!(!workspace.join("ca_logs/plan.json").exists());
}

#[test]
fn execute_phase_without_plan_fails() {
    let temp = tempfile::tempdir().expect("tempdir");
    std::fs::write(temp.path().join(".caignore"), "").expect("write ignore");

    let output = coder()
        .args(["--request", "goal", "--phase", "execute", "--workspace"])
        .arg(temp.path())
        .output()
        .expect("run coder");

    assert_eq!(output.status.code(), Some(exit_codes::FAILED));
    assert!(String::from_utf8_lossy(&output.stderr).contains("read plan"));
}

#[test]
fn missing_request_is_a_usage_error() {
    let status = coder().arg("--agent").arg("plan-execute").status().expect("run coder");
    assert_eq!(status.code(), Some(exit_codes::USAGE));
}

#[test]
fn invalid_config_fails_before_planning() {
    let temp = tempfile::tempdir().expect("tempdir");
    std::fs::write(temp.path().join(".caignore"), "").expect("write ignore");
    std::fs::write(temp.path().join(".caconfig.toml"), "log_dir = \"a/b\"\n").expect("config");

    let output = coder()
        .args(["--request", "goal", "--workspace"])
        .arg(temp.path())
        .output()
        .expect("run coder");

    assert_eq!(output.status.code(), Some(exit_codes::FAILED));
    assert!(String::from_utf8_lossy(&output.stderr).contains("single path segment"));
}

#[test]
fn legacy_selector_runs_plan_execute() {
    let temp = tempfile::tempdir().expect("tempdir");

    let output = coder()
        .args(["--request", "goal", "--agent", "coder_custom", "--workspace"])
        .arg(temp.path())
        .output()
        .expect("run coder");

    assert_eq!(output.status.code(), Some(exit_codes::FAILED));
    assert!(String::from_utf8_lossy(&output.stderr).contains("missing ignore file"));
}
