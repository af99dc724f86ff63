//! Integration tests for the vmlink binary
//!
//! Every test points VMLINK_CONFIG_DIR at a fresh directory so the
//! operator's own configuration is never read.

use std::path::Path;
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};
use tempfile::{tempdir, TempDir};
use vmlink_core::sdk::memory::bearer_token_expiring_at;

const VMLINK_BINARY: &str = env!("CARGO_BIN_EXE_vmlink");

fn run(config_dir: &Path, args: &[&str]) -> Output {
    Command::new(VMLINK_BINARY)
        .env("VMLINK_CONFIG_DIR", config_dir)
        .env_remove("JOURNAL_STREAM")
        .args(args)
        .output()
        .expect("Failed to run vmlink")
}

fn workspace() -> TempDir {
    tempdir().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

#[test]
fn test_help_lists_commands() {
    let dir = workspace();
    let output = run(dir.path(), &["--help"]);

    assert!(output.status.success());
    let text = stdout(&output);
    for command in ["connect", "check", "validate", "token-ttl"] {
        assert!(text.contains(command), "help should mention {}", command);
    }
}

#[test]
fn test_validate_valid_file() {
    let dir = workspace();
    let file = dir.path().join("vc.json");
    std::fs::write(
        &file,
        r#"{"server": "vc01.lab.local", "user": "administrator@vsphere.local", "password": "VMware1!"}"#,
    )
    .unwrap();

    let output = run(dir.path(), &["validate", "hypervisor", file.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("valid hypervisor credentials file"));
}

#[test]
fn test_validate_missing_field_is_configuration_error() {
    let dir = workspace();
    let file = dir.path().join("sddc.json");
    std::fs::write(&file, r#"{"address": "sddc01.lab.local", "username": "admin@local"}"#).unwrap();

    let output = run(dir.path(), &["validate", "controller", file.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(8));
    assert!(stdout(&output).contains("entry 0: missing secret"));
}

#[test]
fn test_validate_truncated_file() {
    let dir = workspace();
    let file = dir.path().join("sddc.json");
    std::fs::write(&file, r#"{"address": "sddc01"#).unwrap();

    let output = run(dir.path(), &["validate", "controller", file.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(8));
}

#[test]
fn test_token_ttl() {
    let dir = workspace();
    let token = bearer_token_expiring_at(now() + 3600);

    let output = run(dir.path(), &["token-ttl", &token]);

    assert_eq!(output.status.code(), Some(0));
    let text = stdout(&output);
    assert!(text.contains("Expires at:"));
    assert!(text.contains("Time to live: 59.") || text.contains("Time to live: 60.0"));
}

#[test]
fn test_token_ttl_expired() {
    let dir = workspace();
    let token = bearer_token_expiring_at(now() - 600);

    let output = run(dir.path(), &["token-ttl", &token]);

    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("expired"));
}

#[test]
fn test_token_ttl_rejects_garbage() {
    let dir = workspace();
    let output = run(dir.path(), &["token-ttl", "not-a-token"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_unknown_endpoint_kind_is_parameter_error() {
    let dir = workspace();
    let output = run(dir.path(), &["validate", "router", "x.json"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_connect_without_credentials_non_interactive() {
    let dir = workspace();
    let output = run(dir.path(), &["--non-interactive", "connect", "controller"]);

    assert_eq!(output.status.code(), Some(8));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("controller-credentials.json"));
}

#[test]
fn test_invalid_config_is_configuration_error() {
    let dir = workspace();
    std::fs::write(
        dir.path().join("config.toml"),
        "[reconnection]\nmax_interactive_attempts = 50\n",
    )
    .unwrap();

    let output = run(dir.path(), &["token-ttl", "a.b.c"]);

    assert_eq!(output.status.code(), Some(8));
    assert!(String::from_utf8_lossy(&output.stderr).contains("max_interactive_attempts"));
}
