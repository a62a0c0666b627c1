use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Nothing listens on the discard port, so the API check is always offline.
const OFFLINE_URL: &str = "http://127.0.0.1:9";

/// A project directory with a config/ holding a valid config.api.yaml
fn create_mock_project() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    fs::create_dir(root.join("config")).unwrap();
    fs::create_dir(root.join("data")).unwrap();

    fs::write(
        root.join("config").join("config.api.yaml"),
        r#"id: api
name: API Configuration
description: Test API configuration
provider: api
version: 1.0.0
values:
  port: 3131
  init_test_data: false
  pagination:
    todos:
      first_max: 25
      last_max: 25
"#,
    )
    .unwrap();

    temp_dir
}

fn todoctl(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("todoctl").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("DATA_PATH")
        .env_remove("CONFIGURATION_PATH")
        .env_remove("PORT")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("todoctl").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("todoctl"))
        .stdout(predicate::str::contains("Command line interface"))
        .stdout(predicate::str::contains("serve"));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("todoctl").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("todoctl"));
}

#[test]
fn test_subcommand_help() {
    let mut cmd = Command::cargo_bin("todoctl").unwrap();
    cmd.args(["config", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration management"));

    let mut cmd = Command::cargo_bin("todoctl").unwrap();
    cmd.args(["serve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--port"))
        .stdout(predicate::str::contains("--no-seed"));
}

#[test]
fn test_health_command_text() {
    let project_dir = create_mock_project();

    todoctl(&project_dir)
        .args(["health", "--url", OFFLINE_URL])
        .assert()
        .success()
        .stdout(predicate::str::contains("Todo API Health Check"))
        .stdout(predicate::str::contains("Overall Status"))
        .stdout(predicate::str::contains("DATABASE"));
}

#[test]
fn test_health_command_json() {
    let project_dir = create_mock_project();

    let output = todoctl(&project_dir)
        .args(["health", "--format", "json", "--url", OFFLINE_URL])
        .output()
        .unwrap();
    assert!(output.status.success());

    let status: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(status["status"], "degraded");
    assert_eq!(status["components"]["api"]["status"], "offline");
    assert_eq!(status["components"]["database"]["status"], "not_initialized");
    assert_eq!(status["components"]["configuration"]["status"], "healthy");
    assert_eq!(status["components"]["configuration"]["port"], 3131);
}

#[test]
fn test_config_list_text() {
    let project_dir = create_mock_project();

    todoctl(&project_dir)
        .args(["config", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Todo API Configuration"))
        .stdout(predicate::str::contains("[api]"))
        .stdout(predicate::str::contains("Total sections: 1"));
}

#[test]
fn test_config_list_json() {
    let project_dir = create_mock_project();

    let output = todoctl(&project_dir)
        .args(["config", "list", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let configs: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(configs["api"]["port"], 3131);
}

#[test]
fn test_config_get_valid_path() {
    let project_dir = create_mock_project();

    todoctl(&project_dir)
        .args(["config", "get", "api.pagination.todos.first_max"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration Value"))
        .stdout(predicate::str::contains("25"));
}

#[test]
fn test_config_get_json_format() {
    let project_dir = create_mock_project();

    todoctl(&project_dir)
        .args(["config", "get", "api.port", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3131"));
}

#[test]
fn test_config_get_invalid_path() {
    let project_dir = create_mock_project();

    todoctl(&project_dir)
        .args(["config", "get", "api.nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));

    todoctl(&project_dir)
        .args(["config", "get", "missing.section"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_custom_configuration_path() {
    let project_dir = create_mock_project();
    let custom_config = project_dir.path().join("custom_config");
    fs::create_dir(&custom_config).unwrap();
    fs::write(
        custom_config.join("config.api.yaml"),
        "id: api\nname: Custom\nprovider: api\nversion: '1'\nvalues:\n  port: 4242\n",
    )
    .unwrap();

    todoctl(&project_dir)
        .env("CONFIGURATION_PATH", custom_config.to_str().unwrap())
        .args(["config", "get", "api.port", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("4242"));
}

#[test]
fn test_verbose_flag() {
    let project_dir = create_mock_project();

    todoctl(&project_dir)
        .args(["--verbose", "health", "--url", OFFLINE_URL])
        .assert()
        .success();
}
