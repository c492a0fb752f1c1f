// warp_complete/tests/cli_tests.rs
// Drives the warp_complete_cli binary and snapshots its output

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use insta::assert_json_snapshot;
use serde_json::Value;
use tempfile::tempdir;

fn cli() -> Command {
    let mut cmd = Command::cargo_bin("warp_complete_cli").expect("warp_complete_cli binary must be built");
    cmd.env_remove("WARP_COMPLETE_LOG");
    cmd
}

fn write_config(dir: &Path) -> String {
    let path = dir.join("config.yaml");
    fs::write(&path, "extensionMatching: prefix\nqueryShellBuiltins: false\n").unwrap();
    path.display().to_string()
}

fn complete_json(line: &str, cwd: &Path) -> Value {
    let config = write_config(cwd);
    let output = cli()
        .args(["complete", "--json", "--line", line])
        .arg("--cwd")
        .arg(cwd)
        .args(["--config", config.as_str()])
        .assert()
        .success()
        .get_output()
        .clone();
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

fn labels(response: &Value) -> Vec<String> {
    response["candidates"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["label"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn complete_option_value_json() {
    let dir = tempdir().unwrap();
    let response = complete_json("git log -n ", dir.path());

    assert_json_snapshot!(labels(&response), @r###"
    [
      "5",
      "10",
      "20"
    ]
    "###);

    let first = &response["candidates"][0];
    assert_eq!(first["kind"], "argument");
    assert_eq!(first["replacementStart"], 11);
    assert_eq!(first["replacementLength"], 0);
    assert_eq!(response["filesRequested"], false);
    assert!(response.get("resolvedCwd").is_none());
}

#[test]
fn complete_orders_arguments_before_options() {
    let dir = tempdir().unwrap();
    let response = complete_json("kubectl get ", dir.path());

    assert_json_snapshot!(labels(&response), @r###"
    [
      "pod",
      "service",
      "deployment",
      "node",
      "-n",
      "--namespace"
    ]
    "###);
}

#[test]
fn complete_reports_resolved_directory() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("src")).unwrap();
    let response = complete_json("cat src/ma", dir.path());

    assert_eq!(response["filesRequested"], true);
    assert_eq!(
        response["resolvedCwd"].as_str(),
        Some(dir.path().join("src").to_str().unwrap())
    );
}

#[test]
fn complete_text_output() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path());

    cli()
        .args(["complete", "--line", "npm run "])
        .arg("--cwd")
        .arg(dir.path())
        .args(["--config", config.as_str()])
        .assert()
        .success()
        .stdout("build\targument\t\ntest\targument\t\nstart\targument\t\ndev\targument\t\nlint\targument\t\n");
}

#[test]
fn complete_filter_keeps_prefix_matches() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path());

    cli()
        .args(["complete", "--filter", "--line", "git chec"])
        .arg("--cwd")
        .arg(dir.path())
        .args(["--config", config.as_str()])
        .assert()
        .success()
        .stdout("checkout\tmethod\tSwitch branches or restore files\n");
}

#[test]
fn specs_lists_catalog_in_order() {
    let output = cli().arg("specs").assert().success().get_output().clone();
    let lines: Vec<String> = String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(String::from)
        .collect();

    assert_json_snapshot!(lines, @r###"
    [
      "git",
      "docker",
      "npm",
      "cd",
      "ls",
      "cat",
      "code",
      "kubectl"
    ]
    "###);
}

#[test]
fn specs_directory_appends_and_replaces() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("deploy.json"), r#"{ "name": ["deploy", "dp"] }"#).unwrap();
    fs::write(dir.path().join("git.yaml"), "name: git\ndescription: Custom git\n").unwrap();

    let output = cli()
        .arg("specs")
        .arg("--specs")
        .arg(dir.path())
        .assert()
        .success()
        .get_output()
        .clone();
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();

    assert_eq!(lines.first(), Some(&"git"));
    assert_eq!(lines.last(), Some(&"deploy, dp"));
    assert_eq!(lines.len(), 9);
}

#[test]
fn missing_specs_directory_fails() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope");

    let output = cli()
        .arg("specs")
        .arg("--specs")
        .arg(&missing)
        .assert()
        .failure()
        .code(1)
        .get_output()
        .clone();
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to load specs"));
}

#[test]
fn invalid_config_fails() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("config.json");
    fs::write(&config, "{ \"generatorTimeoutMs\": \"soon\" }").unwrap();

    cli()
        .args(["complete", "--line", "git "])
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .code(1);
}

#[test]
fn version_prints_package_version() {
    let output = cli().arg("version").assert().success().get_output().clone();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with(&format!("warp_complete_cli v{}", env!("CARGO_PKG_VERSION"))));
}
