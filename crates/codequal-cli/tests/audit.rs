use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn codequal() -> Command {
    Command::cargo_bin("codequal").unwrap()
}

#[test]
fn defaults_lists_extensions_and_ignored_dirs() {
    codequal()
        .arg("defaults")
        .assert()
        .success()
        .stdout(predicate::str::contains(".py"))
        .stdout(predicate::str::contains("node_modules"));
}

#[test]
fn defaults_json_is_valid() {
    let output = codequal().args(["defaults", "--json"]).output().unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(value["extensions"]
        .as_array()
        .unwrap()
        .iter()
        .any(|v| v == "py"));
    assert!(value["ignored_dirs"]
        .as_array()
        .unwrap()
        .iter()
        .any(|v| v == ".git"));
}

#[test]
fn audit_of_empty_tree_renders_without_model_calls() {
    let temp = tempfile::tempdir().unwrap();
    let out_path = temp.path().join("report.txt");

    codequal()
        .args(["audit", temp.path().to_str().unwrap()])
        .args(["--output", out_path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Report written to"));

    let rendered = fs::read_to_string(&out_path).unwrap();
    assert!(rendered.contains("Files analysed: 0"));
}

#[test]
fn audit_rejects_missing_root() {
    codequal()
        .args(["audit", "/definitely/not/a/real/path"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not a directory"));
}

#[test]
fn audit_rejects_unreadable_config() {
    let temp = tempfile::tempdir().unwrap();
    codequal()
        .args([
            "--config",
            "/no/such/config.toml",
            "audit",
            temp.path().to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read config file"));
}

#[test]
fn config_file_format_flag_and_json_output() {
    let temp = tempfile::tempdir().unwrap();
    let config_path = temp.path().join("codequal.toml");
    fs::write(
        &config_path,
        "model = \"config-model\"\nignored_dirs = [\"vendor\"]\n",
    )
    .unwrap();

    let project = temp.path().join("project");
    fs::create_dir_all(project.join("vendor")).unwrap();
    fs::write(project.join("vendor/skip.py"), "ignored").unwrap();

    let output = codequal()
        .args(["--config", config_path.to_str().unwrap()])
        .args(["audit", project.to_str().unwrap(), "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["files"].as_array().unwrap().len(), 0);
}
