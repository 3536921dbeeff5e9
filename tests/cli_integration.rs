//! CLI integration tests for yamlc
//!
//! These tests run the binary against small YAML trees on disk and check
//! the JSON it writes or prints.

use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Get a command instance for the yamlc binary, isolated from user config
fn yamlc_cmd(dir: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("yamlc"));
    cmd.current_dir(dir)
        .env("YAMLC_CONFIG_DIR", dir.join(".no-global-config"))
        .env_remove("YAMLC_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

/// Write a file below `dir`, creating parent directories
fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

fn read_json(path: &Path) -> serde_json::Value {
    let text = fs::read_to_string(path).unwrap();
    serde_json::from_str(&text).unwrap()
}

// =============================================================================
// Compile Tests
// =============================================================================

#[test]
fn test_compile_plain_yaml() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "plain.yml", "name: demo\nversion: 3\ntags: [a, b]\n");

    yamlc_cmd(dir.path())
        .args(["compile", "plain.yml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Compiled plain.yml -> plain.json"));

    let text = fs::read_to_string(dir.path().join("plain.json")).unwrap();
    assert_eq!(
        text,
        "{\n  \"name\": \"demo\",\n  \"version\": 3,\n  \"tags\": [\n    \"a\",\n    \"b\"\n  ]\n}"
    );
}

#[test]
fn test_compile_resolves_includes() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.yml", "b: !include b\nnode: !include sub/c *node1\n");
    write(dir.path(), "b.yml", "from: b\n");
    write(
        dir.path(),
        "sub/c.yaml",
        "node1: &node1\n  deep: !include d\nnode2: &node2 ignored\n",
    );
    write(dir.path(), "sub/d.yml", "from: sub/d\n");

    yamlc_cmd(dir.path())
        .args(["compile", "a.yml"])
        .assert()
        .success();

    assert_eq!(
        read_json(&dir.path().join("a.json")),
        serde_json::json!({
            "b": {"from": "b"},
            "node": {"deep": {"from": "sub/d"}}
        })
    );
}

#[test]
fn test_compile_respects_space() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.yml", "a: 1\n");

    yamlc_cmd(dir.path())
        .args(["compile", "a.yml", "--space", "4"])
        .assert()
        .success();

    let text = fs::read_to_string(dir.path().join("a.json")).unwrap();
    assert_eq!(text, "{\n    \"a\": 1\n}");
}

#[test]
fn test_compile_directory_into_out_dir() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "src/app.yml", "app: !include parts/db\n");
    write(dir.path(), "src/parts/db.yaml", "host: localhost\n");
    write(dir.path(), "src/_private.yml", "secret: true\n");

    yamlc_cmd(dir.path())
        .args(["compile", "src", "--out-dir", "dist", "--ignored", "^_"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 file(s) compiled, 1 skipped"));

    assert_eq!(
        read_json(&dir.path().join("dist/app.json")),
        serde_json::json!({"app": {"host": "localhost"}})
    );
    assert!(dir.path().join("dist/parts/db.json").is_file());
    assert!(!dir.path().join("dist/_private.json").exists());
    assert!(!dir.path().join("src/app.json").exists());
}

#[test]
fn test_compile_no_write() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.yml", "a: 1\n");

    yamlc_cmd(dir.path())
        .args(["compile", "a.yml", "--no-write"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Compiled a.yml"));

    assert!(!dir.path().join("a.json").exists());
}

#[test]
fn test_compile_json_report() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.yml", "a: 1\n---\nb: 2\n");

    let output = yamlc_cmd(dir.path())
        .args(["compile", "a.yml", "--format", "json"])
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["compiled"][0]["documents"], 2);
    assert_eq!(report["compiled"][0]["written"], true);
    assert_eq!(report["skipped"], serde_json::json!([]));

    assert_eq!(
        read_json(&dir.path().join("a.json")),
        serde_json::json!([{"a": 1}, {"b": 2}])
    );
}

#[test]
fn test_compile_expands_merge_keys() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "a.yml",
        "base: &base {x: 1, y: 1}\nchild:\n  <<: *base\n  y: 2\nservice:\n  <<: !include defaults\n  port: 9000\n",
    );
    write(dir.path(), "defaults.yml", "host: localhost\nport: 80\n");

    yamlc_cmd(dir.path())
        .args(["compile", "a.yml"])
        .assert()
        .success();

    assert_eq!(
        read_json(&dir.path().join("a.json")),
        serde_json::json!({
            "base": {"x": 1, "y": 1},
            "child": {"x": 1, "y": 2},
            "service": {"host": "localhost", "port": 9000}
        })
    );
}

#[test]
fn test_rooted_include_is_relative_to_working_directory() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "config/app/main.yml", "shared: !include /common/base\n");
    write(dir.path(), "common/base.yml", "from: root\n");

    yamlc_cmd(dir.path())
        .args(["resolve", "config/app/main.yml", "--space", "0"])
        .assert()
        .success()
        .stdout("{\"shared\":{\"from\":\"root\"}}\n");
}

#[test]
fn test_root_dir_flag() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "project/main.yml", "shared: !include /common/base\n");
    write(dir.path(), "project/common/base.yml", "from: project\n");

    yamlc_cmd(dir.path())
        .args(["resolve", "project/main.yml", "--space", "0", "--root-dir", "project"])
        .assert()
        .success()
        .stdout("{\"shared\":{\"from\":\"project\"}}\n");
}

// =============================================================================
// Failure Tests
// =============================================================================

#[test]
fn test_missing_include_fails() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.yml", "x: !include nowhere\n");

    yamlc_cmd(dir.path())
        .args(["compile", "a.yml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nowhere.yaml"));

    assert!(!dir.path().join("a.json").exists());
}

#[test]
fn test_missing_anchor_fails_by_default() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.yml", "x: !include sub/c *missing\n");
    write(dir.path(), "sub/c.yaml", "node1: &node1 1\n");

    yamlc_cmd(dir.path())
        .args(["compile", "a.yml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Anchor 'missing' not found"))
        .stderr(predicate::str::contains("c.yaml"));
}

#[test]
fn test_missing_anchor_warns_when_lenient() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.yml", "x: !include sub/c *missing\n");
    write(dir.path(), "sub/c.yaml", "node1: &node1 1\n");

    yamlc_cmd(dir.path())
        .args(["compile", "a.yml", "--lenient-anchors"])
        .assert()
        .success()
        .stderr(predicate::str::contains("missing"));

    assert_eq!(
        read_json(&dir.path().join("a.json")),
        serde_json::json!({"x": null})
    );
}

#[test]
fn test_cyclic_include_fails() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.yml", "b: !include b\n");
    write(dir.path(), "b.yml", "a: !include a\n");

    yamlc_cmd(dir.path())
        .args(["compile", "a.yml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cyclic include"));
}

#[test]
fn test_malformed_yaml_names_file() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.yml", "x: !include broken\n");
    write(dir.path(), "broken.yml", "key: [unclosed\n");

    yamlc_cmd(dir.path())
        .args(["compile", "a.yml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("broken.yml"));
}

#[test]
fn test_missing_source_fails() {
    let dir = TempDir::new().unwrap();

    yamlc_cmd(dir.path())
        .args(["compile", "ghost.yml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Source not found"));
}

// =============================================================================
// Check / Resolve Tests
// =============================================================================

#[test]
fn test_check_writes_nothing() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.yml", "x: !include b\n");
    write(dir.path(), "b.yml", "1\n");

    yamlc_cmd(dir.path())
        .args(["check", "a.yml", "b.yml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Checked a.yml"))
        .stdout(predicate::str::contains("2 file(s) checked"));

    assert!(!dir.path().join("a.json").exists());
    assert!(!dir.path().join("b.json").exists());
}

#[test]
fn test_resolve_prints_json() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.yml", "z: 1\na: !include b\n");
    write(dir.path(), "b.yml", "- x\n- y\n");

    yamlc_cmd(dir.path())
        .args(["resolve", "a.yml", "--space", "0"])
        .assert()
        .success()
        .stdout("{\"z\":1,\"a\":[\"x\",\"y\"]}\n");

    assert!(!dir.path().join("a.json").exists());
}

// =============================================================================
// Configuration Tests
// =============================================================================

#[test]
fn test_project_config_applies() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "yamlc.toml", "space = 3\nout_dir = \"build\"\n");
    write(dir.path(), "a.yml", "a: 1\n");

    yamlc_cmd(dir.path())
        .args(["compile", "a.yml"])
        .assert()
        .success();

    let text = fs::read_to_string(dir.path().join("build/a.json")).unwrap();
    assert_eq!(text, "{\n   \"a\": 1\n}");
}

#[test]
fn test_flags_override_config() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "yamlc.toml", "space = 3\n");
    write(dir.path(), "a.yml", "a: 1\n");

    yamlc_cmd(dir.path())
        .args(["compile", "a.yml", "--space", "1"])
        .assert()
        .success();

    let text = fs::read_to_string(dir.path().join("a.json")).unwrap();
    assert_eq!(text, "{\n \"a\": 1\n}");
}

#[test]
fn test_explicit_config_file() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "conf/custom.toml", "strict_anchors = false\n");
    write(dir.path(), "a.yml", "x: !include c *nope\n");
    write(dir.path(), "c.yml", "y: 1\n");

    yamlc_cmd(dir.path())
        .args(["--config", "conf/custom.toml", "compile", "a.yml"])
        .assert()
        .success();

    assert_eq!(
        read_json(&dir.path().join("a.json")),
        serde_json::json!({"x": null})
    );
}

#[test]
fn test_invalid_config_fails() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "yamlc.toml", "ignored = \"(\"\n");
    write(dir.path(), "a.yml", "a: 1\n");

    yamlc_cmd(dir.path())
        .args(["compile", "a.yml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration"));
}

#[cfg(unix)]
#[test]
fn test_plugin_constructor_from_config() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let plugin = write(
        dir.path(),
        "tags/upper",
        "#!/bin/sh\nread line\necho '{\"success\":true,\"data\":\"UPPER\"}'\n",
    );
    fs::set_permissions(&plugin, fs::Permissions::from_mode(0o755)).unwrap();

    write(dir.path(), "yamlc.toml", "[constructors]\n\"!upper\" = \"./tags/upper\"\n");
    write(dir.path(), "a.yml", "x: !upper hello\n");

    yamlc_cmd(dir.path())
        .args(["compile", "a.yml"])
        .assert()
        .success();

    assert_eq!(
        read_json(&dir.path().join("a.json")),
        serde_json::json!({"x": "UPPER"})
    );
}

#[test]
fn test_unknown_tag_fails() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.yml", "x: !mystery 1\n");

    yamlc_cmd(dir.path())
        .args(["compile", "a.yml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown tag !mystery"));
}
