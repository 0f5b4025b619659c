//! CLI Tests
//!
//! Drive the built `sitebuild-cli` binary over temporary site trees and check
//! exit codes and stdout.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::{tempdir, TempDir};

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// `cp` stands in for both minifiers; `css` overrides the stylesheet one
fn create_site(css: Value) -> TempDir {
    let dir = tempdir().unwrap();
    let root = dir.path();
    let config = serde_json::json!({
        "htmlFiles": ["index.html"],
        "cssMinifier": css,
        "jsMinifier": { "program": "cp", "args": ["{input}", "{output}"] },
    });
    write(root, "sitebuild.json", &config.to_string());
    write(root, "package.json", r#"{"name": "site", "version": "2.0.1"}"#);
    write(root, "css/style.css", "body { margin: 0; }");
    write(root, "js/main.js", "init();");
    write(root, "index.html", r#"<link href="css/style.css"><script src="js/main.js"></script>"#);
    dir
}

fn copying_site() -> TempDir {
    create_site(serde_json::json!({ "program": "cp", "args": ["{input}", "{output}"] }))
}

fn run(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sitebuild-cli"))
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .unwrap()
}

fn stdout_json(output: &Output) -> Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).unwrap_or_else(|e| panic!("stdout is not JSON ({e}):\n{stdout}"))
}

#[cfg(unix)]
#[test]
fn test_build_json_report() {
    let site = copying_site();
    let output = run(site.path(), &["--json"]);

    assert!(output.status.success(), "stderr:\n{}", String::from_utf8_lossy(&output.stderr));
    let report = stdout_json(&output);
    assert_eq!(report["buildInfo"]["version"], "2.0.1");
    assert_eq!(report["stages"][0]["stage"], "clean");
    assert_eq!(report["stages"].as_array().unwrap().len(), 7);

    let page = fs::read_to_string(site.path().join("dist/index.html")).unwrap();
    assert_eq!(page, r#"<link href="css/style.min.css"><script src="js/main.min.js"></script>"#);
    assert!(site.path().join("dist/build-info.json").is_file());
}

#[cfg(unix)]
#[test]
fn test_failing_minifier_still_exits_zero() {
    let site = create_site(serde_json::json!({ "program": "false", "args": ["{input}", "{output}"] }));
    let output = run(site.path(), &["--json"]);

    assert_eq!(output.status.code(), Some(0));
    let report = stdout_json(&output);
    let css = report["stages"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["stage"] == "minify_css")
        .unwrap();
    assert_eq!(css["outcomes"][0]["item"], "css/style.css");
    assert_eq!(css["outcomes"][0]["status"], "failed");

    assert!(!site.path().join("dist/css/style.min.css").exists());
    assert!(site.path().join("dist/js/main.min.js").is_file());
    assert!(site.path().join("dist/build-info.json").is_file());
}

#[cfg(unix)]
#[test]
fn test_console_build_prints_progress() {
    let site = copying_site();
    let output = run(site.path(), &["build", "--no-color"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Build completed successfully"), "stdout:\n{stdout}");
    assert!(!stdout.contains("\x1b["));
}

#[test]
fn test_out_dir_dot_exits_one_and_keeps_sources() {
    let site = copying_site();
    let output = run(site.path(), &["--json", "--out-dir", "."]);

    assert_eq!(output.status.code(), Some(1));
    let result = stdout_json(&output);
    assert_eq!(result["success"], false);
    assert!(result["error"].as_str().unwrap().starts_with("Invalid configuration"));

    assert!(site.path().join("package.json").is_file());
    assert!(site.path().join("index.html").is_file());
}

#[test]
fn test_out_dir_parent_of_source_exits_one() {
    let site = copying_site();
    let output = run(site.path(), &["--out-dir", "dist/.."]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Build failed"));
    assert!(site.path().join("css/style.css").is_file());
}

#[cfg(unix)]
#[test]
fn test_missing_package_metadata_exits_one() {
    let site = copying_site();
    fs::remove_file(site.path().join("package.json")).unwrap();

    let output = run(site.path(), &["--json"]);

    assert_eq!(output.status.code(), Some(1));
    let result = stdout_json(&output);
    assert_eq!(result["success"], false);
    assert!(result["error"].as_str().unwrap().contains("package.json"));
}

#[cfg(unix)]
#[test]
fn test_out_dir_override_used_for_build() {
    let site = copying_site();
    let output = run(site.path(), &["--out-dir", "public", "--json"]);

    assert!(output.status.success());
    assert!(site.path().join("public/build-info.json").is_file());
    assert!(site.path().join("public/css/style.min.css").is_file());
    assert!(!site.path().join("dist").exists());
}

#[test]
fn test_config_command_prints_effective_config() {
    let site = copying_site();
    let output = run(site.path(), &["config", "--out-dir", "public"]);

    assert!(output.status.success());
    let config = stdout_json(&output);
    assert_eq!(config["outDir"], "public");
    assert_eq!(config["htmlFiles"], serde_json::json!(["index.html"]));
    assert_eq!(config["jsMinifier"]["program"], "cp");
    assert_eq!(config["cssFiles"], serde_json::json!(["css/style.css", "css/responsive.css"]));
    assert!(!site.path().join("dist").exists());
}

#[test]
fn test_bad_config_file_exits_one() {
    let site = copying_site();
    write(site.path(), "broken.json", "{ not json");

    let output = run(site.path(), &["--config", "broken.json"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid config file"));
}
