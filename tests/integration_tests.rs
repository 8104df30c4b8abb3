// tests/integration_tests.rs

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

fn binary() -> Command {
    Command::new(env!("CARGO_BIN_EXE_airport-ops"))
}

fn temp_config(name: &str, content: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push(format!("airport-ops-it-{}-{}", std::process::id(), name));
    fs::create_dir_all(&dir).expect("Failed to create temp dir");
    dir.push("airport-ops.toml");
    fs::write(&dir, content).expect("Failed to write test config");
    dir
}

fn cleanup(path: &Path) {
    let _ = fs::remove_file(path);
    if let Some(parent) = path.parent() {
        let _ = fs::remove_dir(parent);
    }
}

#[test]
fn test_config_file_parsing() {
    let config_path = temp_config(
        "valid",
        r#"
airport = "EGNM"
operator_prefix = "LS"
operator_name = "Jet2"
refresh_secs = 60
timeout_secs = 10
checkwx_api_key = ""
aerodatabox_api_key = ""
allow_http = false
log_enabled = false
"#,
    );

    let output = binary()
        .arg("--config")
        .arg(&config_path)
        .arg("--help")
        .output()
        .expect("binary runs");
    cleanup(&config_path);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn test_malformed_config_is_rejected() {
    let config_path = temp_config("malformed", "refresh_secs = \"soon\"\n");
    let output = binary()
        .arg("--config")
        .arg(&config_path)
        .arg("--help")
        .output()
        .expect("binary runs");
    cleanup(&config_path);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to parse config"), "stderr: {}", stderr);
}

#[test]
fn test_insecure_endpoint_from_config_is_rejected() {
    let config_path = temp_config(
        "insecure",
        "opensky_url = \"http://127.0.0.1:9/api/states/all\"\nlog_enabled = false\n",
    );
    let output = binary()
        .arg("--config")
        .arg(&config_path)
        .args(["--once", "--no-log"])
        .output()
        .expect("binary runs");
    cleanup(&config_path);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Refusing insecure http URL"), "stderr: {}", stderr);
}

#[test]
fn test_help_lists_flags() {
    let output = binary().arg("--help").output().expect("binary runs");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for flag in ["--airport", "--prefix", "--operator", "--once", "--format"] {
        assert!(stdout.contains(flag), "help missing {}", flag);
    }
}

#[test]
fn test_missing_explicit_config_fails() {
    let output = binary()
        .args(["--config", "definitely-not-here.toml", "--once", "--no-log"])
        .output()
        .expect("binary runs");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Config file not found"), "stderr: {}", stderr);
}

#[test]
fn test_unknown_flag_fails() {
    let output = binary()
        .args(["--bogus", "--no-log"])
        .output()
        .expect("binary runs");
    assert!(!output.status.success());
}

#[test]
fn test_project_structure() {
    let expected_files = vec![
        "src/main.rs",
        "src/app.rs",
        "src/ui.rs",
        "src/config.rs",
        "src/model.rs",
        "src/net.rs",
        "src/normalize.rs",
        "src/clock.rs",
        "src/status.rs",
        "src/fids.rs",
        "src/squawk.rs",
        "src/weather.rs",
        "src/board.rs",
        "Cargo.toml",
        "README.md",
    ];

    for file in expected_files {
        assert!(Path::new(file).exists(), "Expected file {} not found", file);
    }
}

#[test]
fn test_cargo_toml_metadata() {
    let cargo_content = fs::read_to_string("Cargo.toml").expect("Failed to read Cargo.toml");

    assert!(cargo_content.contains("name = \"airport-ops\""), "Missing package name");
    assert!(cargo_content.contains("description ="), "Missing description");
    assert!(cargo_content.contains("license ="), "Missing license");
    assert!(cargo_content.contains("readme ="), "Missing readme");
    assert!(cargo_content.contains("homepage ="), "Missing homepage");
    assert!(cargo_content.contains("repository ="), "Missing repository");
}

#[test]
fn test_readme_exists_and_complete() {
    let readme_content = fs::read_to_string("README.md").expect("Failed to read README.md");

    let required_sections = vec![
        "# Airport Ops",
        "## Features",
        "## Quick Start",
        "## Configuration",
        "## Controls",
        "## Development",
    ];

    for section in required_sections {
        assert!(readme_content.contains(section), "README missing section: {}", section);
    }
}
