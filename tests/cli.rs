//! Integration tests for the mesonup binary
//!
//! These run the built binary against temporary source roots. Nothing here
//! touches the network: archive installs use an archive placed in the root
//! beforehand, the manual-recovery path a user would take offline.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output};
use zip::write::SimpleFileOptions;

const REV: &str = "deadbeef";

fn mesonup(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_mesonup"))
        .args(args)
        .arg("--root")
        .arg(root)
        .env("NO_COLOR", "1")
        .env_remove("MESONUP_ROOT")
        .env_remove("MESONUP_PYTHON")
        .output()
        .expect("Failed to execute mesonup")
}

/// Root with a single-entry `mesonup.toml` pointing at an unreachable host.
fn create_root() -> tempfile::TempDir {
    let root = tempfile::tempdir().expect("Failed to create temp root");
    let config = format!(
        r#"[[dependency]]
name = "X"
rev = "{REV}"
url = "https://invalid.invalid/X"
path = "externals/x"
"#
    );
    fs::write(root.path().join("mesonup.toml"), config).unwrap();
    root
}

fn place_archive(root: &Path) {
    let file = File::create(root.join(format!("{REV}.zip"))).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let opts = SimpleFileOptions::default().unix_permissions(0o755);
    zip.add_directory(format!("X-{REV}/"), opts).unwrap();
    zip.start_file(format!("X-{REV}/build.sh"), opts).unwrap();
    zip.write_all(b"#!/bin/sh\n").unwrap();
    zip.finish().unwrap();
}

#[test]
fn test_fetch_installs_from_local_archive() {
    let root = create_root();
    place_archive(root.path());

    let output = mesonup(root.path(), &["fetch", "--archives"]);
    assert!(
        output.status.success(),
        "fetch failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let local = root.path().join("externals/x");
    assert!(local.join("build.sh").is_file());
    assert!(local.join(REV).is_file());
    assert!(!root.path().join(format!("{REV}.zip")).exists());

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(local.join("build.sh")).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    // Marker present: second run must not need the (unreachable) network.
    let again = mesonup(root.path(), &["fetch", "--archives"]);
    assert!(again.status.success());
    assert!(!String::from_utf8_lossy(&again.stdout).contains("Downloading"));
}

#[test]
fn test_fetch_failure_prints_recovery_and_exits_nonzero() {
    let root = create_root();

    let output = mesonup(root.path(), &["fetch", "--archives"]);
    assert_eq!(output.status.code(), Some(2));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Download of module X failed"), "{stderr}");
    assert!(stderr.contains(&format!("https://invalid.invalid/X/archive/{REV}.zip")));
    assert!(!root.path().join("externals/x").join(REV).exists());
}

#[test]
fn test_status_json_reports_state() {
    let root = create_root();
    place_archive(root.path());
    assert!(mesonup(root.path(), &["fetch", "--archives"]).status.success());

    let output = mesonup(root.path(), &["status", "--json"]);
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let deps = report["dependencies"].as_array().unwrap();
    assert_eq!(deps.len(), 1);
    assert_eq!(deps[0]["name"], "X");
    assert_eq!(deps[0]["state"], "installed");
}

#[test]
fn test_clean_removes_archive_install() {
    let root = create_root();
    place_archive(root.path());
    assert!(mesonup(root.path(), &["fetch", "--archives"]).status.success());

    let output = mesonup(root.path(), &["clean"]);
    assert!(output.status.success());
    assert!(!root.path().join("externals/x").exists());
}

#[test]
fn test_invalid_config_is_rejected() {
    let root = tempfile::tempdir().unwrap();
    fs::write(root.path().join("mesonup.toml"), "[[dependency]]\nname = \"X\"\n").unwrap();

    let output = mesonup(root.path(), &["status"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid configuration"));
}
