//! The ninja binary meson drives.
//!
//! `<root>/ninja` is used when it runs. Otherwise ninja is bootstrapped from
//! the fetched source in `externals/ninja` and the result copied to the root.

use crate::config::{Config, helper_file_name};
use crate::error::BootstrapError;
use anyhow::{Context, Result};
use colored::*;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

const NINJA_SOURCE: &str = "externals/ninja";

/// Outcome of running `<tool> --version`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    Found(String),
    /// Missing or not executable.
    NotFound,
    /// Ran but exited unsuccessfully.
    Failed(String),
}

pub fn probe(tool: &Path) -> Result<Probe> {
    match Command::new(tool).arg("--version").output() {
        Ok(output) if output.status.success() => Ok(Probe::Found(
            String::from_utf8_lossy(&output.stdout).trim().to_string(),
        )),
        Ok(output) => Ok(Probe::Failed(output.status.to_string())),
        Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::PermissionDenied) => {
            Ok(Probe::NotFound)
        }
        Err(e) => Err(e).with_context(|| format!("Failed to run {}", tool.display())),
    }
}

/// Make sure `<root>/ninja` exists, building it when it does not run.
pub fn ensure_helper_tool(config: &Config) -> Result<PathBuf> {
    let target = config.helper_path();
    match probe(&target)? {
        Probe::Found(version) => {
            tracing::debug!(%version, "ninja present");
            Ok(target)
        }
        Probe::Failed(status) => {
            tracing::warn!("{} --version exited with {}", target.display(), status);
            Ok(target)
        }
        Probe::NotFound => {
            println!("{} ninja executable not found. Building ...", "🔨".yellow());
            let source = ninja_source_dir(config);
            bootstrap(&source)?;
            install(&source.join(helper_file_name()), &target)?;
            println!("{} ninja built at {}", "✓".green(), target.display());
            Ok(target)
        }
    }
}

fn ninja_source_dir(config: &Config) -> PathBuf {
    config
        .dependency("ninja")
        .map(|dep| dep.local_path(&config.root))
        .unwrap_or_else(|| config.root.join(NINJA_SOURCE))
}

/// Run ninja's own `configure.py --bootstrap`.
fn bootstrap(source: &Path) -> Result<()> {
    let status = Command::new(source.join("configure.py"))
        .arg("--bootstrap")
        .current_dir(source)
        .status()
        .with_context(|| format!("Failed to run configure.py in {}", source.display()))?;
    if !status.success() {
        return Err(BootstrapError::HelperBuild {
            dir: source.to_path_buf(),
            status: status.to_string(),
        }
        .into());
    }
    Ok(())
}

fn install(built: &Path, target: &Path) -> Result<()> {
    fs::copy(built, target).with_context(|| {
        format!(
            "Failed to copy {} to {}",
            built.display(),
            target.display()
        )
    })?;
    Ok(())
}
