//! Revision table and `mesonup.toml` parsing.
//!
//! The table of externals is built once at start-up and never mutated. Without
//! a `mesonup.toml` in the source root the built-in pins below are used.

use crate::error::BootstrapError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "mesonup.toml";

/// Directory (relative to the root) that archives are unpacked into.
pub const EXTERNALS_DIR: &str = "externals";

/// One pinned external source tree.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Dependency {
    /// Repository name, also the prefix of the archive's top directory.
    pub name: String,
    /// Commit hash the tree is pinned to.
    pub rev: String,
    pub url: String,
    /// Install location relative to the source root.
    pub path: String,
}

impl Dependency {
    fn new(name: &str, rev: &str, url: &str, path: &str) -> Self {
        Self {
            name: name.to_string(),
            rev: rev.to_string(),
            url: url.to_string(),
            path: path.to_string(),
        }
    }

    pub fn local_path(&self, root: &Path) -> PathBuf {
        root.join(&self.path)
    }
}

/// The pins that ship with the tool. Must be kept in sync with the
/// submodule commits recorded in the index.
pub fn default_dependencies() -> Vec<Dependency> {
    vec![
        Dependency::new(
            "CoDiPack",
            "501dcf0305df147481630f20ce37c2e624fb351f",
            "https://github.com/scicompkl/CoDiPack",
            "externals/codi",
        ),
        Dependency::new(
            "MeDiPack",
            "a95a23ce7585905c3a731b28c1bb512028fc02bb",
            "https://github.com/SciCompKL/MeDiPack",
            "externals/medi",
        ),
        Dependency::new(
            "meson",
            "c904d3eefe2a01ca60027e2a5192e1f1c7ca5d9d",
            "https://github.com/mesonbuild/meson",
            "externals/meson",
        ),
        Dependency::new(
            "ninja",
            "e0bc2e5fd9036a31d507881e1383adde3672aaef",
            "https://github.com/ninja-build/ninja",
            "externals/ninja",
        ),
    ]
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    python: Option<String>,
    #[serde(default, rename = "dependency")]
    dependencies: Option<Vec<Dependency>>,
}

/// Resolved, immutable run configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub root: PathBuf,
    pub python: String,
    pub dependencies: Vec<Dependency>,
}

impl Config {
    /// Load `mesonup.toml` from `root` if present, falling back to built-in
    /// pins. `python_override` comes from the command line or environment.
    pub fn load(root: &Path, python_override: Option<String>) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        let file = if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            toml::from_str::<ConfigFile>(&content).map_err(|e| BootstrapError::Config {
                path: path.clone(),
                reason: e.to_string(),
            })?
        } else {
            ConfigFile::default()
        };

        let dependencies = file.dependencies.unwrap_or_else(default_dependencies);
        validate(&dependencies).map_err(|reason| BootstrapError::Config {
            path: path.clone(),
            reason,
        })?;

        let python = python_override
            .or(file.python)
            .unwrap_or_else(|| default_python().to_string());

        tracing::debug!(
            root = %root.display(),
            python = %python,
            count = dependencies.len(),
            "configuration loaded"
        );

        Ok(Self {
            root: root.to_path_buf(),
            python,
            dependencies,
        })
    }

    pub fn externals_dir(&self) -> PathBuf {
        self.root.join(EXTERNALS_DIR)
    }

    /// Location of the copied ninja binary in the root.
    pub fn helper_path(&self) -> PathBuf {
        self.root.join(helper_file_name())
    }

    pub fn dependency(&self, name: &str) -> Option<&Dependency> {
        self.dependencies.iter().find(|d| d.name == name)
    }
}

fn validate(deps: &[Dependency]) -> std::result::Result<(), String> {
    let mut names = HashSet::new();
    let mut paths = HashSet::new();
    for dep in deps {
        if dep.name.is_empty() || dep.rev.is_empty() || dep.url.is_empty() || dep.path.is_empty() {
            return Err(format!("dependency '{}' has an empty field", dep.name));
        }
        if Path::new(&dep.path).is_absolute() {
            return Err(format!(
                "path '{}' of '{}' must be relative to the source root",
                dep.path, dep.name
            ));
        }
        if !names.insert(dep.name.as_str()) {
            return Err(format!("dependency '{}' is declared twice", dep.name));
        }
        let normalized = dep.path.trim_end_matches('/');
        if !paths.insert(normalized) {
            return Err(format!("path '{}' is used by more than one dependency", dep.path));
        }
    }
    Ok(())
}

pub fn default_python() -> &'static str {
    if cfg!(windows) { "python" } else { "python3" }
}

pub fn helper_file_name() -> &'static str {
    if cfg!(windows) { "ninja.exe" } else { "ninja" }
}
