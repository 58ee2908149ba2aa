//! Status command handler
//!
//! Handles `mesonup status`, a read-only report on every external.

use crate::config::{Config, Dependency};
use crate::deps::{self, Mode};
use crate::ui;
use crate::vcs::SystemGit;
use anyhow::Result;
use colored::*;
use serde::Serialize;
use std::path::Path;
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyState {
    /// Archive install with its marker.
    Installed,
    /// Non-empty tree without a marker, e.g. a submodule checkout.
    Present,
    Missing,
}

#[derive(Debug, Serialize)]
pub struct DependencyReport {
    pub name: String,
    pub rev: String,
    pub path: String,
    pub state: DependencyState,
    pub files: usize,
}

pub fn inspect(dep: &Dependency, root: &Path) -> DependencyReport {
    let local = dep.local_path(root);
    let files = if local.is_dir() {
        WalkDir::new(&local)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .count()
    } else {
        0
    };

    let state = if deps::is_installed(dep, root) {
        DependencyState::Installed
    } else if files > 0 {
        DependencyState::Present
    } else {
        DependencyState::Missing
    };

    DependencyReport {
        name: dep.name.clone(),
        rev: dep.rev.clone(),
        path: dep.path.clone(),
        state,
        files,
    }
}

#[derive(Serialize)]
struct StatusReport {
    root: String,
    mode: Mode,
    dependencies: Vec<DependencyReport>,
}

/// Handle `mesonup status`.
pub fn handle_status(config: &Config, json: bool) -> Result<()> {
    let mode = Mode::detect(&SystemGit::new(&config.root), config, false);
    let reports: Vec<DependencyReport> = config
        .dependencies
        .iter()
        .map(|dep| inspect(dep, &config.root))
        .collect();

    if json {
        let report = StatusReport {
            root: config.root.display().to_string(),
            mode,
            dependencies: reports,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{} {}", "Root:".bold(), config.root.display());
    println!("{} {}", "Mode:".bold(), mode);

    let mut table = ui::Table::new(&["Name", "Revision", "Path", "State", "Files"]);
    for r in &reports {
        let state = match r.state {
            DependencyState::Installed => "installed".green().to_string(),
            DependencyState::Present => "present".cyan().to_string(),
            DependencyState::Missing => "missing".red().to_string(),
        };
        table.add_row(vec![
            r.name.clone(),
            short_rev(&r.rev).to_string(),
            r.path.clone(),
            state,
            r.files.to_string(),
        ]);
    }
    table.print();
    Ok(())
}

fn short_rev(rev: &str) -> &str {
    rev.get(..10).unwrap_or(rev)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn dep() -> Dependency {
        Dependency {
            name: "CoDiPack".into(),
            rev: "501dcf0305df147481630f20ce37c2e624fb351f".into(),
            url: "https://github.com/scicompkl/CoDiPack".into(),
            path: "externals/codi".into(),
        }
    }

    #[test]
    fn test_missing_and_empty_are_missing() {
        let root = tempfile::tempdir().unwrap();
        assert_eq!(inspect(&dep(), root.path()).state, DependencyState::Missing);
        fs::create_dir_all(root.path().join("externals/codi")).unwrap();
        assert_eq!(inspect(&dep(), root.path()).state, DependencyState::Missing);
    }

    #[test]
    fn test_checkout_without_marker_is_present() {
        let root = tempfile::tempdir().unwrap();
        let local = root.path().join("externals/codi/include");
        fs::create_dir_all(&local).unwrap();
        fs::write(local.join("codi.hpp"), "").unwrap();
        let report = inspect(&dep(), root.path());
        assert_eq!(report.state, DependencyState::Present);
        assert_eq!(report.files, 1);
    }

    #[test]
    fn test_marker_means_installed() {
        let root = tempfile::tempdir().unwrap();
        let d = dep();
        fs::create_dir_all(d.local_path(root.path())).unwrap();
        fs::write(deps::marker_path(&d, root.path()), "").unwrap();
        assert_eq!(inspect(&d, root.path()).state, DependencyState::Installed);
    }

    #[test]
    fn test_short_rev() {
        assert_eq!(short_rev("501dcf0305df147481630f20ce37c2e624fb351f"), "501dcf0305");
        assert_eq!(short_rev("abc"), "abc");
    }
}
