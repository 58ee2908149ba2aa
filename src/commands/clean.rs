//! Clean command handler
//!
//! Handles `mesonup clean`. Submodule checkouts are left alone unless `--all`
//! is given.

use crate::config::Config;
use crate::deps;
use anyhow::{Context, Result};
use colored::*;
use std::fs;
use std::path::PathBuf;

/// Everything a clean pass would delete.
pub fn plan_clean(config: &Config, all: bool) -> Vec<PathBuf> {
    let mut targets = Vec::new();
    for dep in &config.dependencies {
        let local = dep.local_path(&config.root);
        if local.exists() && (all || deps::is_installed(dep, &config.root)) {
            targets.push(local);
        }
        let archive = config.root.join(deps::archive_file_name(&dep.rev));
        for leftover in [archive.with_extension("zip.part"), archive] {
            if leftover.exists() {
                targets.push(leftover);
            }
        }
        let unpacked = config
            .externals_dir()
            .join(format!("{}-{}", dep.name, dep.rev));
        if unpacked.exists() {
            targets.push(unpacked);
        }
    }
    let helper = config.helper_path();
    if helper.is_file() {
        targets.push(helper);
    }
    targets
}

/// Handle `mesonup clean`.
pub fn handle_clean(config: &Config, all: bool) -> Result<()> {
    let targets = plan_clean(config, all);
    if targets.is_empty() {
        println!("{} Nothing to clean.", "✓".green());
        return Ok(());
    }

    println!("{} Cleaning...", "🧹".yellow());
    for path in &targets {
        println!("   {} Removing {}", "🗑️".red(), path.display());
        let removed = if path.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        };
        removed.with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    println!("{} Removed {} items.", "✓".green(), targets.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_dependencies;
    use std::path::Path;

    fn config(root: &Path) -> Config {
        Config {
            root: root.to_path_buf(),
            python: "python3".into(),
            dependencies: default_dependencies(),
        }
    }

    #[test]
    fn test_clean_keeps_submodule_checkouts() {
        let root = tempfile::tempdir().unwrap();
        let cfg = config(root.path());
        let codi = &cfg.dependencies[0];
        let meson = &cfg.dependencies[2];

        // codi: archive install; meson: submodule checkout.
        fs::create_dir_all(codi.local_path(root.path())).unwrap();
        fs::write(deps::marker_path(codi, root.path()), "").unwrap();
        fs::create_dir_all(meson.local_path(root.path())).unwrap();
        fs::write(meson.local_path(root.path()).join("meson.py"), "").unwrap();
        fs::write(root.path().join(format!("{}.zip.part", codi.rev)), "").unwrap();
        fs::write(cfg.helper_path(), "").unwrap();

        handle_clean(&cfg, false).unwrap();

        assert!(!codi.local_path(root.path()).exists());
        assert!(meson.local_path(root.path()).join("meson.py").exists());
        assert!(!root.path().join(format!("{}.zip.part", codi.rev)).exists());
        assert!(!cfg.helper_path().exists());
    }

    #[test]
    fn test_clean_all_removes_checkouts() {
        let root = tempfile::tempdir().unwrap();
        let cfg = config(root.path());
        let meson = &cfg.dependencies[2];
        fs::create_dir_all(meson.local_path(root.path())).unwrap();

        assert_eq!(plan_clean(&cfg, false), Vec::<PathBuf>::new());
        assert_eq!(plan_clean(&cfg, true), vec![meson.local_path(root.path())]);

        handle_clean(&cfg, true).unwrap();
        assert!(!meson.local_path(root.path()).exists());
    }
}
