//! Bootstrap command handlers
//!
//! Handles `mesonup fetch` and the default path that ends in meson.

use crate::config::Config;
use crate::deps::{self, ArchiveFetcher, HttpDownloader, Mode, Resolved};
use crate::helper;
use crate::launch::{self, MesonLaunch};
use crate::vcs::SystemGit;
use anyhow::Result;
use colored::*;

/// Resolve every external for `config`.
pub fn fetch(config: &Config, force_archives: bool) -> Result<Vec<Resolved>> {
    let git = SystemGit::new(&config.root);
    let mode = Mode::detect(&git, config, force_archives);
    let fetcher = ArchiveFetcher::new(&config.root, HttpDownloader);
    deps::resolve_all(config, mode, &git, &fetcher)
}

/// Handle `mesonup fetch`.
pub fn handle_fetch(config: &Config, force_archives: bool) -> Result<()> {
    let resolved = fetch(config, force_archives)?;
    println!("{} {} externals ready.", "✓".green(), resolved.len());
    Ok(())
}

/// Prepare everything and hand over to meson. Returns meson's exit code on
/// platforms where the process cannot be replaced.
pub fn handle_run(config: &Config, meson_args: &[String], force_archives: bool) -> Result<i32> {
    launch::check_interpreter(&config.python)?;
    fetch(config, force_archives)?;
    let ninja = helper::ensure_helper_tool(config)?;
    MesonLaunch::plan(config, &ninja, meson_args)?.exec()
}
