//! Batch resolution of every declared external.

use super::archive::{ArchiveFetcher, FetchOutcome};
use super::download::Download;
use crate::config::Config;
use crate::vcs::{self, Git, SubmoduleOutcome};
use anyhow::Result;
use colored::*;
use serde::Serialize;
use std::fmt;

/// How the whole batch is materialised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Submodules,
    Archives,
}

impl Mode {
    /// Submodules inside a git work tree, archives everywhere else.
    pub fn detect(git: &impl Git, config: &Config, force_archives: bool) -> Self {
        if !force_archives && vcs::is_version_controlled(git, &config.root) {
            Mode::Submodules
        } else {
            Mode::Archives
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Submodules => write!(f, "git submodules"),
            Mode::Archives => write!(f, "archive download"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved {
    Submodule(SubmoduleOutcome),
    Archive(FetchOutcome),
}

/// Bring every dependency to its pinned revision. Stops at the first failure.
pub fn resolve_all<G: Git, D: Download>(
    config: &Config,
    mode: Mode,
    git: &G,
    fetcher: &ArchiveFetcher<D>,
) -> Result<Vec<Resolved>> {
    if !config.dependencies.is_empty() {
        println!(
            "{} Checking {} externals ({})...",
            "📦".blue(),
            config.dependencies.len(),
            mode
        );
    }

    let mut resolved = Vec::with_capacity(config.dependencies.len());
    for dep in &config.dependencies {
        let outcome = match mode {
            Mode::Submodules => Resolved::Submodule(vcs::ensure_submodule(git, &dep.path, &dep.rev)?),
            Mode::Archives => Resolved::Archive(fetcher.fetch(dep)?),
        };
        tracing::debug!(name = %dep.name, ?outcome, "resolved");
        resolved.push(outcome);
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Dependency;
    use crate::deps::archive::tests::FakeDownloader;
    use crate::error::BootstrapError;
    use crate::vcs::tests::FakeGit;
    use std::path::Path;

    fn config(root: &Path, deps: Vec<Dependency>) -> Config {
        Config {
            root: root.to_path_buf(),
            python: "python3".into(),
            dependencies: deps,
        }
    }

    fn dep(name: &str, rev: &str) -> Dependency {
        Dependency {
            name: name.into(),
            rev: rev.into(),
            url: format!("https://example.com/{name}"),
            path: format!("externals/{}", name.to_lowercase()),
        }
    }

    #[test]
    fn test_mode_follows_work_tree_detection() {
        let root = tempfile::tempdir().unwrap();
        let cfg = config(root.path(), vec![]);
        assert_eq!(Mode::detect(&FakeGit::new(true, ""), &cfg, false), Mode::Submodules);
        assert_eq!(Mode::detect(&FakeGit::new(false, ""), &cfg, false), Mode::Archives);
        assert_eq!(Mode::detect(&FakeGit::new(true, ""), &cfg, true), Mode::Archives);
    }

    #[test]
    fn test_archive_mode_never_touches_git() {
        let root = tempfile::tempdir().unwrap();
        let cfg = config(root.path(), vec![dep("X", "deadbeef")]);
        let git = FakeGit::new(false, "-deadbeef {path}");
        let fetcher = ArchiveFetcher::new(root.path(), FakeDownloader::serving("X", "deadbeef"));

        let out = resolve_all(&cfg, Mode::Archives, &git, &fetcher).unwrap();
        assert_eq!(out, vec![Resolved::Archive(FetchOutcome::Installed)]);
        assert!(git.calls.borrow().is_empty());

        let local = root.path().join("externals/x");
        assert!(local.read_dir().unwrap().next().is_some());
    }

    #[test]
    fn test_submodule_mode_visits_every_dependency() {
        let root = tempfile::tempdir().unwrap();
        let cfg = config(root.path(), vec![dep("A", "abc"), dep("B", "abc")]);
        let git = FakeGit::new(true, "-abc {path}");
        let fetcher = ArchiveFetcher::new(root.path(), FakeDownloader::serving("A", "abc"));

        let out = resolve_all(&cfg, Mode::Submodules, &git, &fetcher).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(git.mutating_calls(), 2);
        assert_eq!(fetcher_calls(&fetcher), 0);
    }

    #[test]
    fn test_first_failure_aborts_batch() {
        let root = tempfile::tempdir().unwrap();
        let cfg = config(root.path(), vec![dep("A", "stale"), dep("B", "abc")]);
        let git = FakeGit::new(true, "-abc {path}");
        let fetcher = ArchiveFetcher::new(root.path(), FakeDownloader::serving("A", "abc"));

        let err = resolve_all(&cfg, Mode::Submodules, &git, &fetcher).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BootstrapError>(),
            Some(BootstrapError::PinMismatch { .. })
        ));
        // B was never looked at.
        assert!(!git.calls.borrow().iter().any(|c| c.ends_with("externals/b")));
    }

    fn fetcher_calls(fetcher: &ArchiveFetcher<FakeDownloader>) -> usize {
        fetcher.downloader().calls.get()
    }
}
