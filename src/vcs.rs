//! Git work-tree detection and submodule pinning.
//!
//! All git access goes through the [`Git`] trait. [`SystemGit`] shells out to
//! the `git` binary with the source root as working directory.

use crate::error::BootstrapError;
use anyhow::{Context, Result};
use colored::*;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// The git operations the bootstrap needs.
pub trait Git {
    /// Whether `git -C <dir> status` succeeds.
    fn status_ok(&self, dir: &Path) -> bool;

    /// Raw stdout of `git submodule status <path>`.
    fn submodule_status(&self, path: &str) -> Result<String>;

    /// Run `git submodule update --init <path>`.
    fn submodule_update(&self, path: &str) -> Result<()>;
}

/// Shells out to the `git` on `PATH`.
pub struct SystemGit {
    root: PathBuf,
}

impl SystemGit {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    fn fail(args: &[&str], status: std::process::ExitStatus, stderr: &[u8]) -> anyhow::Error {
        BootstrapError::Git {
            args: args.join(" "),
            status: status.to_string(),
            stderr: String::from_utf8_lossy(stderr).trim().to_string(),
        }
        .into()
    }
}

impl Git for SystemGit {
    fn status_ok(&self, dir: &Path) -> bool {
        let result = Command::new("git")
            .arg("-C")
            .arg(dir)
            .arg("status")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        match result {
            Ok(status) => status.success(),
            Err(e) => {
                tracing::debug!("git not runnable: {e}");
                false
            }
        }
    }

    fn submodule_status(&self, path: &str) -> Result<String> {
        let args = ["submodule", "status", path];
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .output()
            .context("failed to execute git")?;
        if !output.status.success() {
            return Err(Self::fail(&args, output.status, &output.stderr));
        }
        String::from_utf8(output.stdout).context("git output was not valid UTF-8")
    }

    fn submodule_update(&self, path: &str) -> Result<()> {
        let args = ["submodule", "update", "--init", path];
        // Inherit stdio so clone progress reaches the user.
        let status = Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .status()
            .context("failed to execute git")?;
        if !status.success() {
            return Err(Self::fail(&args, status, b""));
        }
        Ok(())
    }
}

/// Whether `path` lies inside a git work tree. Never fails.
pub fn is_version_controlled(git: &impl Git, path: &Path) -> bool {
    let controlled = git.status_ok(path);
    tracing::debug!(path = %path.display(), controlled, "version control probe");
    controlled
}

/// First column of `git submodule status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    /// `-`
    Uninitialized,
    /// `+`
    Mismatched,
    /// ` `
    Clean,
}

/// One decoded `git submodule status` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmoduleStatus {
    pub indicator: Indicator,
    pub revision: String,
    pub path: String,
}

impl SubmoduleStatus {
    /// Decode `<indicator><sha> <path>[ (<describe>)]`. Only the first line
    /// is looked at.
    pub fn parse(output: &str) -> Option<Self> {
        let line = output.lines().next()?;
        let mut chars = line.chars();
        let indicator = match chars.next()? {
            '-' => Indicator::Uninitialized,
            '+' => Indicator::Mismatched,
            ' ' => Indicator::Clean,
            _ => return None,
        };
        let mut fields = chars.as_str().split(' ');
        let revision = fields.next().filter(|r| !r.is_empty())?.to_string();
        let path = fields.next().unwrap_or_default().to_string();
        Some(Self {
            indicator,
            revision,
            path,
        })
    }
}

/// What [`ensure_submodule`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmoduleOutcome {
    Clean,
    /// Checked out commit differs from the index; only warned about.
    Warned,
    Initialized,
}

/// Check one submodule and initialise it if needed.
///
/// A freshly initialised submodule must sit at `pinned_revision`, otherwise
/// the revision table is stale and [`BootstrapError::PinMismatch`] is returned.
pub fn ensure_submodule(
    git: &impl Git,
    path: &str,
    pinned_revision: &str,
) -> Result<SubmoduleOutcome> {
    let raw = git.submodule_status(path)?;
    let status = SubmoduleStatus::parse(&raw).ok_or_else(|| BootstrapError::UnexpectedStatus {
        path: path.to_string(),
        line: raw.lines().next().unwrap_or_default().to_string(),
    })?;
    tracing::debug!(path, indicator = ?status.indicator, revision = %status.revision, "submodule status");

    match status.indicator {
        Indicator::Clean => Ok(SubmoduleOutcome::Clean),
        Indicator::Mismatched => {
            eprintln!(
                "{} the currently checked out submodule commit in {} does not match the SHA-1 found in the index.",
                "WARNING:".yellow(),
                path
            );
            eprintln!(
                "Use '{}' to reset the module if necessary.",
                format!("git submodule update --init {}", path).cyan()
            );
            Ok(SubmoduleOutcome::Warned)
        }
        Indicator::Uninitialized => {
            println!("{} Initialize submodule {} using git ...", "📦".blue(), path);
            git.submodule_update(path)?;

            if status.revision != pinned_revision {
                return Err(BootstrapError::PinMismatch {
                    path: path.to_string(),
                    pinned: pinned_revision.to_string(),
                    found: status.revision,
                }
                .into());
            }
            Ok(SubmoduleOutcome::Initialized)
        }
    }
}
