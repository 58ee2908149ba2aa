//! Classified bootstrap failures.
//!
//! Plumbing errors travel as `anyhow::Error`; anything that decides the exit
//! code or needs a remediation hint is a [`BootstrapError`].

use std::path::PathBuf;
use thiserror::Error;

/// Exit code for a pinned revision that disagrees with the git index.
pub const EXIT_PIN_MISMATCH: u8 = 1;

/// Exit code for every other bootstrap failure.
pub const EXIT_BOOTSTRAP: u8 = 2;

#[derive(Debug, Error)]
pub enum BootstrapError {
    /// The index records a different commit than the revision table.
    #[error(
        "SHA-1 tag stored in the index for {path} ({found}) does not match the pinned revision {pinned}"
    )]
    PinMismatch {
        path: String,
        pinned: String,
        found: String,
    },

    #[error("unexpected output from 'git submodule status {path}': {line:?}")]
    UnexpectedStatus { path: String, line: String },

    #[error("'git {args}' failed ({status}): {stderr}")]
    Git {
        args: String,
        status: String,
        stderr: String,
    },

    #[error(
        "Download of module {name} failed: {reason}\n\
         Get archive at {url}\n\
         and place it in {}\n\
         Run mesonup again",
        .root.display()
    )]
    Download {
        name: String,
        url: String,
        root: PathBuf,
        reason: String,
    },

    #[error("archive {} does not contain the expected directory '{expected}'", .archive.display())]
    ArchiveLayout { archive: PathBuf, expected: String },

    #[error(
        "{} exists and is not empty but carries no marker for {rev}; remove it or run 'mesonup clean --all'",
        .path.display()
    )]
    Occupied { path: PathBuf, rev: String },

    #[error("ninja bootstrap in {} failed ({status})", .dir.display())]
    HelperBuild { dir: PathBuf, status: String },

    #[error("Python interpreter '{program}' not found; install Python 3 or pass --python")]
    InterpreterMissing { program: String },

    #[error("'{program}' reports Python {found}; mesonup requires Python {required}")]
    UnsupportedInterpreter {
        program: String,
        found: String,
        required: String,
    },

    #[error("invalid configuration in {}: {reason}", .path.display())]
    Config { path: PathBuf, reason: String },
}

impl BootstrapError {
    pub fn exit_code(&self) -> u8 {
        match self {
            BootstrapError::PinMismatch { .. } => EXIT_PIN_MISMATCH,
            _ => EXIT_BOOTSTRAP,
        }
    }
}

/// Exit code for an arbitrary error bubbled up to `main`.
pub fn exit_code_for(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<BootstrapError>()
        .map(BootstrapError::exit_code)
        .unwrap_or(EXIT_BOOTSTRAP)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_mismatch_exits_with_one() {
        let err = BootstrapError::PinMismatch {
            path: "externals/codi".into(),
            pinned: "aaa".into(),
            found: "bbb".into(),
        };
        assert_eq!(err.exit_code(), 1);
        assert_eq!(exit_code_for(&anyhow::Error::new(err)), 1);
    }

    #[test]
    fn test_download_message_carries_recovery_steps() {
        let err = BootstrapError::Download {
            name: "ninja".into(),
            url: "https://example.com/ninja/archive/abc.zip".into(),
            root: PathBuf::from("/src/su2"),
            reason: "connection refused".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Download of module ninja failed"));
        assert!(msg.contains("Get archive at https://example.com/ninja/archive/abc.zip"));
        assert!(msg.contains("/src/su2"));
        assert_eq!(err.exit_code(), EXIT_BOOTSTRAP);
    }

    #[test]
    fn test_plain_anyhow_error_uses_bootstrap_code() {
        let err = anyhow::anyhow!("disk full");
        assert_eq!(exit_code_for(&err), EXIT_BOOTSTRAP);
    }
}
