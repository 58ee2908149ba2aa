//! Interpreter check and hand-off to meson.

use crate::config::Config;
use crate::error::BootstrapError;
use anyhow::{Context, Result};
use regex::Regex;
use semver::{Version, VersionReq};
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Interpreter family meson is run with.
pub const REQUIRED_PYTHON: &str = ">=3, <4";

/// Extract `X.Y.Z` from `Python X.Y.Z[suffix]`.
pub fn parse_python_version(output: &str) -> Option<Version> {
    let re = Regex::new(r"Python\s+(\d+)\.(\d+)(?:\.(\d+))?").ok()?;
    let caps = re.captures(output)?;
    let part = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u64>().ok());
    Some(Version::new(part(1)?, part(2)?, part(3).unwrap_or(0)))
}

/// Fail unless `program --version` reports a 3.x interpreter.
pub fn check_interpreter(program: &str) -> Result<Version> {
    let output = match Command::new(program).arg("--version").output() {
        Ok(output) => output,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(BootstrapError::InterpreterMissing {
                program: program.to_string(),
            }
            .into());
        }
        Err(e) => return Err(e).with_context(|| format!("Failed to run {}", program)),
    };

    // Python 2 prints its version on stderr.
    let text = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    let unsupported = |found: String| BootstrapError::UnsupportedInterpreter {
        program: program.to_string(),
        found,
        required: REQUIRED_PYTHON.to_string(),
    };

    let version = parse_python_version(&text).ok_or_else(|| unsupported(text.trim().to_string()))?;
    let req = VersionReq::parse(REQUIRED_PYTHON)?;
    if !req.matches(&version) {
        return Err(unsupported(version.to_string()).into());
    }
    tracing::debug!(program, %version, "interpreter accepted");
    Ok(version)
}

/// A fully described meson invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MesonLaunch {
    pub program: OsString,
    pub args: Vec<OsString>,
    pub env: Vec<(String, OsString)>,
}

impl MesonLaunch {
    /// Use the vendored meson when `externals/meson/mesonbuild` exists,
    /// otherwise the `meson` on `PATH`. `NINJA` always points at `ninja`.
    pub fn plan(config: &Config, ninja: &Path, forwarded: &[String]) -> Result<Self> {
        let meson_dir = vendored_meson_dir(config);
        let mut env = vec![("NINJA".to_string(), ninja.as_os_str().to_os_string())];

        let (program, mut args) = if meson_dir.join("mesonbuild").is_dir() {
            let mut paths = vec![meson_dir.clone()];
            if let Some(existing) = std::env::var_os("PYTHONPATH") {
                paths.extend(std::env::split_paths(&existing));
            }
            let joined = std::env::join_paths(paths).context("Invalid PYTHONPATH entry")?;
            env.push(("PYTHONPATH".to_string(), joined));
            (
                OsString::from(&config.python),
                vec![meson_dir.join("meson.py").into_os_string()],
            )
        } else {
            tracing::debug!("no vendored meson, using meson from PATH");
            (OsString::from("meson"), Vec::new())
        };
        args.extend(forwarded.iter().map(OsString::from));

        Ok(Self { program, args, env })
    }

    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        cmd
    }

    /// Replace this process with meson.
    #[cfg(unix)]
    pub fn exec(self) -> Result<i32> {
        use std::os::unix::process::CommandExt;
        tracing::debug!(launch = ?self, "exec");
        let err = self.command().exec();
        Err(err).with_context(|| format!("Failed to start {}", self.program.to_string_lossy()))
    }

    /// Run meson and return its exit code.
    #[cfg(not(unix))]
    pub fn exec(self) -> Result<i32> {
        tracing::debug!(launch = ?self, "spawn");
        let status = self
            .command()
            .status()
            .with_context(|| format!("Failed to start {}", self.program.to_string_lossy()))?;
        Ok(status.code().unwrap_or(1))
    }
}

fn vendored_meson_dir(config: &Config) -> PathBuf {
    config
        .dependency("meson")
        .map(|dep| dep.local_path(&config.root))
        .unwrap_or_else(|| config.root.join("externals/meson"))
}
