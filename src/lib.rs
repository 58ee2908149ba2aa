//! # mesonup - bootstrap wrapper for meson builds
//!
//! Prepares a source tree before handing control to meson:
//!
//! - **Externals**: pinned libraries and build tools, fetched as git
//!   submodules inside a work tree or as snapshot archives outside one
//! - **Helper tool**: builds `ninja` from the fetched source when absent
//! - **Hand-off**: sets `NINJA`, prefers the vendored meson, forwards arguments
//!
//! ## Module Organization
//!
//! - [`config`] - Revision table and `mesonup.toml`
//! - [`vcs`] - Git work-tree detection and submodule pinning
//! - [`deps`] - Archive download and batch resolution
//! - [`helper`] - Ninja probe and bootstrap
//! - [`launch`] - Interpreter check and meson invocation
//! - [`commands`] - CLI command handlers

/// CLI command handlers extracted from main.
pub mod commands;

/// Revision table and configuration file parsing.
pub mod config;

/// External dependency fetching.
pub mod deps;

/// Classified failures and exit codes.
pub mod error;

/// Ninja helper binary.
pub mod helper;

/// Interpreter check and meson hand-off.
pub mod launch;

/// Terminal UI utilities (tables).
pub mod ui;

/// Git submodule handling.
pub mod vcs;
