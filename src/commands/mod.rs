//! CLI command handlers
//!
//! This module contains the implementation of CLI command handlers
//! extracted from main.rs.

pub mod bootstrap;
pub mod clean;
pub mod status;
