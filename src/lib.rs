//! Wrapkit - self-updating build wrapper
//!
//! Wrapkit is installed from a package built out of its own project sources.
//! It can rebuild, repack and reinstall itself, and it keeps a small wrapper
//! function in the user's shell startup file so an interactive session can wait
//! for a self-update to finish.
//!
//! # Architecture Overview
//!
//! - The project manifest's `<Version>X.Y.Z</Version>` element is the only
//!   state carried between runs
//! - Change detection compares SHA-256 fingerprints of the installed package
//!   and a freshly packed one; timestamps are never used
//! - The final install runs in a detached successor process, because the
//!   running executable cannot replace itself
//! - Any failure after the version was bumped restores the manifest exactly
//!
//! # Core Modules
//!
//! ## Update Lifecycle
//! - [`upgrade`] - hashing, change detection, build/pack pipeline, orchestrator, handoff
//! - [`version`] - three-part semantic versions and bump kinds
//! - [`manifest`] - reading and rewriting the manifest version, project discovery
//!
//! ## Environment
//! - [`integration`] - managed block in the shell startup file, restart into it
//! - [`config`] - global configuration (`~/.wrapkit/config.toml`)
//!
//! ## Supporting Modules
//! - [`cli`] - command-line interface
//! - [`core`] - error types and user-facing error formatting
//! - [`constants`] - timeouts, environment variable names, markers
//! - [`utils`] - file system, platform and process helpers
//!
//! # Configuration Example
//!
//! ```toml
//! [project]
//! project_dir = "~/src/wrapkit/Wrapkit"
//!
//! [install]
//! post_update = ["wrapkit", "status"]
//!
//! [shell]
//! integration = true
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod integration;
pub mod manifest;
pub mod upgrade;
pub mod utils;
pub mod version;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
