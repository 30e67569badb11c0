//! Configuration for Wrapkit.
//!
//! A single global file, `~/.wrapkit/config.toml` (or `WRAPKIT_CONFIG`, or the
//! `--config` flag), describes where the tool's own project lives, how to build
//! and pack it, how the package manager installs it and whether the shell
//! integration block should be maintained. See [`GlobalConfig`] for the format.

mod global;

pub use global::{GlobalConfig, InstallConfig, ProjectConfig, ShellConfig, ToolchainConfig};
