//! Integration test suite for Wrapkit
//!
//! End-to-end tests that run the compiled `wrapkit` binary against a
//! temporary project, tool store and config file. The build toolchain and the
//! package manager are stood in for by `sh` scripts configured per test.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **cli_args**: Flag combinations, exit codes and help output
//! - **handoff**: Hidden successor entry point
//! - **integrate**: Shell startup file management
//! - **status**: Status report
//! - **update**: Self-update flows (up to date, failed build, full handoff)

mod common;

mod cli_args;
mod handoff;
mod integrate;
mod status;
mod update;
