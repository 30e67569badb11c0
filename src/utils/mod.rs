//! Cross-platform utilities used by the update lifecycle and shell integration.
//!
//! - [`fs`] - atomic writes, directory creation, newest-artifact search
//! - [`platform`] - home directory, path expansion, executable lookup
//! - [`process`] - external command execution and process liveness

pub mod fs;
pub mod platform;
pub mod process;

pub use fs::{atomic_write, ensure_dir, find_latest_file};
pub use process::{ToolCommand, ToolCommandOutput, is_process_alive};
