//! Shell integration.
//!
//! Wrapkit maintains one delimited block in the user's shell startup file. The
//! block defines a `wrapkit` shell function that runs the real executable with
//! `WRAPKIT_SHELL_INTEGRATED=1` and a PID file, then waits for the updater
//! process the tool writes into that file. This is what lets an interactive
//! session observe a self-update finishing.
//!
//! The block is only ever written when it is missing or differs from the
//! canonical text after normalization. A replaced file is backed up first.
//!
//! When the block changes and the current process is not already running
//! through the wrapper, the process restarts itself inside a fresh interactive
//! shell so the next invocation goes through the new function.

pub mod block;
pub mod shell;


use anyhow::{Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::ShellConfig;
use crate::constants::SHELL_INTEGRATED_ENV;
use crate::core::WrapkitError;
use crate::utils::fs::{atomic_write, ensure_dir};

pub use block::IntegrationBlock;
pub use shell::ShellKind;

/// Result of [`IntegrationManager::ensure_and_restart`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrationStatus {
    /// Running inside the wrapper already; nothing checked.
    AlreadyIntegrated,
    /// Turned off in the config.
    Disabled,
    /// The startup file already had the current block.
    Unchanged,
    /// A new session was started; the caller should exit.
    Restarted,
}

/// State of the block in a startup file, for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockState {
    Missing,
    Current,
    Outdated,
}

/// Whether this process was started by the shell wrapper function.
#[must_use]
pub fn is_integrated_session() -> bool {
    std::env::var(SHELL_INTEGRATED_ENV).is_ok_and(|v| v == "1")
}

pub struct IntegrationManager {
    config: ShellConfig,
}

impl IntegrationManager {
    #[must_use]
    pub const fn new(config: ShellConfig) -> Self {
        Self {
            config,
        }
    }

    /// Shell executable to integrate with.
    pub fn shell(&self) -> Result<PathBuf> {
        shell::detect_shell(self.config.executable.as_deref())
    }

    /// Make sure the startup file of `shell_executable` carries the current
    /// block. Returns whether the file was written.
    pub async fn ensure_installed(&self, shell_executable: &Path) -> Result<bool> {
        let kind = ShellKind::from_executable(shell_executable)?;
        let startup_file = shell::query_startup_file(shell_executable, kind).await?;
        self.install_into(&startup_file, kind).await
    }

    /// Upsert the canonical block for `kind` into `startup_file`.
    pub async fn install_into(&self, startup_file: &Path, kind: ShellKind) -> Result<bool> {
        if let Some(parent) = startup_file.parent() {
            ensure_dir(parent)?;
        }
        let existing = read_if_exists(startup_file).await?;
        let content = existing.as_deref().unwrap_or_default();
        let line_ending = block::detect_line_ending(content);

        let Some(updated) = block::upsert(content, &kind.canonical_block(), line_ending)? else {
            debug!("Shell integration in {} is current", startup_file.display());
            return Ok(false);
        };

        if existing.is_some() {
            let backup = backup_file(startup_file).await?;
            info!("Backed up {} to {}", startup_file.display(), backup.display());
        }
        atomic_write(startup_file, updated.as_bytes())?;
        info!("Updated shell integration in {}", startup_file.display());
        Ok(true)
    }

    /// Remove the block from `startup_file`. Returns whether the file was written.
    pub async fn remove_from(&self, startup_file: &Path) -> Result<bool> {
        let Some(existing) = read_if_exists(startup_file).await? else {
            return Ok(false);
        };
        let Some(updated) = block::remove(&existing)? else {
            return Ok(false);
        };

        backup_file(startup_file).await?;
        atomic_write(startup_file, updated.as_bytes())?;
        info!("Removed shell integration from {}", startup_file.display());
        Ok(true)
    }

    /// How the block in `startup_file` compares to the canonical one.
    pub async fn inspect(&self, startup_file: &Path, kind: ShellKind) -> Result<BlockState> {
        let content = read_if_exists(startup_file).await?.unwrap_or_default();
        if block::find_block(&content)?.is_none() {
            return Ok(BlockState::Missing);
        }
        let line_ending = block::detect_line_ending(&content);
        Ok(match block::upsert(&content, &kind.canonical_block(), line_ending)? {
            None => BlockState::Current,
            Some(_) => BlockState::Outdated,
        })
    }

    /// Install the block if needed and, when it changed, restart into a new
    /// interactive shell running the tool again with `tool_args`.
    ///
    /// On Unix a successful restart replaces the current process and does not
    /// return.
    pub async fn ensure_and_restart(&self, tool_args: &[String]) -> Result<IntegrationStatus> {
        if !self.config.integration {
            return Ok(IntegrationStatus::Disabled);
        }
        if is_integrated_session() {
            debug!("Already running inside the shell wrapper");
            return Ok(IntegrationStatus::AlreadyIntegrated);
        }

        let shell = self.shell()?;
        if !self.ensure_installed(&shell).await? {
            return Ok(IntegrationStatus::Unchanged);
        }

        let kind = ShellKind::from_executable(&shell)?;
        let (program, args) = kind.restart_command(&shell, tool_args);
        println!(
            "{}",
            format!("Shell integration updated, restarting in a new {kind} session").cyan()
        );
        restart(&program, &args)
    }
}

async fn read_if_exists(path: &Path) -> Result<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
    }
}

/// Copy `path` to `<path>.bak.<YYYYMMDD_HHMMSS>`.
async fn backup_file(path: &Path) -> Result<PathBuf> {
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let mut name = path.as_os_str().to_owned();
    name.push(format!(".bak.{stamp}"));
    let backup = PathBuf::from(name);

    tokio::fs::copy(path, &backup)
        .await
        .with_context(|| format!("Failed to back up {}", path.display()))?;
    Ok(backup)
}

#[cfg(unix)]
fn restart(program: &Path, args: &[String]) -> Result<IntegrationStatus> {
    use std::os::unix::process::CommandExt;

    let err = std::process::Command::new(program).args(args).exec();
    Err(WrapkitError::ShellIntegrationFailed {
        reason: format!("failed to start {}: {err}", program.display()),
    }
    .into())
}

#[cfg(not(unix))]
fn restart(program: &Path, args: &[String]) -> Result<IntegrationStatus> {
    std::process::Command::new(program).args(args).spawn().map_err(|e| {
        WrapkitError::ShellIntegrationFailed {
            reason: format!("failed to start {}: {e}", program.display()),
        }
    })?;
    Ok(IntegrationStatus::Restarted)
}
