//! Handing the final install step to a process that outlives this one.
//!
//! The running executable cannot be replaced while it is executing, so the
//! orchestrator writes a [`HandoffRequest`] to a temporary JSON file, copies
//! its own binary to a temporary location and starts that copy as
//! `wrapkit handoff --request <file>` in a separate process group. The
//! original process then exits.
//!
//! The successor ([`run_successor`]) waits until the original PID is gone
//! from the process table, runs the package manager, and on failure restores
//! the manifest version text and removes the produced package directory.
//! There is no retry; a failed install leaves the previously installed
//! version runnable and the manifest consistent with it.

use anyhow::{Context, Result};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tracing::{debug, info, warn};

use crate::config::InstallConfig;
use crate::constants::UPDATER_PID_SENTINEL;
use crate::core::WrapkitError;
use crate::manifest::restore_version_text;
use crate::utils::fs::{atomic_write, remove_dir_if_exists, remove_file_if_exists};
use crate::utils::process::{ToolCommand, wait_for_exit};

/// Parameters consumed once by the successor process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandoffRequest {
    /// Process to wait for before installing.
    pub pid: u32,
    /// Directory holding the new package, passed to the package manager.
    pub package_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub old_version: String,
    pub new_version: String,
    /// Restore `old_version` in the manifest if the install fails.
    pub rollback_on_failure: bool,
    /// Temporary copy of the executable running the successor, deleted when done.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub successor_exe: Option<PathBuf>,
}

impl HandoffRequest {
    pub async fn read_from(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read handoff request {}", path.display()))?;
        serde_json::from_str(&content).map_err(|e| {
            WrapkitError::HandoffFailed {
                reason: format!("invalid handoff request {}: {e}", path.display()),
            }
            .into()
        })
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(self).context("Failed to serialize handoff request")?;
        atomic_write(path, &json)
    }

    /// Whether a failed install has a version bump to undo.
    #[must_use]
    pub fn needs_version_rollback(&self) -> bool {
        self.rollback_on_failure && self.old_version != self.new_version
    }
}

/// Starts whatever performs the install once this process is gone.
pub trait HandoffDispatcher {
    /// Start the successor and return its process id.
    fn dispatch(&self, request: &HandoffRequest) -> impl Future<Output = Result<u32>>;
}

/// [`HandoffDispatcher`] that spawns a detached copy of the running executable.
#[derive(Debug, Clone, Default)]
pub struct HandoffCoordinator {
    config_path: Option<PathBuf>,
    pid_file: Option<PathBuf>,
    announce_pid: bool,
}

impl HandoffCoordinator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Config file the successor should load instead of the default.
    #[must_use]
    pub fn with_config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    /// File that receives the successor's PID for the shell wrapper.
    #[must_use]
    pub fn with_pid_file(mut self, path: Option<PathBuf>) -> Self {
        self.pid_file = path;
        self
    }

    /// Print the PID sentinel line after spawning.
    #[must_use]
    pub const fn announce_pid(mut self, announce: bool) -> Self {
        self.announce_pid = announce;
        self
    }

    fn successor_command(&self, exe: &Path, request_file: &Path) -> std::process::Command {
        let mut cmd = std::process::Command::new(exe);
        if let Some(config) = &self.config_path {
            cmd.arg("--config").arg(config);
        }
        cmd.arg("handoff")
            .arg("--request")
            .arg(request_file)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
            cmd.creation_flags(CREATE_NEW_PROCESS_GROUP);
        }

        cmd
    }
}

impl HandoffDispatcher for HandoffCoordinator {
    async fn dispatch(&self, request: &HandoffRequest) -> Result<u32> {
        let id = uuid::Uuid::new_v4();
        let temp = std::env::temp_dir();
        let request_file = temp.join(format!("wrapkit-handoff-{id}.json"));
        let successor_exe =
            temp.join(format!("wrapkit-successor-{id}{}", std::env::consts::EXE_SUFFIX));

        let current_exe = std::env::current_exe().context("Failed to locate running executable")?;
        tokio::fs::copy(&current_exe, &successor_exe).await.with_context(|| {
            format!("Failed to copy {} to {}", current_exe.display(), successor_exe.display())
        })?;

        let mut request = request.clone();
        request.successor_exe = Some(successor_exe.clone());
        request.write_to(&request_file)?;
        debug!(target: "handoff", "Wrote handoff request {}", request_file.display());

        let child = match self.successor_command(&successor_exe, &request_file).spawn() {
            Ok(child) => child,
            Err(e) => {
                discard_files(&[&request_file, &successor_exe]).await;
                return Err(WrapkitError::ProcessSpawnFailed {
                    program: successor_exe.display().to_string(),
                    reason: e.to_string(),
                }
                .into());
            }
        };
        let pid = child.id();
        info!(target: "handoff", "Started successor process {} for {}", pid, request.new_version);

        // The successor is running from here on, so the dispatch has succeeded
        self.publish_pid(pid);
        Ok(pid)
    }
}

impl HandoffCoordinator {
    /// Tell the shell wrapper which process to wait for. Failures only cost the
    /// wrapper its wait and are logged.
    fn publish_pid(&self, pid: u32) {
        if let Some(pid_file) = &self.pid_file
            && let Err(e) = atomic_write(pid_file, pid.to_string().as_bytes())
        {
            warn!(target: "handoff", "Could not write PID file {}: {e:#}", pid_file.display());
        }
        if self.announce_pid {
            println!("{UPDATER_PID_SENTINEL}{pid}");
        }
    }
}

/// Entry point of the successor process.
///
/// Consumes `request_file`, performs the install and removes the temporary
/// executable. Returns `HandoffFailed` after rolling back when the wait or the
/// install fails.
pub async fn run_successor(request_file: &Path, install: &InstallConfig) -> Result<()> {
    let request = HandoffRequest::read_from(request_file).await?;
    if let Err(e) = remove_file_if_exists(request_file).await {
        warn!(target: "handoff", "Could not delete handoff request: {e:#}");
    }

    let result = complete_handoff(&request, install).await;
    remove_successor_exe(&request).await;
    result
}

async fn complete_handoff(request: &HandoffRequest, install: &InstallConfig) -> Result<()> {
    match wait_and_install(request, install).await {
        Ok(()) => {
            println!("{}", format!("Updated to version {}", request.new_version).green().bold());
            run_post_update(request, install).await;
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {e:#}", "Update failed:".red().bold());
            roll_back(request).await;
            Err(WrapkitError::HandoffFailed {
                reason: format!("{e:#}"),
            }
            .into())
        }
    }
}

async fn wait_and_install(request: &HandoffRequest, install: &InstallConfig) -> Result<()> {
    println!("{}", format!("Waiting for process {} to exit...", request.pid).cyan());
    wait_for_exit(request.pid, install.poll_interval(), install.wait_timeout()).await?;

    let argv = install.install_argv(&request.package_dir);
    let output = ToolCommand::from_argv(&argv)?.with_context("install").execute().await?;
    if !output.success() {
        anyhow::bail!("package manager exited with code {}", output.code_or_signal());
    }
    Ok(())
}

async fn run_post_update(request: &HandoffRequest, install: &InstallConfig) {
    let Some(argv) = &install.post_update else {
        return;
    };

    let mut command = match ToolCommand::from_argv(argv) {
        Ok(command) => command.with_context("post-update"),
        Err(e) => {
            warn!(target: "handoff", "Invalid post-update command: {e:#}");
            return;
        }
    };
    if let Some(dir) = request.manifest_path.parent() {
        command = command.current_dir(dir);
    }

    match command.execute().await {
        Ok(output) if output.success() => debug!(target: "handoff", "Post-update hook finished"),
        Ok(output) => {
            warn!(target: "handoff", "Post-update hook exited with code {}", output.code_or_signal());
        }
        Err(e) => warn!(target: "handoff", "Post-update hook failed: {e:#}"),
    }
}

async fn roll_back(request: &HandoffRequest) {
    if request.needs_version_rollback() {
        match restore_version_text(
            &request.manifest_path,
            &request.new_version,
            &request.old_version,
        )
        .await
        {
            Ok(true) => {
                println!("{}", format!("Version restored to {}", request.old_version).yellow());
            }
            Ok(false) => warn!(
                target: "handoff",
                "Version {} not found in {}, nothing to restore",
                request.new_version,
                request.manifest_path.display()
            ),
            Err(e) => eprintln!("{} {e:#}", "Failed to restore version:".red()),
        }
    }

    match remove_dir_if_exists(&request.package_dir).await {
        Ok(true) => info!(target: "handoff", "Removed {}", request.package_dir.display()),
        Ok(false) => {}
        Err(e) => warn!(target: "handoff", "Failed to remove package directory: {e:#}"),
    }
}

/// Remove files left by a dispatch that never started its successor.
async fn discard_files(paths: &[&Path]) {
    for path in paths {
        if let Err(e) = remove_file_if_exists(path).await {
            debug!(target: "handoff", "Could not delete {}: {e:#}", path.display());
        }
    }
}

async fn remove_successor_exe(request: &HandoffRequest) {
    let Some(exe) = &request.successor_exe else {
        return;
    };
    // Only ever delete the temporary copy this process is running from
    let running = std::env::current_exe().ok();
    if running.as_deref() != Some(exe.as_path()) {
        debug!(target: "handoff", "Not running from {}, leaving it", exe.display());
        return;
    }
    if let Err(e) = remove_file_if_exists(exe).await {
        debug!(target: "handoff", "Could not delete {}: {e:#}", exe.display());
    }
}
