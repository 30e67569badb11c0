//! Status report: project, version, installed package, shell integration.
//!
//! Each section degrades to a diagnostic line instead of failing the command,
//! so the report is useful precisely when something is misconfigured.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::{Path, PathBuf};

use super::CliContext;
use crate::config::GlobalConfig;
use crate::integration::{BlockState, IntegrationManager, ShellKind, is_integrated_session, shell};
use crate::manifest::ProjectManifest;
use crate::manifest::discovery::locate_project_dir;
use crate::upgrade::{BuildPackPipeline, Toolchain};
use crate::utils::platform::get_home_dir;

#[derive(Args, Debug, Default)]
pub struct StatusCommand {}

impl StatusCommand {
    pub async fn execute(self, config: &GlobalConfig, context: &CliContext) -> Result<()> {
        match &context.config_path {
            Some(path) => row("Config", &path.display().to_string()),
            None => row("Config", &display_default_config()),
        }

        match project_dir(config) {
            Ok(dir) => {
                row("Project", &dir.display().to_string());
                let manifest_path = dir.join(&config.project.manifest_name);
                match ProjectManifest::load(&manifest_path).await.and_then(|m| Ok(m.version()?)) {
                    Ok(version) => row("Version", &version.to_string().bold().to_string()),
                    Err(e) => problem("Version", &e),
                }
            }
            Err(e) => problem("Project", &e),
        }

        let pipeline = BuildPackPipeline::new(config.toolchain.clone(), config.install.clone());
        match pipeline.installed_artifact().await {
            Ok(artifact) => {
                row("Installed", &artifact.path.display().to_string());
                row("Fingerprint", artifact.fingerprint.as_str());
                row("Modified", &artifact.modified.format("%Y-%m-%d %H:%M:%S").to_string());
            }
            Err(e) => problem("Installed", &e),
        }

        shell_section(config).await;
        Ok(())
    }
}

async fn shell_section(config: &GlobalConfig) {
    if !config.shell.integration {
        row("Shell", &"integration disabled".dimmed().to_string());
        return;
    }

    let manager = IntegrationManager::new(config.shell.clone());
    let result = async {
        let shell_path = manager.shell()?;
        let kind = ShellKind::from_executable(&shell_path)?;
        let startup_file = shell::query_startup_file(&shell_path, kind).await?;
        let state = manager.inspect(&startup_file, kind).await?;
        anyhow::Ok((kind, startup_file, state))
    }
    .await;

    match result {
        Ok((kind, startup_file, state)) => {
            row("Shell", &kind.to_string());
            row("Startup file", &startup_file.display().to_string());
            let state = match state {
                BlockState::Current => "installed".green(),
                BlockState::Outdated => "outdated".yellow(),
                BlockState::Missing => "missing".red(),
            };
            row("Integration", &state.to_string());
        }
        Err(e) => problem("Shell", &e),
    }

    if is_integrated_session() {
        row("Session", "integrated");
    }
}

fn project_dir(config: &GlobalConfig) -> Result<PathBuf> {
    let exe = std::env::current_exe()?;
    let start = exe.parent().unwrap_or(Path::new("."));
    locate_project_dir(&config.project, start, &get_home_dir()?)
}

fn display_default_config() -> String {
    match GlobalConfig::default_path() {
        Ok(path) if path.exists() => path.display().to_string(),
        Ok(path) => format!("{} (not found, using defaults)", path.display()),
        Err(_) => "defaults".to_string(),
    }
}

fn row(label: &str, value: &str) {
    println!("{:>13}: {}", label.bold(), value);
}

fn problem(label: &str, error: &anyhow::Error) {
    println!("{:>13}: {}", label.bold(), format!("{error}").yellow());
}
