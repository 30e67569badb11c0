//! Explicit shell integration management.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use crate::config::GlobalConfig;
use crate::integration::{IntegrationManager, ShellKind, shell};

#[derive(Args, Debug)]
pub struct IntegrateCommand {
    /// Remove the integration block instead of installing it
    #[arg(long)]
    remove: bool,

    /// Shell executable to integrate with (default: detected)
    #[arg(long, value_name = "PATH")]
    shell: Option<String>,
}

impl IntegrateCommand {
    pub async fn execute(self, config: &GlobalConfig) -> Result<()> {
        let mut shell_config = config.shell.clone();
        if self.shell.is_some() {
            shell_config.executable = self.shell;
        }
        let manager = IntegrationManager::new(shell_config);

        let shell_path = manager.shell()?;
        let kind = ShellKind::from_executable(&shell_path)?;
        let startup_file = shell::query_startup_file(&shell_path, kind).await?;

        let changed = if self.remove {
            manager.remove_from(&startup_file).await?
        } else {
            manager.install_into(&startup_file, kind).await?
        };

        let message = match (self.remove, changed) {
            (false, true) => format!("Installed {kind} integration in {}", startup_file.display()),
            (false, false) => format!("{kind} integration already current"),
            (true, true) => format!("Removed integration from {}", startup_file.display()),
            (true, false) => format!("No integration block in {}", startup_file.display()),
        };
        println!("{}", message.green());
        if changed && !self.remove {
            println!("Open a new {kind} session to use it.");
        }
        Ok(())
    }
}
