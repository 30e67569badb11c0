//! Command-line interface for Wrapkit.
//!
//! Without a subcommand, Wrapkit either runs a self-update (when one of the
//! update flags is given) or prints the status report.
//!
//! # Update Flags
//!
//! - `--update` / `--updateMinor` / `--updateMajor` - release with a patch,
//!   minor or major bump (Major wins over Minor wins over Patch)
//! - `--forceUpdate` - skip change detection
//! - `--skipVersion` - with `--forceUpdate`, republish the current version
//!
//! # Subcommands
//!
//! - `status` - project, version, installed package and shell integration
//! - `integrate` - install or remove the shell integration block
//! - `handoff` (hidden) - successor entry point started by an update
//!
//! # Startup
//!
//! Before running anything except `handoff`, the shell integration block is
//! checked. If it had to be written, the process restarts itself inside a new
//! interactive shell (unless `--no-shell-integration` is given).

mod handoff;
mod integrate;
mod status;
mod update;


use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::config::GlobalConfig;
use crate::core::WrapkitError;
use crate::integration::{IntegrationManager, IntegrationStatus};

pub use update::UpdateArgs;

#[derive(Parser, Debug)]
#[command(
    name = "wrapkit",
    about = "Self-updating build wrapper",
    version,
    long_about = "Wrapkit rebuilds, repacks and reinstalls itself from its own project sources. \
                  An update only happens when the freshly packed artifact differs from the installed one."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    update: UpdateArgs,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the global configuration file (default: ~/.wrapkit/config.toml)
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Do not check or install the shell integration block
    #[arg(long, global = true)]
    no_shell_integration: bool,

    /// File that receives the updater PID (written by the shell wrapper)
    #[arg(long = "updater-pid-file", global = true, hide = true, value_name = "PATH")]
    updater_pid_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show project, version, installed package and shell integration state
    Status(status::StatusCommand),

    /// Install or remove the shell integration block
    Integrate(integrate::IntegrateCommand),

    /// Finish an update after the original process exits
    #[command(hide = true)]
    Handoff(handoff::HandoffCommand),
}

/// Options shared by every command.
#[derive(Debug, Clone, Default)]
pub struct CliContext {
    pub config_path: Option<PathBuf>,
    pub updater_pid_file: Option<PathBuf>,
    pub quiet: bool,
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        init_logging(self.verbose, self.quiet);
        self.validate()?;

        let config_path = self.config.as_deref().map(std::path::absolute).transpose()?;
        let config = GlobalConfig::load_with_optional(config_path.clone()).await?;
        let context = CliContext {
            config_path,
            updater_pid_file: self.updater_pid_file,
            quiet: self.quiet,
        };

        // The successor never touches the shell integration
        let command = match self.command {
            Some(Commands::Handoff(cmd)) => return cmd.execute(&config).await,
            other => other,
        };

        if !self.no_shell_integration && restart_for_integration(&config).await {
            return Ok(());
        }

        match command {
            Some(Commands::Status(cmd)) => cmd.execute(&config, &context).await,
            Some(Commands::Integrate(cmd)) => cmd.execute(&config).await,
            Some(Commands::Handoff(cmd)) => cmd.execute(&config).await,
            None if self.update.requested() => self.update.execute(&config, &context).await,
            None => status::StatusCommand::default().execute(&config, &context).await,
        }
    }

    /// Update flags select the default action and cannot be combined with a subcommand.
    fn validate(&self) -> Result<(), WrapkitError> {
        if self.command.is_some() && self.update.requested() {
            return Err(WrapkitError::InvalidArguments {
                message: "update flags cannot be combined with a subcommand".to_string(),
            });
        }
        Ok(())
    }
}

/// Run the integration check. Returns whether the caller should exit because
/// a new session took over.
async fn restart_for_integration(config: &GlobalConfig) -> bool {
    let args: Vec<String> =
        std::env::args_os().skip(1).map(|a| a.to_string_lossy().into_owned()).collect();
    match IntegrationManager::new(config.shell.clone()).ensure_and_restart(&args).await {
        Ok(IntegrationStatus::Restarted) => true,
        Ok(status) => {
            debug!("Shell integration: {:?}", status);
            false
        }
        Err(e) => {
            eprintln!("{} {e:#}", "warning: shell integration skipped:".yellow());
            false
        }
    }
}

/// Set up the tracing subscriber. `RUST_LOG` takes precedence over the flags.
fn init_logging(verbose: bool, quiet: bool) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if verbose {
        EnvFilter::new("debug")
    } else if quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::new("warn")
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .without_time()
        .try_init();
}
