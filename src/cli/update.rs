//! Self-update flags and their execution.

use anyhow::{Context, Result};
use clap::{ArgGroup, Args};
use colored::Colorize;
use std::path::PathBuf;

use super::CliContext;
use crate::config::GlobalConfig;
use crate::integration::is_integrated_session;
use crate::manifest::discovery::locate_project_dir;
use crate::upgrade::{
    BuildPackPipeline, HandoffCoordinator, UpdateOptions, UpdateOrchestrator, UpdateOutcome,
};
use crate::utils::platform::get_home_dir;
use crate::version::BumpKind;

/// Flags that trigger a self-update.
#[derive(Args, Debug, Clone, Default)]
#[command(group(
    ArgGroup::new("update_flag")
        .args(["update", "update_minor", "update_major"])
        .multiple(true)
))]
pub struct UpdateArgs {
    /// Rebuild and reinstall with a patch bump if the package changed
    #[arg(long = "update")]
    pub update: bool,

    /// Like --update, with a minor bump
    #[arg(long = "updateMinor")]
    pub update_minor: bool,

    /// Like --update, with a major bump
    #[arg(long = "updateMajor")]
    pub update_major: bool,

    /// Skip change detection and always release
    #[arg(long = "forceUpdate", requires = "update_flag")]
    pub force_update: bool,

    /// Keep the current version (requires --forceUpdate)
    #[arg(long = "skipVersion", requires = "force_update")]
    pub skip_version: bool,
}

impl UpdateArgs {
    /// Whether any update flag was given.
    #[must_use]
    pub const fn requested(&self) -> bool {
        self.update || self.update_minor || self.update_major
    }

    /// Bump kind with Major > Minor > Patch precedence.
    #[must_use]
    pub const fn bump_kind(&self) -> BumpKind {
        if self.update_major {
            BumpKind::Major
        } else if self.update_minor {
            BumpKind::Minor
        } else {
            BumpKind::Patch
        }
    }

    #[must_use]
    pub const fn options(&self) -> UpdateOptions {
        UpdateOptions {
            bump: self.bump_kind(),
            force: self.force_update,
            skip_version: self.skip_version,
        }
    }

    pub async fn execute(self, config: &GlobalConfig, context: &CliContext) -> Result<()> {
        let options = self.options();
        options.validate()?;

        let exe = std::env::current_exe().context("Failed to locate running executable")?;
        let start = exe.parent().map(PathBuf::from).unwrap_or_default();
        let project_dir = locate_project_dir(&config.project, &start, &get_home_dir()?)?;

        println!(
            "{}",
            format!("Updating from {} ({} bump)", project_dir.display(), options.bump).cyan()
        );

        let mut pipeline = BuildPackPipeline::new(config.toolchain.clone(), config.install.clone());
        if context.quiet {
            pipeline = pipeline.quiet();
        }
        let coordinator = HandoffCoordinator::new()
            .with_config_path(context.config_path.clone())
            .with_pid_file(context.updater_pid_file.clone())
            .announce_pid(is_integrated_session());

        let mut orchestrator = UpdateOrchestrator::new(
            pipeline,
            coordinator,
            &project_dir,
            &config.project.manifest_name,
        );

        match orchestrator.run(options).await? {
            UpdateOutcome::UpToDate => {
                println!("{}", "Already up to date, version unchanged".green());
            }
            UpdateOutcome::Dispatched(request) => {
                if request.old_version == request.new_version {
                    println!("Republishing version {}", request.new_version.bold());
                } else {
                    println!(
                        "Version {} -> {}",
                        request.old_version,
                        request.new_version.bold()
                    );
                }
                println!("{}", "Installing after this process exits...".cyan());
            }
        }
        Ok(())
    }
}
