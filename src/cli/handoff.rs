//! Hidden successor entry point.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use crate::config::GlobalConfig;
use crate::upgrade::run_successor;

#[derive(Args, Debug)]
pub struct HandoffCommand {
    /// Handoff request file written by the updating process
    #[arg(long, value_name = "FILE")]
    request: PathBuf,
}

impl HandoffCommand {
    pub async fn execute(self, config: &GlobalConfig) -> Result<()> {
        run_successor(&self.request, &config.install).await
    }
}
