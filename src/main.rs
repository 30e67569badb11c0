//! Wrapkit command-line entry point.
//!
//! Parses arguments, runs the requested command and turns any error into a
//! coloured diagnostic with exit status 1. Argument errors exit with status 2
//! through clap.

use anyhow::Result;
use clap::Parser;
use wrapkit_cli::cli;
use wrapkit_cli::core::error::user_friendly_error;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
