//! Helpers for running the `wrapkit` binary against a [`ProjectFixture`].

use anyhow::Result;
use assert_cmd::Command;
use std::path::Path;
use wrapkit_cli::test_utils::ProjectFixture;

/// Captured result of one `wrapkit` invocation.
#[derive(Debug)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Toolchain section whose pack step writes `content` as the package.
pub fn packing_toolchain(content: &str) -> String {
    format!(
        r#"[toolchain]
program = "sh"
build_args = ["-c", "true"]
pack_args = ["-c", "mkdir -p bin/Release/nupkg && printf '%s' '{content}' > bin/Release/nupkg/Wrapkit.nupkg"]
"#
    )
}

/// A `wrapkit` command isolated from the caller's home, shell session and colors.
pub fn wrapkit_command(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("wrapkit").unwrap();
    cmd.env("HOME", home)
        .env("NO_COLOR", "1")
        .env_remove("WRAPKIT_SHELL_INTEGRATED")
        .env_remove("WRAPKIT_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

/// Run `wrapkit` with the fixture's config file and shell integration off.
pub fn run_wrapkit(fixture: &ProjectFixture, args: &[&str]) -> Result<CommandOutput> {
    let output = wrapkit_command(&fixture.home_dir())
        .arg("--config")
        .arg(fixture.config_path())
        .arg("--no-shell-integration")
        .args(args)
        .output()?;

    Ok(CommandOutput {
        success: output.status.success(),
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}
