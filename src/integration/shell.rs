//! Shell-specific pieces of the integration: which shell, where its startup
//! file lives, what the wrapper function looks like and how to restart into it.

use anyhow::Result;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::block::IntegrationBlock;
use crate::constants::{SHELL_INTEGRATED_ENV, SHELL_QUERY_TIMEOUT, TOOL_NAME};
use crate::core::WrapkitError;
use crate::utils::platform::{executable_stem, find_executable};
use crate::utils::process::ToolCommand;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellKind {
    Bash,
    Zsh,
    PowerShell,
}

impl fmt::Display for ShellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bash => write!(f, "bash"),
            Self::Zsh => write!(f, "zsh"),
            Self::PowerShell => write!(f, "PowerShell"),
        }
    }
}

impl ShellKind {
    /// Classify a shell by its executable name.
    pub fn from_executable(path: &Path) -> Result<Self, WrapkitError> {
        match executable_stem(path).to_ascii_lowercase().as_str() {
            "bash" => Ok(Self::Bash),
            "zsh" => Ok(Self::Zsh),
            "pwsh" | "powershell" => Ok(Self::PowerShell),
            other => Err(WrapkitError::ShellIntegrationFailed {
                reason: format!("unsupported shell '{other}' ({})", path.display()),
            }),
        }
    }

    /// Arguments that make the shell print the path of its user startup file.
    fn startup_file_query(self) -> Vec<&'static str> {
        match self {
            Self::Bash => vec!["-c", r#"printf '%s' "$HOME/.bashrc""#],
            Self::Zsh => vec!["-c", r#"printf '%s' "${ZDOTDIR:-$HOME}/.zshrc""#],
            Self::PowerShell => {
                vec!["-NoProfile", "-NonInteractive", "-Command", "$PROFILE.CurrentUserAllHosts"]
            }
        }
    }

    /// Body of the managed block: a `wrapkit` function that marks the session
    /// as integrated, hands the tool a PID file and waits for any updater
    /// process the tool reports there.
    #[must_use]
    pub fn canonical_block(self) -> IntegrationBlock {
        let body = match self {
            Self::Bash | Self::Zsh => format!(
                r#"{TOOL_NAME}() {{
    local __wrapkit_pid_file __wrapkit_status __wrapkit_pid
    __wrapkit_pid_file="$(mktemp "${{TMPDIR:-/tmp}}/wrapkit-updater.XXXXXX")" || return 1
    {SHELL_INTEGRATED_ENV}=1 command {TOOL_NAME} --updater-pid-file "$__wrapkit_pid_file" "$@"
    __wrapkit_status=$?
    if [ -s "$__wrapkit_pid_file" ]; then
        __wrapkit_pid="$(cat "$__wrapkit_pid_file")"
        while kill -0 "$__wrapkit_pid" 2>/dev/null; do sleep 0.25; done
    fi
    rm -f "$__wrapkit_pid_file"
    return $__wrapkit_status
}}"#
            ),
            Self::PowerShell => format!(
                r#"function {TOOL_NAME} {{
    $pidFile = [System.IO.Path]::GetTempFileName()
    $previous = $env:{SHELL_INTEGRATED_ENV}
    $env:{SHELL_INTEGRATED_ENV} = '1'
    try {{
        $exe = (Get-Command {TOOL_NAME} -CommandType Application | Select-Object -First 1).Source
        & $exe --updater-pid-file $pidFile @args
    }} finally {{
        $env:{SHELL_INTEGRATED_ENV} = $previous
    }}
    $updaterPid = Get-Content -Path $pidFile -ErrorAction SilentlyContinue
    if ($updaterPid) {{
        Wait-Process -Id ([int]$updaterPid) -ErrorAction SilentlyContinue
    }}
    Remove-Item -Path $pidFile -ErrorAction SilentlyContinue
}}"#
            ),
        };
        IntegrationBlock::new(&body)
    }

    /// Program and arguments for an interactive session that loads the
    /// startup file and then runs the tool with `tool_args`.
    #[must_use]
    pub fn restart_command(self, shell: &Path, tool_args: &[String]) -> (PathBuf, Vec<String>) {
        let shell_path = shell.display().to_string();
        let args = match self {
            Self::Bash | Self::Zsh => {
                let invocation = std::iter::once(TOOL_NAME.to_string())
                    .chain(tool_args.iter().map(|a| posix_quote(a)))
                    .collect::<Vec<_>>()
                    .join(" ");
                let script = format!("{invocation}; exec {} -i", posix_quote(&shell_path));
                vec!["-i".to_string(), "-c".to_string(), script]
            }
            Self::PowerShell => {
                let invocation = std::iter::once(TOOL_NAME.to_string())
                    .chain(tool_args.iter().map(|a| powershell_quote(a)))
                    .collect::<Vec<_>>()
                    .join(" ");
                vec!["-NoExit".to_string(), "-Command".to_string(), invocation]
            }
        };
        (shell.to_path_buf(), args)
    }
}

fn posix_quote(arg: &str) -> String {
    format!("'{}'", arg.replace('\'', r"'\''"))
}

fn powershell_quote(arg: &str) -> String {
    format!("'{}'", arg.replace('\'', "''"))
}

/// The shell to integrate with: the configured one, else `$SHELL` on Unix and
/// `pwsh`/`powershell` on Windows.
pub fn detect_shell(configured: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = configured {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        return ["pwsh", "powershell"].iter().find_map(|name| find_executable(name)).ok_or_else(
            || {
                WrapkitError::ShellIntegrationFailed {
                    reason: "no PowerShell executable found on PATH".to_string(),
                }
                .into()
            },
        );
    }

    match std::env::var("SHELL") {
        Ok(shell) if !shell.is_empty() => Ok(PathBuf::from(shell)),
        _ => Err(WrapkitError::ShellIntegrationFailed {
            reason: "SHELL is not set".to_string(),
        }
        .into()),
    }
}

/// Ask the shell itself where its user startup file is.
pub async fn query_startup_file(shell: &Path, kind: ShellKind) -> Result<PathBuf> {
    let output = ToolCommand::new(shell.display().to_string())
        .args(kind.startup_file_query())
        .quiet()
        .with_timeout(Some(SHELL_QUERY_TIMEOUT))
        .with_context("shell-query")
        .execute()
        .await?;

    let path = output.stdout.trim();
    if !output.success() || path.is_empty() {
        return Err(WrapkitError::ShellIntegrationFailed {
            reason: format!(
                "{kind} did not report a startup file (exit code {})",
                output.code_or_signal()
            ),
        }
        .into());
    }

    debug!("{} startup file: {}", kind, path);
    Ok(PathBuf::from(path))
}
