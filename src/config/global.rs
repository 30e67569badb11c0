//! Global configuration (`~/.wrapkit/config.toml`).
//!
//! Every field has a serde default, so a missing file, an empty file or a file
//! that only overrides one key are all valid. The defaults describe a .NET tool
//! project packed into a `.nupkg` and installed with `dotnet tool update`.
//!
//! # Example
//!
//! ```toml
//! [project]
//! manifest_name = "Wrapkit.csproj"
//! project_dir = "~/src/wrapkit/Wrapkit"
//!
//! [toolchain]
//! program = "dotnet"
//! build_args = ["build", "-c", "Release"]
//! pack_args = ["pack", "-c", "Release"]
//! artifact_dir = "bin/Release/nupkg"
//! artifact_pattern = "*.nupkg"
//!
//! [install]
//! installed_root = "~/.dotnet/tools"
//! installed_pattern = "Wrapkit*.nupkg"
//! command = ["dotnet", "tool", "update", "--global", "--add-source", "{source}", "Wrapkit"]
//! post_update = ["wrapkit", "status"]
//! poll_interval_ms = 250
//! wait_timeout_secs = 600
//!
//! [shell]
//! integration = true
//! executable = "/usr/bin/zsh"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::debug;

use crate::constants::{
    CONFIG_PATH_ENV, DEFAULT_POLL_INTERVAL_MS, DEFAULT_WAIT_TIMEOUT_SECS, MAX_POLL_INTERVAL_MS,
    SOURCE_PLACEHOLDER,
};
use crate::core::WrapkitError;
use crate::utils::platform::{get_home_dir, resolve_path};

/// Root configuration document.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct GlobalConfig {
    #[serde(default)]
    pub project: ProjectConfig,

    #[serde(default)]
    pub toolchain: ToolchainConfig,

    #[serde(default)]
    pub install: InstallConfig,

    #[serde(default)]
    pub shell: ShellConfig,
}

/// Where the tool's own project lives.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ProjectConfig {
    /// File name of the project manifest holding `<Version>`.
    #[serde(default = "default_manifest_name")]
    pub manifest_name: String,

    /// Explicit project directory; skips discovery when set.
    #[serde(default)]
    pub project_dir: Option<String>,

    /// Directory tried when walking up from the executable finds nothing.
    #[serde(default = "default_fallback_dir")]
    pub fallback_dir: String,

    /// Search the whole home directory as a last resort.
    #[serde(default = "default_true")]
    pub search_home: bool,
}

/// External build toolchain invocation.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ToolchainConfig {
    #[serde(default = "default_toolchain_program")]
    pub program: String,

    #[serde(default = "default_build_args")]
    pub build_args: Vec<String>,

    #[serde(default = "default_pack_args")]
    pub pack_args: Vec<String>,

    /// Output directory of the pack step, relative to the project directory.
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: String,

    #[serde(default = "default_artifact_pattern")]
    pub artifact_pattern: String,

    /// Per-step timeout in seconds, 0 disables.
    #[serde(default)]
    pub step_timeout_secs: u64,
}

/// Installation performed by the handoff successor.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct InstallConfig {
    /// Root of the installed tool store, searched recursively.
    #[serde(default = "default_installed_root")]
    pub installed_root: String,

    #[serde(default = "default_installed_pattern")]
    pub installed_pattern: String,

    /// Package manager command; `{source}` is replaced by the package directory.
    #[serde(default = "default_install_command")]
    pub command: Vec<String>,

    /// Optional command run after a successful install.
    #[serde(default)]
    pub post_update: Option<Vec<String>>,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_wait_timeout_secs")]
    pub wait_timeout_secs: u64,
}

/// Shell startup file integration.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ShellConfig {
    #[serde(default = "default_true")]
    pub integration: bool,

    /// Shell executable; detected when unset.
    #[serde(default)]
    pub executable: Option<String>,
}

fn default_manifest_name() -> String {
    "Wrapkit.csproj".to_string()
}

fn default_fallback_dir() -> String {
    "~/source/repos/Wrapkit/Wrapkit".to_string()
}

const fn default_true() -> bool {
    true
}

fn default_toolchain_program() -> String {
    "dotnet".to_string()
}

fn default_build_args() -> Vec<String> {
    vec!["build".to_string(), "-c".to_string(), "Release".to_string()]
}

fn default_pack_args() -> Vec<String> {
    vec!["pack".to_string(), "-c".to_string(), "Release".to_string()]
}

fn default_artifact_dir() -> String {
    "bin/Release/nupkg".to_string()
}

fn default_artifact_pattern() -> String {
    "*.nupkg".to_string()
}

fn default_installed_root() -> String {
    "~/.dotnet/tools".to_string()
}

fn default_installed_pattern() -> String {
    "Wrapkit*.nupkg".to_string()
}

fn default_install_command() -> Vec<String> {
    ["dotnet", "tool", "update", "--global", "--add-source", SOURCE_PLACEHOLDER, "Wrapkit"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

const fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

const fn default_wait_timeout_secs() -> u64 {
    DEFAULT_WAIT_TIMEOUT_SECS
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            manifest_name: default_manifest_name(),
            project_dir: None,
            fallback_dir: default_fallback_dir(),
            search_home: true,
        }
    }
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            program: default_toolchain_program(),
            build_args: default_build_args(),
            pack_args: default_pack_args(),
            artifact_dir: default_artifact_dir(),
            artifact_pattern: default_artifact_pattern(),
            step_timeout_secs: 0,
        }
    }
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            installed_root: default_installed_root(),
            installed_pattern: default_installed_pattern(),
            command: default_install_command(),
            post_update: None,
            poll_interval_ms: default_poll_interval_ms(),
            wait_timeout_secs: default_wait_timeout_secs(),
        }
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            integration: true,
            executable: None,
        }
    }
}

impl ToolchainConfig {
    pub fn step_timeout(&self) -> Option<Duration> {
        (self.step_timeout_secs > 0).then(|| Duration::from_secs(self.step_timeout_secs))
    }
}

impl InstallConfig {
    /// Poll interval clamped to a sane range.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.clamp(1, MAX_POLL_INTERVAL_MS))
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    /// Install command with `{source}` replaced by `source_dir`.
    pub fn install_argv(&self, source_dir: &Path) -> Vec<String> {
        let source = source_dir.display().to_string();
        self.command.iter().map(|arg| arg.replace(SOURCE_PLACEHOLDER, &source)).collect()
    }

    pub fn installed_root_path(&self) -> Result<PathBuf> {
        resolve_path(&self.installed_root)
    }
}

impl GlobalConfig {
    /// Load from the default location, or defaults when the file is absent.
    pub async fn load() -> Result<Self> {
        Self::load_with_optional(None).await
    }

    /// Load from an explicit path, then `WRAPKIT_CONFIG`, then the default path.
    ///
    /// A file named by the user must exist; only the default location may be
    /// absent, in which case the defaults apply.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path.or_else(env_config_path) {
            if !path.exists() {
                return Err(WrapkitError::ConfigError {
                    message: format!("config file {} does not exist", path.display()),
                }
                .into());
            }
            return Self::load_from(&path).await;
        }

        let path = home_config_path()?;
        if path.exists() {
            Self::load_from(&path).await
        } else {
            debug!("No config file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read global config from {}", path.display()))?;

        toml::from_str(&content).map_err(|e| {
            WrapkitError::ConfigError {
                message: format!("{}: {e}", path.display()),
            }
            .into()
        })
    }

    /// `WRAPKIT_CONFIG` if set, otherwise `~/.wrapkit/config.toml`.
    pub fn default_path() -> Result<PathBuf> {
        env_config_path().map_or_else(home_config_path, Ok)
    }
}

fn env_config_path() -> Option<PathBuf> {
    std::env::var(CONFIG_PATH_ENV).ok().filter(|p| !p.is_empty()).map(PathBuf::from)
}

fn home_config_path() -> Result<PathBuf> {
    Ok(get_home_dir()?.join(".wrapkit").join("config.toml"))
}
