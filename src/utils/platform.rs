//! Platform helpers: home directory lookup, `~`/environment expansion and
//! executable discovery.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// The current user's home directory.
pub fn get_home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))
}

/// Expand `~` and environment variables in a configured path.
///
/// ```rust,no_run
/// use wrapkit_cli::utils::platform::resolve_path;
///
/// let tools = resolve_path("~/.dotnet/tools").unwrap();
/// assert!(tools.is_absolute());
/// ```
pub fn resolve_path(path: &str) -> Result<PathBuf> {
    let expanded =
        shellexpand::full(path).with_context(|| format!("Failed to expand path: {path}"))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Locate an executable on `PATH`.
#[must_use]
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

#[must_use]
pub const fn is_windows() -> bool {
    cfg!(windows)
}

/// File name of a path without extension, lowercased (`/usr/bin/Zsh` -> `zsh`).
#[must_use]
pub fn executable_stem(path: &Path) -> String {
    path.file_stem().map(|s| s.to_string_lossy().to_lowercase()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_path_expands_home() {
        let home = get_home_dir().unwrap();
        let resolved = resolve_path("~/a/b").unwrap();
        assert_eq!(resolved, home.join("a").join("b"));
    }

    #[test]
    fn test_resolve_path_plain() {
        assert_eq!(resolve_path("/tmp/x").unwrap(), PathBuf::from("/tmp/x"));
    }

    #[test]
    fn test_executable_stem() {
        assert_eq!(executable_stem(Path::new("/bin/bash")), "bash");
        assert_eq!(executable_stem(Path::new("C:/Program Files/PowerShell/7/pwsh.exe")), "pwsh");
    }
}
