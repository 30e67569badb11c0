//! Locating the tool's own project directory.
//!
//! Search order:
//! 1. `[project] project_dir` from the config, if set (must contain the manifest)
//! 2. the running executable's directory and each of its ancestors
//! 3. `[project] fallback_dir`
//! 4. a recursive search under the home directory (hidden directories skipped)

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::ProjectConfig;
use crate::core::WrapkitError;
use crate::utils::platform::resolve_path;

/// Find the directory holding the manifest, starting from `start` (normally the
/// directory of the running executable) and falling back to `home`.
pub fn locate_project_dir(config: &ProjectConfig, start: &Path, home: &Path) -> Result<PathBuf> {
    let manifest = config.manifest_name.as_str();

    if let Some(configured) = &config.project_dir {
        let dir = resolve_path(configured)?;
        if dir.join(manifest).is_file() {
            debug!("Using configured project directory {}", dir.display());
            return Ok(dir);
        }
        return Err(WrapkitError::ProjectNotFound {
            manifest: dir.join(manifest).display().to_string(),
        }
        .into());
    }

    if let Some(dir) = find_in_ancestors(start, manifest) {
        debug!("Found project next to executable: {}", dir.display());
        return Ok(dir);
    }

    let fallback = resolve_path(&config.fallback_dir)?;
    if fallback.join(manifest).is_file() {
        info!("Using fallback project path: {}", fallback.display());
        return Ok(fallback);
    }

    if config.search_home {
        info!("Searching for {} under {}", manifest, home.display());
        if let Some(dir) = search_tree(home, manifest) {
            info!("Found project at: {}", dir.display());
            return Ok(dir);
        }
    }

    Err(WrapkitError::ProjectNotFound {
        manifest: manifest.to_string(),
    }
    .into())
}

fn find_in_ancestors(start: &Path, manifest: &str) -> Option<PathBuf> {
    start.ancestors().find(|dir| dir.join(manifest).is_file()).map(Path::to_path_buf)
}

fn search_tree(root: &Path, manifest: &str) -> Option<PathBuf> {
    let walker = WalkDir::new(root).into_iter().filter_entry(|entry| {
        entry.depth() == 0 || !entry.file_name().to_string_lossy().starts_with('.')
    });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                if e.io_error().is_some_and(|io| io.kind() != std::io::ErrorKind::PermissionDenied)
                {
                    warn!("Skipping folder during search: {}", e);
                }
                continue;
            }
        };
        if entry.file_type().is_file() && entry.file_name() == manifest {
            return entry.path().parent().map(Path::to_path_buf);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config(project_dir: Option<&Path>) -> ProjectConfig {
        ProjectConfig {
            manifest_name: "Wrapkit.csproj".to_string(),
            project_dir: project_dir.map(|p| p.display().to_string()),
            fallback_dir: "/nonexistent/wrapkit/fallback".to_string(),
            search_home: true,
        }
    }

    #[test]
    fn test_finds_manifest_in_ancestor() {
        let temp = TempDir::new().unwrap();
        let project = temp.path().join("Wrapkit");
        let exe_dir = project.join("bin").join("Release").join("net8.0");
        std::fs::create_dir_all(&exe_dir).unwrap();
        std::fs::write(project.join("Wrapkit.csproj"), "<Version>1.0.0</Version>").unwrap();

        let found = locate_project_dir(&config(None), &exe_dir, temp.path()).unwrap();
        assert_eq!(found, project);
    }

    #[test]
    fn test_configured_dir_wins() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("Wrapkit.csproj"), "").unwrap();

        let found =
            locate_project_dir(&config(Some(temp.path())), Path::new("/"), temp.path()).unwrap();
        assert_eq!(found, temp.path());
    }

    #[test]
    fn test_configured_dir_without_manifest_fails() {
        let temp = TempDir::new().unwrap();
        let err =
            locate_project_dir(&config(Some(temp.path())), Path::new("/"), temp.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<WrapkitError>(),
            Some(WrapkitError::ProjectNotFound { .. })
        ));
    }

    #[test]
    fn test_home_search_skips_hidden_dirs() {
        let home = TempDir::new().unwrap();
        let hidden = home.path().join(".cache").join("Wrapkit");
        std::fs::create_dir_all(&hidden).unwrap();
        std::fs::write(hidden.join("Wrapkit.csproj"), "").unwrap();

        let exe_dir = TempDir::new().unwrap();
        let err = locate_project_dir(&config(None), exe_dir.path(), home.path()).unwrap_err();
        assert!(err.to_string().contains("Wrapkit.csproj"));

        let visible = home.path().join("source").join("Wrapkit");
        std::fs::create_dir_all(&visible).unwrap();
        std::fs::write(visible.join("Wrapkit.csproj"), "").unwrap();

        let found = locate_project_dir(&config(None), exe_dir.path(), home.path()).unwrap();
        assert_eq!(found, visible);
    }
}
