//! File system helpers.
//!
//! - [`atomic_write`] writes through a sibling temp file followed by a rename, so
//!   the manifest and the shell startup file are never observed half-written
//! - [`find_latest_file`] locates the most recently modified file matching a glob
//!   pattern, which is how package artifacts are discovered after a pack step and
//!   inside the installed tool store

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;
use walkdir::WalkDir;

/// Create a directory and all of its parents if missing.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Write `content` to `path` atomically.
///
/// Parent directories are created as needed. When the target already exists its
/// permissions are carried over to the replacement on Unix.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    use std::io::Write;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        ensure_dir(parent)?;
    }

    let file_name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    let temp_path = path.with_file_name(format!(".{file_name}.{}.tmp", uuid::Uuid::new_v4().simple()));

    {
        let mut file = fs::File::create(&temp_path)
            .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

        file.write_all(content)
            .with_context(|| format!("Failed to write to temp file: {}", temp_path.display()))?;

        file.sync_all().with_context(|| "Failed to sync file to disk")?;
    }

    #[cfg(unix)]
    if let Ok(metadata) = fs::metadata(path) {
        let _ = fs::set_permissions(&temp_path, metadata.permissions());
    }

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e).with_context(|| format!("Failed to rename temp file to: {}", path.display()));
    }

    Ok(())
}

/// Find the most recently modified file under `dir` whose file name matches `pattern`.
///
/// With `recursive == false` only direct children are considered. Unreadable
/// entries (permission errors and the like) are skipped. Returns `Ok(None)` when
/// `dir` does not exist or nothing matches.
pub fn find_latest_file(dir: &Path, pattern: &str, recursive: bool) -> Result<Option<PathBuf>> {
    let matcher = glob::Pattern::new(pattern)
        .with_context(|| format!("Invalid file pattern: {pattern}"))?;

    if !dir.is_dir() {
        debug!("Search directory does not exist: {}", dir.display());
        return Ok(None);
    }

    let walker = if recursive {
        WalkDir::new(dir)
    } else {
        WalkDir::new(dir).max_depth(1)
    };

    let mut newest: Option<(SystemTime, PathBuf)> = None;
    for entry in walker.into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        if !matcher.matches(&entry.file_name().to_string_lossy()) {
            continue;
        }
        let Some(modified) = entry.metadata().ok().and_then(|m| m.modified().ok()) else {
            continue;
        };
        match &newest {
            Some((best, _)) if *best >= modified => {}
            _ => newest = Some((modified, entry.into_path())),
        }
    }

    Ok(newest.map(|(_, path)| path))
}

/// Remove a file, treating "not found" as success.
pub async fn remove_file_if_exists(path: &Path) -> Result<bool> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).with_context(|| format!("Failed to remove file: {}", path.display())),
    }
}

/// Remove a directory tree, treating "not found" as success.
pub async fn remove_dir_if_exists(path: &Path) -> Result<bool> {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).with_context(|| format!("Failed to remove directory: {}", path.display())),
    }
}
