//! Project manifest access.
//!
//! The manifest is the project file of the tool being released (an MSBuild
//! project by default). Its single `<Version>X.Y.Z</Version>` element is the only
//! state that survives between update runs, so this module is deliberately
//! narrow: it reads that element, rewrites it, and performs the verbatim
//! textual rollback used by the handoff successor. Everything else in the file
//! is carried through untouched.

pub mod discovery;

use anyhow::{Context, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

use crate::core::WrapkitError;
use crate::utils::fs::atomic_write;
use crate::version::SemanticVersion;

static VERSION_ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<Version>(.*?)</Version>").expect("version element regex is valid")
});

/// In-memory view of the manifest file.
#[derive(Debug, Clone)]
pub struct ProjectManifest {
    path: PathBuf,
    content: String,
}

impl ProjectManifest {
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            anyhow::Error::from(WrapkitError::FileSystemError {
                operation: format!("read manifest: {e}"),
                path: path.display().to_string(),
            })
        })?;
        Ok(Self::from_content(path.to_path_buf(), content))
    }

    #[must_use]
    pub const fn from_content(path: PathBuf, content: String) -> Self {
        Self {
            path,
            content,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Raw text of the single `<Version>` element, exactly as written.
    pub fn version_text(&self) -> Result<&str, WrapkitError> {
        let file = self.path.display().to_string();
        let mut matches = VERSION_ELEMENT.captures_iter(&self.content);

        let first = matches.next().ok_or_else(|| WrapkitError::ManifestVersionMissing {
            file: file.clone(),
        })?;
        let extra = matches.count();
        if extra > 0 {
            return Err(WrapkitError::ManifestVersionAmbiguous {
                file,
                count: extra + 1,
            });
        }

        Ok(first.get(1).map_or("", |m| m.as_str()))
    }

    /// Parsed version. Malformed text is a fatal format error.
    pub fn version(&self) -> Result<SemanticVersion, WrapkitError> {
        SemanticVersion::parse(self.version_text()?)
    }

    /// Manifest content with the version element's text replaced.
    pub fn with_version(&self, version: &SemanticVersion) -> Result<String, WrapkitError> {
        self.version_text()?;
        let replacement = format!("<Version>{version}</Version>");
        Ok(VERSION_ELEMENT.replace(&self.content, regex::NoExpand(&replacement)).into_owned())
    }

    /// Persist a new version and keep the in-memory copy in sync.
    pub fn write_version(&mut self, version: &SemanticVersion) -> Result<()> {
        let updated = self.with_version(version)?;
        atomic_write(&self.path, updated.as_bytes())
            .with_context(|| format!("Failed to write manifest {}", self.path.display()))?;
        debug!("Wrote version {} to {}", version, self.path.display());
        self.content = updated;
        Ok(())
    }
}

/// Replace `<Version>old</Version>` with `<Version>new</Version>` verbatim.
///
/// Returns `None` when the old element does not occur, which means there is
/// nothing to roll back.
#[must_use]
pub fn replace_version_text(content: &str, old: &str, new: &str) -> Option<String> {
    let from = format!("<Version>{old}</Version>");
    if !content.contains(&from) {
        return None;
    }
    Some(content.replace(&from, &format!("<Version>{new}</Version>")))
}

/// Rewrite the manifest on disk from `current` back to `previous`.
///
/// Returns whether the file was changed.
pub async fn restore_version_text(path: &Path, current: &str, previous: &str) -> Result<bool> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read manifest {}", path.display()))?;

    match replace_version_text(&content, current, previous) {
        Some(restored) => {
            atomic_write(path, restored.as_bytes())?;
            Ok(true)
        }
        None => Ok(false),
    }
}
