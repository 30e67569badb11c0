use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::utils::fs::atomic_write;

/// Byte-exact copy of the manifest taken before an update attempt mutates it.
///
/// The orchestrator captures a snapshot before writing the bumped version and
/// restores it if the release build fails, so the file ends up identical to
/// its pre-attempt content rather than re-rendered from a parsed version.
///
/// # Examples
///
/// ```rust,no_run
/// use wrapkit_cli::upgrade::backup::ManifestSnapshot;
/// use std::path::Path;
///
/// # async fn example() -> anyhow::Result<()> {
/// let snapshot = ManifestSnapshot::capture(Path::new("Wrapkit.csproj")).await?;
///
/// // ... bump the version, build ...
/// let build_failed = true;
/// if build_failed {
///     snapshot.restore().await?;
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ManifestSnapshot {
    path: PathBuf,
    content: Vec<u8>,
}

impl ManifestSnapshot {
    /// Read the manifest's current bytes.
    pub async fn capture(path: &Path) -> Result<Self> {
        let content = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to snapshot manifest {}", path.display()))?;
        debug!("Captured {} bytes of {}", content.len(), path.display());

        Ok(Self {
            path: path.to_path_buf(),
            content,
        })
    }

    /// Write the captured bytes back over the manifest.
    pub async fn restore(&self) -> Result<()> {
        atomic_write(&self.path, &self.content)
            .with_context(|| format!("Failed to restore manifest {}", self.path.display()))?;
        info!("Restored manifest {}", self.path.display());
        Ok(())
    }

    /// Whether the file on disk still matches the snapshot.
    pub async fn matches_disk(&self) -> Result<bool> {
        let current = tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("Failed to read manifest {}", self.path.display()))?;
        Ok(current == self.content)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
