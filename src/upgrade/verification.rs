use anyhow::Result;
use sha2::{Digest, Sha256};
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants::HASH_BUFFER_SIZE;
use crate::core::WrapkitError;

/// Hex-encoded SHA-256 digest of a package artifact.
///
/// Two fingerprints are equal exactly when the hashed files have identical
/// bytes (up to SHA-256 collisions), which is what change detection relies on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix for log lines.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Computes content fingerprints of built and installed packages.
///
/// The whole file is streamed through SHA-256; a read error anywhere aborts the
/// computation so a partially hashed file is never reported as a fingerprint.
pub struct ArtifactHasher;

impl ArtifactHasher {
    /// Fingerprint the full content of `path`.
    ///
    /// ```rust,no_run
    /// use wrapkit_cli::upgrade::verification::ArtifactHasher;
    /// use std::path::Path;
    ///
    /// # async fn example() -> anyhow::Result<()> {
    /// let fp = ArtifactHasher::compute(Path::new("bin/Release/nupkg/Wrapkit.1.2.3.nupkg")).await?;
    /// println!("{fp}");
    /// # Ok(())
    /// # }
    /// ```
    pub async fn compute(path: &Path) -> Result<Fingerprint> {
        let owned = path.to_path_buf();
        let fingerprint = tokio::task::spawn_blocking(move || Self::compute_blocking(&owned))
            .await
            .map_err(|e| WrapkitError::Other {
                message: format!("Hashing task failed: {e}"),
            })??;
        debug!("Fingerprint of {}: {}", path.display(), fingerprint.short());
        Ok(fingerprint)
    }

    /// Synchronous variant of [`ArtifactHasher::compute`].
    pub fn compute_blocking(path: &Path) -> Result<Fingerprint> {
        let io_error = |e: std::io::Error, path: &PathBuf| WrapkitError::FileSystemError {
            operation: format!("hash artifact: {e}"),
            path: path.display().to_string(),
        };
        let path = path.to_path_buf();

        let mut file = std::fs::File::open(&path).map_err(|e| io_error(e, &path))?;
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; HASH_BUFFER_SIZE];

        loop {
            let read = file.read(&mut buffer).map_err(|e| io_error(e, &path))?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
        }

        Ok(Fingerprint(hex::encode(hasher.finalize())))
    }
}
