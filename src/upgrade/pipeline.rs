//! Build and pack through the external toolchain.
//!
//! The pipeline runs two toolchain steps (build, then pack) in the project
//! directory and picks the newest package from the configured output
//! directory. Output of both steps is forwarded to the console as it arrives;
//! only exit codes decide success.

use anyhow::Result;
use chrono::{DateTime, Local};
use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::verification::{ArtifactHasher, Fingerprint};
use crate::config::{InstallConfig, ToolchainConfig};
use crate::core::WrapkitError;
use crate::utils::fs::{find_latest_file, remove_file_if_exists};
use crate::utils::process::ToolCommand;

/// A packaged, installable build output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageArtifact {
    pub path: PathBuf,
    pub fingerprint: Fingerprint,
    pub modified: DateTime<Local>,
    pub directory: PathBuf,
}

impl PackageArtifact {
    /// Describe an existing package file, hashing its content.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let metadata = tokio::fs::metadata(path).await.map_err(|e| {
            anyhow::Error::from(WrapkitError::FileSystemError {
                operation: format!("stat artifact: {e}"),
                path: path.display().to_string(),
            })
        })?;
        let modified = metadata.modified().map(DateTime::<Local>::from).unwrap_or_else(|_| Local::now());
        let fingerprint = ArtifactHasher::compute(path).await?;

        Ok(Self {
            path: path.to_path_buf(),
            fingerprint,
            modified,
            directory: path.parent().map(Path::to_path_buf).unwrap_or_default(),
        })
    }

    /// Delete the package file. Missing files are not an error.
    pub async fn discard(&self) -> Result<()> {
        if remove_file_if_exists(&self.path).await? {
            debug!("Deleted artifact {}", self.path.display());
        }
        Ok(())
    }
}

/// The external build toolchain as seen by the orchestrator.
pub trait Toolchain {
    /// Build and pack the project in `project_dir`, returning the new package.
    fn build_and_pack(&self, project_dir: &Path) -> impl Future<Output = Result<PackageArtifact>>;

    /// The package the currently installed tool was installed from.
    fn installed_artifact(&self) -> impl Future<Output = Result<PackageArtifact>>;
}

/// [`Toolchain`] backed by real subprocesses.
#[derive(Debug, Clone)]
pub struct BuildPackPipeline {
    toolchain: ToolchainConfig,
    install: InstallConfig,
    forward_output: bool,
}

impl BuildPackPipeline {
    #[must_use]
    pub const fn new(toolchain: ToolchainConfig, install: InstallConfig) -> Self {
        Self {
            toolchain,
            install,
            forward_output: true,
        }
    }

    /// Send toolchain output to the debug log instead of the console.
    #[must_use]
    pub const fn quiet(mut self) -> Self {
        self.forward_output = false;
        self
    }

    /// Directory the pack step writes packages into.
    pub fn artifact_dir(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.toolchain.artifact_dir)
    }

    async fn run_step(&self, step: &str, args: &[String], project_dir: &Path) -> Result<()> {
        info!("Running {} step in {}", step, project_dir.display());

        let mut command = ToolCommand::new(&self.toolchain.program)
            .args(args.iter().cloned())
            .current_dir(project_dir)
            .with_timeout(self.toolchain.step_timeout())
            .with_context(step);
        if !self.forward_output {
            command = command.quiet();
        }

        let output = command.execute().await?;
        if !output.success() {
            return Err(WrapkitError::BuildFailed {
                step: step.to_string(),
                code: output.code_or_signal(),
            }
            .into());
        }
        Ok(())
    }
}

impl Toolchain for BuildPackPipeline {
    async fn build_and_pack(&self, project_dir: &Path) -> Result<PackageArtifact> {
        self.run_step("build", &self.toolchain.build_args, project_dir).await?;
        self.run_step("pack", &self.toolchain.pack_args, project_dir).await?;

        let dir = self.artifact_dir(project_dir);
        let path = find_latest_file(&dir, &self.toolchain.artifact_pattern, false)?.ok_or_else(
            || WrapkitError::ArtifactNotFound {
                directory: dir.display().to_string(),
                pattern: self.toolchain.artifact_pattern.clone(),
            },
        )?;

        info!("Packed {}", path.display());
        PackageArtifact::from_path(&path).await
    }

    async fn installed_artifact(&self) -> Result<PackageArtifact> {
        let root = self.install.installed_root_path()?;
        let path = find_latest_file(&root, &self.install.installed_pattern, true)?.ok_or_else(
            || WrapkitError::NoInstalledPackage {
                searched: format!("{}/**/{}", root.display(), self.install.installed_pattern),
            },
        )?;

        debug!("Installed package: {}", path.display());
        PackageArtifact::from_path(&path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sh_toolchain(build: &str, pack: &str) -> ToolchainConfig {
        ToolchainConfig {
            program: "sh".to_string(),
            build_args: vec!["-c".to_string(), build.to_string()],
            pack_args: vec!["-c".to_string(), pack.to_string()],
            artifact_dir: "out".to_string(),
            artifact_pattern: "*.nupkg".to_string(),
            step_timeout_secs: 30,
        }
    }

    fn install_config(root: &Path) -> InstallConfig {
        InstallConfig {
            installed_root: root.display().to_string(),
            ..InstallConfig::default()
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_build_and_pack_locates_artifact() {
        let project = TempDir::new().unwrap();
        let pipeline = BuildPackPipeline::new(
            sh_toolchain("true", "mkdir -p out && printf pkg > out/Wrapkit.1.0.0.nupkg"),
            install_config(project.path()),
        )
        .quiet();

        let artifact = pipeline.build_and_pack(project.path()).await.unwrap();
        assert_eq!(artifact.path, project.path().join("out").join("Wrapkit.1.0.0.nupkg"));
        assert_eq!(artifact.directory, project.path().join("out"));
        assert_eq!(
            artifact.fingerprint,
            ArtifactHasher::compute(&artifact.path).await.unwrap()
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_build_failure_reports_step_and_code() {
        let project = TempDir::new().unwrap();
        let pipeline = BuildPackPipeline::new(
            sh_toolchain("echo broken 1>&2; exit 4", "true"),
            install_config(project.path()),
        )
        .quiet();

        let err = pipeline.build_and_pack(project.path()).await.unwrap_err();
        match err.downcast_ref::<WrapkitError>() {
            Some(WrapkitError::BuildFailed { step, code }) => {
                assert_eq!(step, "build");
                assert_eq!(*code, 4);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_pack_without_output_is_artifact_not_found() {
        let project = TempDir::new().unwrap();
        let pipeline =
            BuildPackPipeline::new(sh_toolchain("true", "mkdir -p out"), install_config(project.path()))
                .quiet();

        let err = pipeline.build_and_pack(project.path()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<WrapkitError>(),
            Some(WrapkitError::ArtifactNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_installed_artifact_searches_recursively() {
        let root = TempDir::new().unwrap();
        let store = root.path().join(".store").join("wrapkit").join("1.2.3");
        std::fs::create_dir_all(&store).unwrap();
        std::fs::write(store.join("Wrapkit.1.2.3.nupkg"), b"installed").unwrap();

        let pipeline =
            BuildPackPipeline::new(ToolchainConfig::default(), install_config(root.path()));
        let artifact = pipeline.installed_artifact().await.unwrap();
        assert_eq!(artifact.path, store.join("Wrapkit.1.2.3.nupkg"));
    }

    #[tokio::test]
    async fn test_missing_installed_package() {
        let root = TempDir::new().unwrap();
        let pipeline =
            BuildPackPipeline::new(ToolchainConfig::default(), install_config(root.path()));

        let err = pipeline.installed_artifact().await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<WrapkitError>(),
            Some(WrapkitError::NoInstalledPackage { .. })
        ));
    }

    #[tokio::test]
    async fn test_discard_removes_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("probe.nupkg");
        std::fs::write(&path, b"probe").unwrap();

        let artifact = PackageArtifact::from_path(&path).await.unwrap();
        artifact.discard().await.unwrap();
        assert!(!path.exists());

        // Already gone is fine
        artifact.discard().await.unwrap();
    }
}
