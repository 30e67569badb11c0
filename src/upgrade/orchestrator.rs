//! The update state machine.
//!
//! ```text
//! Idle -> HashingInstalled -> BuildingProbe -> ComparingHashes -> UpToDate
//!                                                      |
//!                                                      v
//!                          Bumping -> BuildingRelease -> Committed -> HandoffDispatched
//! ```
//!
//! Any failing step ends in `Aborted`. A version written during the attempt is
//! restored byte-for-byte before the error is returned.

use anyhow::Result;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::backup::ManifestSnapshot;
use super::change_detector::ChangeDetector;
use super::handoff::{HandoffDispatcher, HandoffRequest};
use super::pipeline::Toolchain;
use super::verification::Fingerprint;
use crate::core::WrapkitError;
use crate::manifest::ProjectManifest;
use crate::version::{BumpKind, SemanticVersion};

/// What the caller asked for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    pub bump: BumpKind,
    /// Skip change detection and always release.
    pub force: bool,
    /// Republish the current version without bumping. Requires `force`.
    pub skip_version: bool,
}

impl UpdateOptions {
    pub fn validate(&self) -> Result<(), WrapkitError> {
        if self.skip_version && !self.force {
            return Err(WrapkitError::InvalidArguments {
                message: "skipping the version bump is only allowed together with a forced update"
                    .to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateState {
    Idle,
    HashingInstalled,
    BuildingProbe,
    ComparingHashes,
    UpToDate,
    Bumping,
    BuildingRelease,
    Committed,
    HandoffDispatched,
    Aborted(String),
}

impl fmt::Display for UpdateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::HashingInstalled => write!(f, "hashing installed package"),
            Self::BuildingProbe => write!(f, "building probe package"),
            Self::ComparingHashes => write!(f, "comparing fingerprints"),
            Self::UpToDate => write!(f, "up to date"),
            Self::Bumping => write!(f, "bumping version"),
            Self::BuildingRelease => write!(f, "building release package"),
            Self::Committed => write!(f, "committed"),
            Self::HandoffDispatched => write!(f, "handoff dispatched"),
            Self::Aborted(reason) => write!(f, "aborted: {reason}"),
        }
    }
}

/// Values gathered during one orchestration run. Never persisted.
#[derive(Debug, Clone)]
pub struct UpdateAttempt {
    pub old_version: SemanticVersion,
    pub new_version: Option<SemanticVersion>,
    pub installed_fingerprint: Option<Fingerprint>,
    pub candidate_fingerprint: Option<Fingerprint>,
    pub committed: bool,
}

impl UpdateAttempt {
    const fn new(old_version: SemanticVersion) -> Self {
        Self {
            old_version,
            new_version: None,
            installed_fingerprint: None,
            candidate_fingerprint: None,
            committed: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The freshly built package matched the installed one; nothing changed.
    UpToDate,
    /// The successor was started with this request; the caller must exit.
    Dispatched(HandoffRequest),
}

/// Drives one update attempt against a project.
pub struct UpdateOrchestrator<T, D> {
    toolchain: T,
    dispatcher: D,
    project_dir: PathBuf,
    manifest_path: PathBuf,
    pid: u32,
    state: UpdateState,
}

impl<T: Toolchain, D: HandoffDispatcher> UpdateOrchestrator<T, D> {
    pub fn new(toolchain: T, dispatcher: D, project_dir: &Path, manifest_name: &str) -> Self {
        Self {
            toolchain,
            dispatcher,
            project_dir: project_dir.to_path_buf(),
            manifest_path: project_dir.join(manifest_name),
            pid: std::process::id(),
            state: UpdateState::Idle,
        }
    }

    /// Process the successor waits on. Defaults to the current process.
    #[must_use]
    pub const fn with_pid(mut self, pid: u32) -> Self {
        self.pid = pid;
        self
    }

    pub fn state(&self) -> &UpdateState {
        &self.state
    }

    pub fn toolchain(&self) -> &T {
        &self.toolchain
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    fn transition(&mut self, next: UpdateState) {
        debug!("Update state: {} -> {}", self.state, next);
        self.state = next;
    }

    pub async fn run(&mut self, options: UpdateOptions) -> Result<UpdateOutcome> {
        options.validate()?;
        self.state = UpdateState::Idle;

        match self.run_attempt(options).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                self.transition(UpdateState::Aborted(format!("{e:#}")));
                Err(e)
            }
        }
    }

    async fn run_attempt(&mut self, options: UpdateOptions) -> Result<UpdateOutcome> {
        let mut manifest = ProjectManifest::load(&self.manifest_path).await?;
        let old_text = manifest.version_text()?.to_string();
        let mut attempt = UpdateAttempt::new(manifest.version()?);
        info!("Current version: {}", attempt.old_version);

        if options.force {
            info!("Forced update, skipping change detection");
        } else {
            self.transition(UpdateState::HashingInstalled);
            let installed = self.toolchain.installed_artifact().await?;
            attempt.installed_fingerprint = Some(installed.fingerprint.clone());

            self.transition(UpdateState::BuildingProbe);
            let probe = self.toolchain.build_and_pack(&self.project_dir).await?;
            attempt.candidate_fingerprint = Some(probe.fingerprint.clone());

            self.transition(UpdateState::ComparingHashes);
            let changed = ChangeDetector::should_update(&installed.fingerprint, &probe.fingerprint);
            probe.discard().await?;

            if !changed {
                self.transition(UpdateState::UpToDate);
                debug!("{attempt:?}");
                return Ok(UpdateOutcome::UpToDate);
            }
        }

        let snapshot = if options.skip_version {
            info!("Keeping version {}", attempt.old_version);
            None
        } else {
            self.transition(UpdateState::Bumping);
            let snapshot = ManifestSnapshot::capture(&self.manifest_path).await?;
            let next = attempt.old_version.bump(options.bump)?;
            manifest.write_version(&next)?;
            info!("Version bumped {} -> {} ({})", attempt.old_version, next, options.bump);
            attempt.new_version = Some(next);
            Some(snapshot)
        };

        self.transition(UpdateState::BuildingRelease);
        let release = match self.toolchain.build_and_pack(&self.project_dir).await {
            Ok(artifact) => artifact,
            Err(e) => return Err(Self::undo_bump(snapshot.as_ref(), e).await),
        };

        attempt.committed = true;
        self.transition(UpdateState::Committed);

        let new_text = attempt
            .new_version
            .as_ref()
            .map_or_else(|| old_text.clone(), ToString::to_string);
        let request = HandoffRequest {
            pid: self.pid,
            package_dir: release.directory.clone(),
            manifest_path: self.manifest_path.clone(),
            old_version: old_text,
            new_version: new_text,
            rollback_on_failure: snapshot.is_some(),
            successor_exe: None,
        };

        if let Err(e) = self.dispatcher.dispatch(&request).await {
            return Err(Self::undo_bump(snapshot.as_ref(), e).await);
        }
        self.transition(UpdateState::HandoffDispatched);
        debug!("{attempt:?}");

        Ok(UpdateOutcome::Dispatched(request))
    }

    /// Restore the manifest after a failure, keeping `cause` as the reported error.
    async fn undo_bump(snapshot: Option<&ManifestSnapshot>, cause: anyhow::Error) -> anyhow::Error {
        let Some(snapshot) = snapshot else {
            return cause;
        };
        warn!("Update failed after version bump, restoring {}", snapshot.path().display());
        match snapshot.restore().await {
            Ok(()) => cause,
            Err(restore_err) => restore_err.context(format!(
                "{cause:#}; the manifest could not be restored and still carries the bumped version"
            )),
        }
    }
}
