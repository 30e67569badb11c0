//! Self-update lifecycle for Wrapkit.
//!
//! Wrapkit rebuilds and reinstalls itself from its own project sources. An
//! update only happens when the freshly packed artifact differs in content
//! from the installed one, and the version in the project manifest only moves
//! when a release is actually produced.
//!
//! # Components
//!
//! - **[`verification::ArtifactHasher`]**: SHA-256 fingerprint of a package file
//! - **[`change_detector::ChangeDetector`]**: fingerprint comparison
//! - **[`pipeline::BuildPackPipeline`]**: build + pack through the external toolchain
//! - **[`backup::ManifestSnapshot`]**: byte-exact manifest copy for rollback
//! - **[`orchestrator::UpdateOrchestrator`]**: the state machine tying these together
//! - **[`handoff::HandoffCoordinator`]**: detached successor that installs the package
//!
//! # Update Process Flow
//!
//! ```text
//! 1. Change detection (skipped with --forceUpdate)
//!    ├── Fingerprint the installed package
//!    ├── Build + pack a probe package and fingerprint it
//!    └── Identical -> delete probe, stop (version untouched)
//!
//! 2. Release (version bump skipped with --skipVersion)
//!    ├── Snapshot manifest, write bumped <Version>
//!    ├── Build + pack release package
//!    └── Build failure -> restore snapshot, report error
//!
//! 3. Handoff
//!    ├── Spawn detached successor (temporary copy of this executable)
//!    ├── This process exits
//!    └── Successor waits for our PID, installs, rolls back on failure
//! ```

pub mod backup;
pub mod change_detector;
pub mod handoff;
pub mod orchestrator;
pub mod pipeline;
pub mod verification;


pub use change_detector::ChangeDetector;
pub use handoff::{HandoffCoordinator, HandoffDispatcher, HandoffRequest, run_successor};
pub use orchestrator::{UpdateAttempt, UpdateOptions, UpdateOrchestrator, UpdateOutcome, UpdateState};
pub use pipeline::{BuildPackPipeline, PackageArtifact, Toolchain};
pub use verification::{ArtifactHasher, Fingerprint};
