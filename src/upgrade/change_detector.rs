//! Update decision based on artifact content.

use tracing::debug;

use super::verification::Fingerprint;

/// Decides whether a freshly built package differs from the installed one.
///
/// Timestamps are never consulted. A cloned checkout, clock skew or a re-pack
/// of unchanged sources produces a new file with the same bytes, and only the
/// content fingerprint tells those apart from a real change.
pub struct ChangeDetector;

impl ChangeDetector {
    #[must_use]
    pub fn should_update(installed: &Fingerprint, candidate: &Fingerprint) -> bool {
        let changed = installed != candidate;
        debug!(
            "Installed {} vs candidate {}: {}",
            installed.short(),
            candidate.short(),
            if changed { "changed" } else { "identical" }
        );
        changed
    }
}
