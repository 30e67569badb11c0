//! Test utilities for Wrapkit
//!
//! Helpers shared by unit tests and the integration suite: one-time logging
//! setup and fixtures that lay out a project, an installed tool store and a
//! config file inside a temporary directory.
//!
//! # Example
//!
//! ```rust,no_run
//! use wrapkit_cli::test_utils::{ProjectFixture, init_test_logging};
//!
//! init_test_logging(None);
//! let fixture = ProjectFixture::new("1.2.3").unwrap();
//! assert!(fixture.manifest_path().exists());
//! ```

pub mod fixtures;

pub use fixtures::{ManifestFixture, ProjectFixture};

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. With `level == None` logging stays off
/// unless `RUST_LOG` is set.
///
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}
