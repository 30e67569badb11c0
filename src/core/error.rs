//! Error handling for Wrapkit
//!
//! Two layers, as in the rest of the CLI:
//! 1. [`WrapkitError`] - strongly-typed failures raised by the update lifecycle,
//!    the manifest layer and shell integration
//! 2. [`ErrorContext`] - a display wrapper that adds details and an actionable
//!    suggestion for the terminal
//!
//! Library code returns `anyhow::Result` and attaches `WrapkitError` values where
//! the caller (or [`user_friendly_error`]) needs to distinguish the failure.
//!
//! # Error Categories
//!
//! - **Version format**: [`WrapkitError::InvalidVersion`], [`WrapkitError::ManifestVersionMissing`],
//!   [`WrapkitError::ManifestVersionAmbiguous`]
//! - **File system**: [`WrapkitError::FileSystemError`]
//! - **Build**: [`WrapkitError::BuildFailed`], [`WrapkitError::ArtifactNotFound`]
//! - **Preconditions**: [`WrapkitError::NoInstalledPackage`], [`WrapkitError::ProjectNotFound`]
//! - **Handoff**: [`WrapkitError::HandoffFailed`], [`WrapkitError::ProcessSpawnFailed`]
//!
//! # Examples
//!
//! ```rust,no_run
//! use wrapkit_cli::core::{WrapkitError, user_friendly_error};
//!
//! let err = anyhow::Error::from(WrapkitError::NoInstalledPackage {
//!     searched: "~/.dotnet/tools".to_string(),
//! });
//! user_friendly_error(err).display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for Wrapkit operations.
#[derive(Error, Debug, Clone)]
pub enum WrapkitError {
    /// A version string did not parse into exactly three numeric components.
    #[error("Invalid version format: '{version}'")]
    InvalidVersion {
        /// The offending text
        version: String,
        /// Parser explanation
        reason: String,
    },

    /// The manifest contains no `<Version>` element.
    #[error("No <Version> element found in manifest {file}")]
    ManifestVersionMissing {
        /// Manifest path
        file: String,
    },

    /// The manifest contains more than one `<Version>` element.
    #[error("Manifest {file} contains {count} <Version> elements, expected exactly one")]
    ManifestVersionAmbiguous {
        /// Manifest path
        file: String,
        /// Number of elements found
        count: usize,
    },

    /// A file or directory could not be read or written.
    #[error("File system error: {operation}")]
    FileSystemError {
        /// What was being attempted
        operation: String,
        /// Path involved
        path: String,
    },

    /// A build toolchain subcommand exited unsuccessfully.
    #[error("Build step '{step}' failed with exit code {code}")]
    BuildFailed {
        /// Subcommand that failed (`build`, `pack`)
        step: String,
        /// Exit code, `-1` when terminated by a signal
        code: i32,
    },

    /// The pack step succeeded but no artifact appeared.
    #[error("No package artifact matching '{pattern}' found in {directory}")]
    ArtifactNotFound {
        /// Directory that was searched
        directory: String,
        /// File name pattern
        pattern: String,
    },

    /// There is no installed package to compare against.
    #[error("No installed package found under {searched}")]
    NoInstalledPackage {
        /// Root that was searched
        searched: String,
    },

    /// The project directory holding the manifest could not be located.
    #[error("Could not locate project manifest '{manifest}'")]
    ProjectNotFound {
        /// Manifest file name
        manifest: String,
    },

    /// The detached successor could not complete the installation.
    #[error("Handoff failed: {reason}")]
    HandoffFailed {
        /// Why installation did not complete
        reason: String,
    },

    /// A child process could not be started.
    #[error("Failed to start process '{program}'")]
    ProcessSpawnFailed {
        /// Program name
        program: String,
        /// Underlying error text
        reason: String,
    },

    /// Shell startup file could not be resolved or updated.
    #[error("Shell integration failed: {reason}")]
    ShellIntegrationFailed {
        /// What went wrong
        reason: String,
    },

    /// Configuration file could not be parsed.
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Parser message
        message: String,
    },

    /// Conflicting or incomplete command-line options.
    #[error("Invalid arguments: {message}")]
    InvalidArguments {
        /// Explanation
        message: String,
    },

    /// Anything else
    #[error("{message}")]
    Other {
        /// Generic error message
        message: String,
    },
}

/// Error wrapper carrying a user-facing suggestion and extra details.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: WrapkitError,
    /// Optional actionable hint
    pub suggestion: Option<String>,
    /// Optional longer explanation
    pub details: Option<String>,
}

impl ErrorContext {
    #[must_use]
    pub const fn new(error: WrapkitError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr with terminal colours.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] suitable for the terminal.
///
/// The full `anyhow` chain is preserved in the details so the step that failed
/// (and any rollback notes attached as context) stays visible.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    // Context layers hide the typed error from downcast_ref on the outer error
    for cause in error.chain() {
        if let Some(wrapkit_error) = cause.downcast_ref::<WrapkitError>() {
            let ctx = create_error_context(wrapkit_error.clone());
            return attach_chain(ctx, &error);
        }
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(WrapkitError::FileSystemError {
                    operation: "file access".to_string(),
                    path: "unknown".to_string(),
                })
                .with_suggestion("Check file ownership and permissions")
                .with_details(io_error.to_string());
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(WrapkitError::FileSystemError {
                    operation: "file access".to_string(),
                    path: "unknown".to_string(),
                })
                .with_suggestion("Check that the file or directory exists and the path is correct")
                .with_details(io_error.to_string());
            }
            _ => {}
        }
    }

    ErrorContext::new(WrapkitError::Other {
        message: error.to_string(),
    })
    .with_details(format_chain(&error))
}

fn attach_chain(ctx: ErrorContext, error: &anyhow::Error) -> ErrorContext {
    if error.chain().count() > 1 {
        let chain = format_chain(error);
        match ctx.details {
            Some(ref existing) => {
                let combined = format!("{existing}\n{chain}");
                ctx.with_details(combined)
            }
            None => ctx.with_details(chain),
        }
    } else {
        ctx
    }
}

fn format_chain(error: &anyhow::Error) -> String {
    error.chain().map(ToString::to_string).collect::<Vec<_>>().join("\n  caused by: ")
}

fn create_error_context(error: WrapkitError) -> ErrorContext {
    match &error {
        WrapkitError::InvalidVersion {
            reason,
            ..
        } => ErrorContext::new(error.clone())
            .with_suggestion("Versions must have exactly three numeric parts, e.g. 1.2.3")
            .with_details(reason.clone()),
        WrapkitError::ManifestVersionMissing {
            ..
        }
        | WrapkitError::ManifestVersionAmbiguous {
            ..
        } => ErrorContext::new(error.clone())
            .with_suggestion("Keep exactly one <Version>X.Y.Z</Version> element in the project file"),
        WrapkitError::BuildFailed {
            ..
        } => ErrorContext::new(error.clone())
            .with_suggestion("Run the build manually in the project directory to see the full output")
            .with_details("Any version bump made for this attempt has been rolled back"),
        WrapkitError::ArtifactNotFound {
            ..
        } => ErrorContext::new(error.clone()).with_suggestion(
            "Check [toolchain] artifact_dir and artifact_pattern in ~/.wrapkit/config.toml",
        ),
        WrapkitError::NoInstalledPackage {
            ..
        } => ErrorContext::new(error.clone())
            .with_suggestion("Install the tool once manually, or use --forceUpdate")
            .with_details("Updates only replace an existing installation"),
        WrapkitError::ProjectNotFound {
            ..
        } => ErrorContext::new(error.clone())
            .with_suggestion("Set [project] project_dir in ~/.wrapkit/config.toml"),
        WrapkitError::HandoffFailed {
            ..
        } => ErrorContext::new(error.clone())
            .with_details("The previously installed version is still in place"),
        WrapkitError::ConfigError {
            ..
        } => ErrorContext::new(error.clone())
            .with_suggestion("Fix the syntax in the configuration file or remove it to use defaults"),
        _ => ErrorContext::new(error.clone()),
    }
}
