//! Global constants used throughout the Wrapkit codebase.
//!
//! Timeouts, polling intervals, environment variable names and the markers
//! that delimit the managed shell block live here so they are discoverable
//! in one place.

use std::time::Duration;

/// Interval between liveness checks while the successor waits for the
/// original process to exit (250ms).
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 250;

/// Upper bound for a single poll interval, regardless of configuration.
pub const MAX_POLL_INTERVAL_MS: u64 = 5_000;

/// How long the successor waits for the original process before giving up (10 minutes).
pub const DEFAULT_WAIT_TIMEOUT_SECS: u64 = 600;

/// Timeout for querying a shell for its startup file path.
pub const SHELL_QUERY_TIMEOUT: Duration = Duration::from_secs(20);

/// Read buffer size used when fingerprinting artifacts.
pub const HASH_BUFFER_SIZE: usize = 64 * 1024;

/// Environment variable set by the shell wrapper while the tool runs inside it.
pub const SHELL_INTEGRATED_ENV: &str = "WRAPKIT_SHELL_INTEGRATED";

/// Environment variable that overrides the global config path.
pub const CONFIG_PATH_ENV: &str = "WRAPKIT_CONFIG";

/// Prefix of the line printed inside an integrated shell after handoff dispatch.
pub const UPDATER_PID_SENTINEL: &str = "WRAPKIT_UPDATER_PID=";

/// First line of the managed block in the shell startup file.
pub const INTEGRATION_START_MARKER: &str = "# >>> wrapkit shell integration >>>";

/// Last line of the managed block in the shell startup file.
pub const INTEGRATION_END_MARKER: &str = "# <<< wrapkit shell integration <<<";

/// Placeholder in the install command replaced by the package directory.
pub const SOURCE_PLACEHOLDER: &str = "{source}";

/// Name of the command the shell wrapper function defines.
pub const TOOL_NAME: &str = "wrapkit";
