//! Project-wide constants.

use std::path::PathBuf;
use std::time::Duration;

/// Prefix the echo executor puts in front of every command.
pub const ECHO_PREFIX: &str = "Echo : ";

/// Simulated backend latency for the echo executor.
pub const ECHO_DELAY: Duration = Duration::from_millis(100);

/// Interpreter launched for a new session when nothing else is configured.
pub const DEFAULT_PROGRAM: &str = "python";

/// `-i` forces interactive mode on a pipe, `-u` disables output buffering.
pub const DEFAULT_ARGS: &[&str] = &["-i", "-u"];

/// Matches Python's primary and continuation prompts.
pub const DEFAULT_PROMPT: &str = r"^(>>> |\.\.\. )";

/// How long `send` waits for the next prompt.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(10);

/// How long a closing session gets to exit before it is killed.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(3);

/// Session names are `REPL-1`, `REPL-2`, ...
pub const SESSION_PREFIX: &str = "REPL";

/// Default number of entries shown by `/history`.
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Default database path: `~/.replhost/replhost.db`.
/// Holds command history and config.
pub fn default_db_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".replhost")
        .join("replhost.db")
}

/// Format a session name from its sequence number.
pub fn session_name(n: usize) -> String {
    format!("{SESSION_PREFIX}-{n}")
}
