use std::time::Duration;

use dh_core::config::ConfigError;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to launch {program}: {source}")]
    LaunchFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// No matching output within the silence window, or the process died
    /// while a reply was still expected.
    #[error("wait timed out after {timeout:?}, looking for '{pattern}', in {lines} lines")]
    Timeout {
        timeout: Duration,
        pattern: String,
        lines: usize,
        terminated: bool,
    },

    #[error("unexpected I/O error while writing command '{command}' to debugger stdin: {source}")]
    WriteFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("attempt to send command '{0}' to terminated debugger")]
    CommandToTerminated(String),

    #[error("debuggee did not exit after {attempts} continue commands")]
    DidNotExit { attempts: usize },

    #[error("invalid prompt pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("invalid session config: {0}")]
    Config(#[from] ConfigError),

    #[error("session I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SessionError {
    /// True for the timeout-style failure raised when the process exited
    /// before the expected output arrived.
    pub fn is_premature_exit(&self) -> bool {
        matches!(
            self,
            SessionError::Timeout {
                terminated: true,
                ..
            }
        )
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
