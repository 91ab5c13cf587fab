use std::path::PathBuf;

use thiserror::Error;

/// Exit status used when the process is stopped by a shutdown signal.
pub const INTERRUPTED_EXIT_CODE: u8 = 130;

/// Failures of the startup sequence and of the delegated application.
///
/// Every variant is fatal; the process supervisor is expected to observe the
/// exit status and apply its own restart policy.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("invalid timestamp pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("invalid worker count '{0}': expected a positive number or 'auto'")]
    InvalidWorkerCount(String),

    #[error("invalid log filter '{directive}': {reason}")]
    InvalidLogFilter { directive: String, reason: String },

    #[error("logging has already been installed for this process")]
    LoggingAlreadyInstalled,

    #[error("application not found at {}", .0.display())]
    AppMissing(PathBuf),

    #[error("failed to start application at {}", .path.display())]
    AppSpawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("application exited with status {code}")]
    AppExited { code: i32 },

    #[error("application was terminated by a signal")]
    AppKilled,

    #[error("failed to start worker {id}")]
    WorkerSpawn {
        id: usize,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "worker {id} exited with status {}",
        .code.map_or("unknown".to_string(), |c| c.to_string())
    )]
    WorkerFailed { id: usize, code: Option<i32> },

    #[error("interrupted by shutdown signal")]
    Interrupted,
}

impl BootstrapError {
    /// Maps the error to the status the process should exit with.
    ///
    /// An application's own non-zero status is passed through unchanged.
    pub fn exit_code(&self) -> u8 {
        match self {
            BootstrapError::AppExited { code }
            | BootstrapError::WorkerFailed {
                code: Some(code), ..
            } => u8::try_from(*code).ok().filter(|c| *c != 0).unwrap_or(1),
            BootstrapError::Interrupted => INTERRUPTED_EXIT_CODE,
            _ => 1,
        }
    }
}
