use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("git {command} failed: {message}")]
    Git { command: String, message: String },

    #[error("Failed to extract revision {revision}: {message}")]
    Archive { revision: String, message: String },

    #[error("Failed to remove temporary snapshot {}: {source}", path.display())]
    Cleanup {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to restore unstaged changes: {0}")]
    Restore(String),

    #[error("Invalid revision '{0}': expected 40 or 64 hex characters")]
    InvalidRevision(String),

    #[error("Missing required tools: {}", .0.join(", "))]
    MissingTools(Vec<String>),

    #[error("Invalid config {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    #[error("{0}")]
    Other(String),
}

impl GateError {
    /// Whether this error leaves the repository or working tree in a state
    /// that needs attention, as opposed to an environment or usage problem.
    pub fn is_repository_integrity(&self) -> bool {
        matches!(
            self,
            GateError::Git { .. }
                | GateError::Archive { .. }
                | GateError::Cleanup { .. }
                | GateError::Restore(_)
        )
    }
}
