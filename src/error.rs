use std::io;
use std::path::PathBuf;

/// Run-level failures. Malformed lines are never errors; they are counted.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    /// Invalid configuration, detected before any I/O happens
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Input could not be opened or a read failed mid-stream
    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A worker thread crashed while aggregating a batch
    #[error("worker {worker_id} failed: {message}")]
    Worker { worker_id: usize, message: String },
}

impl ProcessError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        ProcessError::Config(message.into())
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ProcessError::Io {
            path: path.into(),
            source,
        }
    }

    /// Exit-code class used by the CLI: configuration problems are usage errors
    pub fn is_usage_error(&self) -> bool {
        matches!(self, ProcessError::Config(_))
    }
}

pub type Result<T, E = ProcessError> = std::result::Result<T, E>;
