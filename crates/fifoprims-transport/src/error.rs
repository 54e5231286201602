use std::path::PathBuf;

/// Errors that can occur while managing a named pipe endpoint.
///
/// Every variant is fatal for the endpoint it was raised on. Benign
/// conditions (peer absent, pipe or directory already present) never
/// surface as errors.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to create a directory in the pipe's parent hierarchy.
    #[error("failed to provision directory {path}: {source}")]
    Provision {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An ancestor of the pipe path exists but is not a directory.
    #[error("not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// Failed to create the pipe special file.
    #[error("failed to create fifo {path}: {source}")]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to open the pipe for a reason other than peer absence.
    #[error("failed to open fifo {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to close the pipe descriptor.
    #[error("failed to close fifo {path}: {source}")]
    Close {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to remove the pipe special file.
    #[error("failed to unlink fifo {path}: {source}")]
    Unlink {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The path cannot be handed to the OS (interior NUL byte).
    #[error("invalid fifo path: {path}")]
    InvalidPath { path: PathBuf },

    /// An I/O error occurred outside of a specific lifecycle step.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// The underlying OS error, when there is one.
    pub fn io_source(&self) -> Option<&std::io::Error> {
        match self {
            Self::Provision { source, .. }
            | Self::Create { source, .. }
            | Self::Open { source, .. }
            | Self::Close { source, .. }
            | Self::Unlink { source, .. } => Some(source),
            Self::Io(source) => Some(source),
            Self::NotADirectory { .. } | Self::InvalidPath { .. } => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
