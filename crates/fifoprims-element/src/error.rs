use std::path::PathBuf;

use crate::channel::ChannelState;

/// Errors raised by a channel.
///
/// These are the fatal conditions: nothing here is retried by the channel
/// itself. Transient conditions are reported as [`crate::Attempt::NoProgress`]
/// instead. Hosts decide how to terminate; the channel never exits the
/// process.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// Element size must be at least one byte.
    #[error("element size must be greater than zero")]
    ZeroElementSize,

    /// Lifecycle failure (provision, create, open, close, unlink),
    /// including a lazy open made inside a transfer attempt.
    #[error("{source} on {state}")]
    Lifecycle {
        state: Box<ChannelState>,
        source: fifoprims_transport::TransportError,
    },

    /// A read failed with something other than "would block".
    #[error("read failed on {state}: {source}")]
    Read {
        state: Box<ChannelState>,
        source: std::io::Error,
    },

    /// A write failed with something other than a tolerated peer condition.
    #[error("write failed on {state}: {source}")]
    Write {
        state: Box<ChannelState>,
        source: std::io::Error,
    },

    /// Raw element payload does not match the channel's element size.
    #[error("element size mismatch (expected {expected} bytes, got {actual})")]
    SizeMismatch { expected: usize, actual: usize },

    /// The channel's direction does not allow this operation.
    #[error("{path} is opened {direction}, cannot {operation}")]
    WrongDirection {
        path: PathBuf,
        direction: fifoprims_transport::Direction,
        operation: &'static str,
    },

    /// Produce called on a channel without an encode hook.
    #[error("no encoder configured for {path}")]
    MissingEncoder { path: PathBuf },

    /// Consume called on a channel without a decode hook.
    #[error("no decoder configured for {path}")]
    MissingDecoder { path: PathBuf },
}

impl ChannelError {
    /// The underlying OS error, when there is one.
    pub fn io_source(&self) -> Option<&std::io::Error> {
        match self {
            Self::Read { source, .. } | Self::Write { source, .. } => Some(source),
            Self::Lifecycle { source, .. } => source.io_source(),
            _ => None,
        }
    }

    /// The lifecycle step that failed, when this is a lifecycle error.
    pub fn transport(&self) -> Option<&fifoprims_transport::TransportError> {
        match self {
            Self::Lifecycle { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Channel snapshot taken when the error was raised.
    pub fn state(&self) -> Option<&ChannelState> {
        match self {
            Self::Lifecycle { state, .. } | Self::Read { state, .. } | Self::Write { state, .. } => {
                Some(state.as_ref())
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ChannelError>;
