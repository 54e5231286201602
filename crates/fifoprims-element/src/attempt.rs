/// Why an attempt made no progress.
///
/// All stalls are retryable: the channel state is exactly what it was
/// before the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stall {
    /// The opposite side has not opened the pipe yet, or a reader saw
    /// end-of-stream because no writer is attached.
    PeerAbsent,
    /// The pipe has no data (read) or no space (write) right now.
    WouldBlock,
    /// A write hit a departed reader (`EPIPE`) or a dead descriptor
    /// (`EBADF`). Retried like the others, but reported separately so a
    /// caller can decide when a peer has been gone too long.
    PeerDeparted,
    /// A bidirectional channel has an element in flight in the other
    /// direction; finish that one first.
    Busy,
}

impl Stall {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PeerAbsent => "peer-absent",
            Self::WouldBlock => "would-block",
            Self::PeerDeparted => "peer-departed",
            Self::Busy => "busy",
        }
    }
}

/// Outcome of one non-blocking transfer attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "an attempt that is not complete must be retried"]
pub enum Attempt<T> {
    /// Nothing moved.
    NoProgress(Stall),
    /// Some bytes moved; the element is not complete yet.
    Partial {
        transferred: usize,
        element_size: usize,
    },
    /// This call finished an element.
    Complete(T),
}

impl<T> Attempt<T> {
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete(_))
    }

    /// Whether the caller needs to call again for the current element.
    pub fn is_pending(&self) -> bool {
        !self.is_complete()
    }

    /// The completed value, if any.
    pub fn complete(self) -> Option<T> {
        match self {
            Self::Complete(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Attempt<U> {
        match self {
            Self::NoProgress(stall) => Attempt::NoProgress(stall),
            Self::Partial {
                transferred,
                element_size,
            } => Attempt::Partial {
                transferred,
                element_size,
            },
            Self::Complete(value) => Attempt::Complete(f(value)),
        }
    }
}
