use std::io::ErrorKind;
use std::path::Path;

use bytes::Bytes;
use fifoprims_transport::{Direction, FifoPort, NamedFifo, TransportError};
use tracing::{debug, trace};

use crate::attempt::{Attempt, Stall};
use crate::error::{ChannelError, Result};

/// Direction of the element currently in flight on a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Inbound,
    Outbound,
}

impl Flow {
    fn verb(self) -> &'static str {
        match self {
            Self::Inbound => "read",
            Self::Outbound => "write",
        }
    }
}

/// Diagnostic snapshot of a channel, attached to every fatal engine error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelState {
    pub path: std::path::PathBuf,
    pub direction: Direction,
    pub mode: u32,
    pub element_size: usize,
    pub bytes_transferred: usize,
    pub open: bool,
    pub in_flight: Option<Flow>,
}

impl std::fmt::Display for ChannelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "fifo {} ({}, mode {:o}, {}, {}/{} bytes",
            self.path.display(),
            self.direction,
            self.mode,
            if self.open { "open" } else { "unopened" },
            self.bytes_transferred,
            self.element_size,
        )?;
        match self.in_flight {
            Some(flow) => write!(f, ", {} in flight)", flow.verb()),
            None => f.write_str(")"),
        }
    }
}

/// One endpoint of a named pipe moving fixed-size elements.
///
/// The channel owns exactly one buffer of `element_size` bytes and reuses it
/// for every element. Progress on the element in flight survives across
/// calls; bytes of one element always finish crossing before the next
/// element starts.
///
/// A channel is driven by a single caller. It has no internal locking.
pub struct Channel<P = NamedFifo> {
    port: P,
    buf: Box<[u8]>,
    transferred: usize,
    in_flight: Option<Flow>,
}

impl Channel<NamedFifo> {
    /// Create the pipe at `path` (reusing an existing one) and open it
    /// read-write, with the default `0o666` creation mode.
    ///
    /// Holding both directions keeps the pipe alive while peers come and go.
    pub fn create(path: impl AsRef<Path>, element_size: usize) -> Result<Self> {
        Self::create_with_mode(path, element_size, NamedFifo::DEFAULT_FIFO_MODE)
    }

    /// Like [`Channel::create`] with an explicit creation mode.
    pub fn create_with_mode(
        path: impl AsRef<Path>,
        element_size: usize,
        mode: u32,
    ) -> Result<Self> {
        let port = NamedFifo::with_mode(path, Direction::ReadWrite, mode);
        let mut channel = Self::with_port(port, element_size)?;
        channel
            .port
            .create()
            .map_err(|source| channel.lifecycle_error(source))?;
        Ok(channel)
    }

    /// Open an existing pipe without creating it.
    ///
    /// If the opposite side is not there yet the channel stays unopened;
    /// transfer attempts retry the open lazily.
    pub fn open(path: impl AsRef<Path>, direction: Direction, element_size: usize) -> Result<Self> {
        let mut channel = Self::with_port(NamedFifo::new(path, direction), element_size)?;
        channel
            .port
            .try_open()
            .map_err(|source| channel.lifecycle_error(source))?;
        Ok(channel)
    }
}

impl<P: FifoPort> Channel<P> {
    /// Wrap an endpoint. `element_size` must be non-zero.
    pub fn with_port(port: P, element_size: usize) -> Result<Self> {
        if element_size == 0 {
            return Err(ChannelError::ZeroElementSize);
        }
        Ok(Self {
            port,
            buf: vec![0u8; element_size].into_boxed_slice(),
            transferred: 0,
            in_flight: None,
        })
    }

    /// Make one non-blocking read toward the current element.
    ///
    /// On completion `take` is handed the full element, the progress counter
    /// resets, and its result is returned in [`Attempt::Complete`].
    pub fn try_read_with<R>(&mut self, take: impl FnOnce(&[u8]) -> R) -> Result<Attempt<R>> {
        self.check_direction(Flow::Inbound)?;
        if self.in_flight == Some(Flow::Outbound) {
            return Ok(Attempt::NoProgress(Stall::Busy));
        }
        if !self.ensure_open()? {
            return Ok(Attempt::NoProgress(Stall::PeerAbsent));
        }

        let remaining = self.buf.len() - self.transferred;
        let read = match self.port.read_nonblocking(&mut self.buf[self.transferred..]) {
            // No writer attached to a read-only endpoint.
            Ok(0) => return Ok(Attempt::NoProgress(Stall::PeerAbsent)),
            Ok(n) => n.min(remaining),
            Err(err) if is_retryable(&err) => return Ok(Attempt::NoProgress(Stall::WouldBlock)),
            Err(source) => {
                return Err(ChannelError::Read {
                    state: Box::new(self.state()),
                    source,
                })
            }
        };

        Ok(self.advance(read, Flow::Inbound).map(|()| take(&self.buf)))
    }

    /// Make one non-blocking write toward the current element.
    ///
    /// `fill` stages the element into the buffer. It runs once per element,
    /// on the first attempt that finds the pipe open; later attempts on the
    /// same element ignore it and resume where the last write stopped.
    pub fn try_write_with(&mut self, fill: impl FnOnce(&mut [u8])) -> Result<Attempt<()>> {
        self.check_direction(Flow::Outbound)?;
        if self.in_flight == Some(Flow::Inbound) {
            return Ok(Attempt::NoProgress(Stall::Busy));
        }
        if !self.ensure_open()? {
            return Ok(Attempt::NoProgress(Stall::PeerAbsent));
        }

        if self.in_flight.is_none() {
            fill(&mut self.buf);
            self.in_flight = Some(Flow::Outbound);
        }

        let remaining = self.buf.len() - self.transferred;
        let written = match self.port.write_nonblocking(&self.buf[self.transferred..]) {
            Ok(0) => return Ok(Attempt::NoProgress(Stall::PeerDeparted)),
            Ok(n) => n.min(remaining),
            Err(err) if is_retryable(&err) => return Ok(Attempt::NoProgress(Stall::WouldBlock)),
            Err(err) if is_peer_departure(&err) => {
                trace!(path = ?self.port.path(), error = %err, "peer departed, will retry");
                return Ok(Attempt::NoProgress(Stall::PeerDeparted));
            }
            Err(source) => {
                return Err(ChannelError::Write {
                    state: Box::new(self.state()),
                    source,
                })
            }
        };

        Ok(self.advance(written, Flow::Outbound))
    }

    /// Read one element as raw bytes.
    pub fn try_read_raw(&mut self) -> Result<Attempt<Bytes>> {
        self.try_read_with(Bytes::copy_from_slice)
    }

    /// Write one element of raw bytes. `data` must be exactly one element.
    pub fn try_write_raw(&mut self, data: &[u8]) -> Result<Attempt<()>> {
        if data.len() != self.buf.len() {
            return Err(ChannelError::SizeMismatch {
                expected: self.buf.len(),
                actual: data.len(),
            });
        }
        self.try_write_with(|buf| buf.copy_from_slice(data))
    }

    /// Release the OS handle. The pipe file stays on disk.
    pub fn close(&mut self) -> Result<()> {
        self.port
            .close()
            .map_err(|source| self.lifecycle_error(source))?;
        Ok(())
    }

    /// Remove the pipe file from disk.
    pub fn unlink(&self) -> Result<()> {
        self.port
            .unlink()
            .map_err(|source| self.lifecycle_error(source))?;
        Ok(())
    }

    /// Close, unlink, and drop the channel.
    pub fn destroy(mut self) -> Result<()> {
        self.close()?;
        self.unlink()?;
        debug!(path = ?self.port.path(), "destroyed channel");
        Ok(())
    }

    pub fn element_size(&self) -> usize {
        self.buf.len()
    }

    /// Bytes of the current element already moved, in `0..element_size`.
    pub fn bytes_transferred(&self) -> usize {
        self.transferred
    }

    /// Direction of the element currently in flight, if any.
    pub fn in_flight(&self) -> Option<Flow> {
        self.in_flight
    }

    pub fn is_open(&self) -> bool {
        self.port.is_open()
    }

    pub fn path(&self) -> &Path {
        self.port.path()
    }

    pub fn direction(&self) -> Direction {
        self.port.direction()
    }

    /// Borrow the underlying endpoint.
    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn state(&self) -> ChannelState {
        ChannelState {
            path: self.port.path().to_path_buf(),
            direction: self.port.direction(),
            mode: self.port.mode(),
            element_size: self.buf.len(),
            bytes_transferred: self.transferred,
            open: self.port.is_open(),
            in_flight: self.in_flight,
        }
    }

    fn ensure_open(&mut self) -> Result<bool> {
        if self.port.is_open() {
            return Ok(true);
        }
        self.port
            .try_open()
            .map_err(|source| self.lifecycle_error(source))
    }

    fn lifecycle_error(&self, source: TransportError) -> ChannelError {
        ChannelError::Lifecycle {
            state: Box::new(self.state()),
            source,
        }
    }

    fn check_direction(&self, flow: Flow) -> Result<()> {
        let direction = self.port.direction();
        let allowed = match flow {
            Flow::Inbound => direction.can_read(),
            Flow::Outbound => direction.can_write(),
        };
        if allowed {
            Ok(())
        } else {
            Err(ChannelError::WrongDirection {
                path: self.port.path().to_path_buf(),
                direction,
                operation: flow.verb(),
            })
        }
    }

    fn advance(&mut self, moved: usize, flow: Flow) -> Attempt<()> {
        self.transferred += moved;
        if self.transferred < self.buf.len() {
            self.in_flight = Some(flow);
            trace!(
                path = ?self.port.path(),
                transferred = self.transferred,
                element_size = self.buf.len(),
                "partial {}",
                flow.verb()
            );
            return Attempt::Partial {
                transferred: self.transferred,
                element_size: self.buf.len(),
            };
        }

        self.transferred = 0;
        self.in_flight = None;
        Attempt::Complete(())
    }
}

impl<P: FifoPort> std::fmt::Debug for Channel<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("path", &self.port.path())
            .field("direction", &self.port.direction())
            .field("element_size", &self.buf.len())
            .field("bytes_transferred", &self.transferred)
            .field("open", &self.port.is_open())
            .field("in_flight", &self.in_flight)
            .finish()
    }
}

fn is_retryable(err: &std::io::Error) -> bool {
    matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::Interrupted)
}

fn is_peer_departure(err: &std::io::Error) -> bool {
    err.kind() == ErrorKind::BrokenPipe || err.raw_os_error() == Some(libc::EBADF)
}
