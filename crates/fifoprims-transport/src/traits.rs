use std::path::Path;

use crate::error::Result;

/// Which end(s) of a named pipe an endpoint opens.
///
/// Every direction is opened non-blocking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Consumer side (`O_RDONLY`).
    Read,
    /// Producer side (`O_WRONLY`).
    Write,
    /// Both sides (`O_RDWR`). Keeps the pipe alive while peers come and go.
    ReadWrite,
}

impl Direction {
    /// Whether this endpoint may read from the pipe.
    pub fn can_read(self) -> bool {
        matches!(self, Self::Read | Self::ReadWrite)
    }

    /// Whether this endpoint may write to the pipe.
    pub fn can_write(self) -> bool {
        matches!(self, Self::Write | Self::ReadWrite)
    }

    /// The `open(2)` access flags for this direction, including `O_NONBLOCK`.
    #[cfg(unix)]
    pub fn open_flags(self) -> libc::c_int {
        let access = match self {
            Self::Read => libc::O_RDONLY,
            Self::Write => libc::O_WRONLY,
            Self::ReadWrite => libc::O_RDWR,
        };
        access | libc::O_NONBLOCK
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::ReadWrite => "read-write",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One endpoint of a named pipe, as seen by the transfer engine.
///
/// Implementations must never block: reads and writes are single
/// non-blocking syscalls, and opening reports peer absence as
/// `Ok(false)` rather than waiting for the peer.
pub trait FifoPort {
    /// Filesystem path of the pipe.
    fn path(&self) -> &Path;

    /// Direction this endpoint was configured with.
    fn direction(&self) -> Direction;

    /// Requested permission bits, used only when this endpoint creates the pipe.
    fn mode(&self) -> u32;

    /// Whether an OS handle is currently held.
    fn is_open(&self) -> bool;

    /// Open the endpoint if it is not open yet.
    ///
    /// Returns `Ok(true)` when the endpoint is open after the call and
    /// `Ok(false)` when the opposite side is not present yet. A live handle
    /// is never reopened.
    fn try_open(&mut self) -> Result<bool>;

    /// Issue one non-blocking read into `buf`.
    fn read_nonblocking(&mut self, buf: &mut [u8]) -> std::io::Result<usize>;

    /// Issue one non-blocking write of `buf`.
    fn write_nonblocking(&mut self, buf: &[u8]) -> std::io::Result<usize>;

    /// Release the OS handle. A no-op when nothing is open.
    fn close(&mut self) -> Result<()>;

    /// Remove the pipe special file from the filesystem.
    fn unlink(&self) -> Result<()>;
}

impl<P: FifoPort + ?Sized> FifoPort for Box<P> {
    fn path(&self) -> &Path {
        (**self).path()
    }

    fn direction(&self) -> Direction {
        (**self).direction()
    }

    fn mode(&self) -> u32 {
        (**self).mode()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn try_open(&mut self) -> Result<bool> {
        (**self).try_open()
    }

    fn read_nonblocking(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        (**self).read_nonblocking(buf)
    }

    fn write_nonblocking(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        (**self).write_nonblocking(buf)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }

    fn unlink(&self) -> Result<()> {
        (**self).unlink()
    }
}
