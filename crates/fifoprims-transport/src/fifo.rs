use std::ffi::CString;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::{FileTypeExt, OpenOptionsExt, PermissionsExt};
use std::os::unix::io::IntoRawFd;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::path::ensure_dir_path;
use crate::traits::{Direction, FifoPort};

/// One endpoint of a named pipe on the local filesystem.
///
/// The endpoint starts unopened. Opening is always non-blocking, and a pipe
/// with no opposite-direction peer (`ENXIO`) leaves it unopened so the
/// caller can retry later.
pub struct NamedFifo {
    path: PathBuf,
    mode: u32,
    direction: Direction,
    file: Option<File>,
}

impl NamedFifo {
    /// Default permission mode for pipes created by [`NamedFifo::create`].
    pub const DEFAULT_FIFO_MODE: u32 = 0o666;

    /// Describe an endpoint that never creates the pipe itself.
    pub fn new(path: impl AsRef<Path>, direction: Direction) -> Self {
        Self::with_mode(path, direction, 0)
    }

    /// Describe an endpoint with an explicit creation mode.
    pub fn with_mode(path: impl AsRef<Path>, direction: Direction, mode: u32) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            mode,
            direction,
            file: None,
        }
    }

    /// Create the pipe special file and open this endpoint.
    ///
    /// Provisions the parent directories, creates the FIFO with this
    /// endpoint's mode (an existing FIFO is reused), then attempts to open.
    /// A path that exists but does not resolve to a FIFO is rejected.
    pub fn create(&mut self) -> Result<bool> {
        if let Some(parent) = self.path.parent() {
            ensure_dir_path(parent, self.mode)?;
        }

        let c_path = self.c_path()?;
        // SAFETY: `c_path` is a valid NUL-terminated string for the duration of the call.
        let rc = unsafe { libc::mkfifo(c_path.as_ptr(), self.mode as libc::mode_t) };
        if rc == -1 {
            let err = std::io::Error::last_os_error();
            if err.kind() != ErrorKind::AlreadyExists {
                return Err(TransportError::Create {
                    path: self.path.clone(),
                    source: err,
                });
            }
            // Follow symlinks: open(2) will.
            let metadata = std::fs::metadata(&self.path).map_err(|e| TransportError::Create {
                path: self.path.clone(),
                source: e,
            })?;
            if !metadata.file_type().is_fifo() {
                return Err(TransportError::Create {
                    path: self.path.clone(),
                    source: std::io::Error::new(
                        ErrorKind::AlreadyExists,
                        "existing path is not a fifo",
                    ),
                });
            }
            debug!(path = ?self.path, "reusing existing fifo");
        } else {
            info!(path = ?self.path, mode = format_args!("{:o}", self.mode), "created fifo");
        }

        self.try_open()
    }

    /// Open this endpoint if it is not open yet.
    ///
    /// Returns `Ok(false)` when the pipe has no opposite-direction peer.
    pub fn try_open(&mut self) -> Result<bool> {
        if self.file.is_some() {
            return Ok(true);
        }

        let mut options = OpenOptions::new();
        options
            .read(self.direction.can_read())
            .write(self.direction.can_write())
            .custom_flags(self.direction.open_flags());

        match options.open(&self.path) {
            Ok(file) => {
                debug!(path = ?self.path, direction = %self.direction, "opened fifo");
                self.file = Some(file);
                Ok(true)
            }
            Err(err) if err.raw_os_error() == Some(libc::ENXIO) => {
                debug!(path = ?self.path, "fifo has no peer yet");
                Ok(false)
            }
            Err(err) => Err(TransportError::Open {
                path: self.path.clone(),
                source: err,
            }),
        }
    }

    /// Close the descriptor, reporting the OS result of `close(2)`.
    pub fn close(&mut self) -> Result<()> {
        let Some(file) = self.file.take() else {
            return Ok(());
        };

        let fd = file.into_raw_fd();
        // SAFETY: `fd` was just released from an owned `File`, so nothing else closes it.
        let rc = unsafe { libc::close(fd) };
        if rc == -1 {
            return Err(TransportError::Close {
                path: self.path.clone(),
                source: std::io::Error::last_os_error(),
            });
        }
        debug!(path = ?self.path, "closed fifo");
        Ok(())
    }

    /// Remove the pipe special file.
    pub fn unlink(&self) -> Result<()> {
        std::fs::remove_file(&self.path).map_err(|e| TransportError::Unlink {
            path: self.path.clone(),
            source: e,
        })?;
        debug!(path = ?self.path, "unlinked fifo");
        Ok(())
    }

    /// The pipe path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creation mode.
    pub fn mode(&self) -> u32 {
        self.mode
    }

    /// Configured direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Whether the endpoint currently holds an OS handle.
    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    fn c_path(&self) -> Result<CString> {
        CString::new(self.path.as_os_str().as_bytes()).map_err(|_| TransportError::InvalidPath {
            path: self.path.clone(),
        })
    }
}

impl FifoPort for NamedFifo {
    fn path(&self) -> &Path {
        &self.path
    }

    fn direction(&self) -> Direction {
        self.direction
    }

    fn mode(&self) -> u32 {
        self.mode
    }

    fn is_open(&self) -> bool {
        self.file.is_some()
    }

    fn try_open(&mut self) -> Result<bool> {
        NamedFifo::try_open(self)
    }

    fn read_nonblocking(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self.file.as_mut() {
            Some(file) => file.read(buf),
            None => Err(std::io::Error::from(ErrorKind::NotConnected)),
        }
    }

    fn write_nonblocking(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self.file.as_mut() {
            Some(file) => file.write(buf),
            None => Err(std::io::Error::from(ErrorKind::NotConnected)),
        }
    }

    fn close(&mut self) -> Result<()> {
        NamedFifo::close(self)
    }

    fn unlink(&self) -> Result<()> {
        NamedFifo::unlink(self)
    }
}

impl std::fmt::Debug for NamedFifo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamedFifo")
            .field("path", &self.path)
            .field("mode", &format_args!("{:o}", self.mode))
            .field("direction", &self.direction)
            .field("open", &self.file.is_some())
            .finish()
    }
}

/// What currently sits at a pipe path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FifoStatus {
    pub path: PathBuf,
    pub exists: bool,
    pub is_fifo: bool,
    /// Permission bits (`0o777` mask), when the path exists.
    pub mode: Option<u32>,
}

/// Inspect `path`, following symlinks the same way opening it would.
pub fn fifo_status(path: impl AsRef<Path>) -> Result<FifoStatus> {
    let path = path.as_ref();
    match std::fs::metadata(path) {
        Ok(metadata) => Ok(FifoStatus {
            path: path.to_path_buf(),
            exists: true,
            is_fifo: metadata.file_type().is_fifo(),
            mode: Some(metadata.permissions().mode() & 0o777),
        }),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(FifoStatus {
            path: path.to_path_buf(),
            exists: false,
            is_fifo: false,
            mode: None,
        }),
        Err(err) => Err(TransportError::Io(err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("fifoprims-fifo-{tag}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn create_provisions_parent_and_opens_read_write() {
        let dir = scratch_dir("create");
        let path = dir.join("nested").join("chan.fifo");

        let mut fifo = NamedFifo::with_mode(&path, Direction::ReadWrite, 0o600);
        assert!(fifo.create().unwrap());
        assert!(fifo.is_open());

        let status = fifo_status(&path).unwrap();
        assert!(status.exists && status.is_fifo);

        fifo.close().unwrap();
        fifo.unlink().unwrap();
        assert!(!fifo_status(&path).unwrap().exists);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn create_is_idempotent() {
        let dir = scratch_dir("idempotent");
        let path = dir.join("chan.fifo");

        let mut first = NamedFifo::with_mode(&path, Direction::ReadWrite, 0o600);
        let mut second = NamedFifo::with_mode(&path, Direction::ReadWrite, 0o600);
        assert!(first.create().unwrap());
        assert!(second.create().unwrap());

        // Both handles see the same pipe.
        first.write_nonblocking(b"ok").unwrap();
        let mut buf = [0u8; 2];
        assert_eq!(second.read_nonblocking(&mut buf).unwrap(), 2);
        assert_eq!(&buf, b"ok");

        first.close().unwrap();
        second.close().unwrap();
        first.unlink().unwrap();
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn create_rejects_existing_regular_file() {
        let dir = scratch_dir("regular");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("not-a-fifo");
        std::fs::write(&path, b"regular-file").unwrap();

        let mut fifo = NamedFifo::with_mode(&path, Direction::ReadWrite, 0o600);
        let err = fifo.create().unwrap_err();
        assert!(matches!(err, TransportError::Create { .. }));
        assert!(!fifo.is_open());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn create_accepts_symlink_to_existing_fifo() {
        let dir = scratch_dir("symlink");
        let real = dir.join("real.fifo");
        let link = dir.join("link.fifo");
        let mut original = NamedFifo::with_mode(&real, Direction::ReadWrite, 0o600);
        assert!(original.create().unwrap());
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let mut via_link = NamedFifo::with_mode(&link, Direction::ReadWrite, 0o600);
        assert!(via_link.create().unwrap());
        assert!(via_link.is_open());

        let status = fifo_status(&link).unwrap();
        assert!(status.exists);
        assert!(status.is_fifo);

        via_link.close().unwrap();
        original.close().unwrap();
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn create_rejects_symlink_to_regular_file() {
        let dir = scratch_dir("symlink-regular");
        std::fs::create_dir_all(&dir).unwrap();
        let target = dir.join("plain");
        let link = dir.join("link.fifo");
        std::fs::write(&target, b"regular-file").unwrap();
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let mut fifo = NamedFifo::with_mode(&link, Direction::ReadWrite, 0o600);
        let err = fifo.create().unwrap_err();
        assert!(matches!(err, TransportError::Create { .. }));
        assert!(!fifo.is_open());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn writer_without_reader_stays_unopened() {
        let dir = scratch_dir("no-reader");
        let path = dir.join("chan.fifo");
        std::fs::create_dir_all(&dir).unwrap();
        let mut creator = NamedFifo::with_mode(&path, Direction::Read, 0o600);
        assert!(creator.create().unwrap());
        creator.close().unwrap();

        let mut producer = NamedFifo::new(&path, Direction::Write);
        assert!(!producer.try_open().unwrap());
        assert!(!producer.is_open());

        // A reader appears; the retry now succeeds.
        let mut consumer = NamedFifo::new(&path, Direction::Read);
        assert!(consumer.try_open().unwrap());
        assert!(producer.try_open().unwrap());

        producer.close().unwrap();
        consumer.close().unwrap();
        consumer.unlink().unwrap();
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn open_missing_path_is_fatal() {
        let dir = scratch_dir("missing");
        let mut consumer = NamedFifo::new(dir.join("absent.fifo"), Direction::Read);
        let err = consumer.try_open().unwrap_err();
        assert!(matches!(err, TransportError::Open { .. }));
    }

    #[test]
    fn unlink_missing_path_is_fatal() {
        let dir = scratch_dir("unlink-missing");
        let fifo = NamedFifo::new(dir.join("absent.fifo"), Direction::Read);
        assert!(matches!(
            fifo.unlink().unwrap_err(),
            TransportError::Unlink { .. }
        ));
    }

    #[test]
    fn io_on_unopened_endpoint_is_not_connected() {
        let mut fifo = NamedFifo::new("/nonexistent/fifo", Direction::ReadWrite);
        let mut buf = [0u8; 1];
        let err = fifo.read_nonblocking(&mut buf).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotConnected);
        let err = fifo.write_nonblocking(b"x").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotConnected);
        fifo.close().unwrap();
    }

    #[test]
    fn interior_nul_is_invalid_path() {
        let mut fifo = NamedFifo::with_mode(
            std::ffi::OsStr::from_bytes(b"bad\0path"),
            Direction::ReadWrite,
            0o600,
        );
        assert!(matches!(
            fifo.create().unwrap_err(),
            TransportError::InvalidPath { .. }
        ));
    }
}
