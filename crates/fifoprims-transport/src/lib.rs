//! Named pipe (FIFO) transport plumbing.
//!
//! This is the lowest layer of fifoprims. It knows how to:
//! - provision the parent directory hierarchy of a pipe path
//! - create, open, close, and unlink the pipe special file
//! - issue single non-blocking reads and writes on an open endpoint
//!
//! Everything above this layer talks to an endpoint through the
//! [`FifoPort`] trait, so partial I/O can be scripted in tests.

pub mod error;
pub mod traits;

#[cfg(unix)]
pub mod fifo;
#[cfg(unix)]
pub mod path;

pub use error::{Result, TransportError};
pub use traits::{Direction, FifoPort};

#[cfg(unix)]
pub use fifo::{fifo_status, FifoStatus, NamedFifo};
#[cfg(unix)]
pub use path::ensure_dir_path;
