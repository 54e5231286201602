//! Fixed-size element transfer over named pipes.
//!
//! A [`Channel`] owns one element-sized buffer and moves one element at a
//! time across a FIFO using only non-blocking I/O. Every call is an
//! *attempt*: it makes at most one read or write and returns promptly with
//! an [`Attempt`] describing what happened. The caller owns the polling
//! loop and simply calls again on anything short of completion.
//!
//! Elements carry no framing on the wire; both sides agree on the element
//! size out of band. [`TypedChannel`] layers encode/decode hooks on top.

#[cfg(not(unix))]
compile_error!("fifoprims-element requires a Unix platform (named pipes)");

pub mod attempt;
pub mod channel;
pub mod codec;
pub mod error;
pub mod typed;

pub use attempt::{Attempt, Stall};
pub use channel::{Channel, ChannelState, Flow};
pub use codec::{Decoder, Encoder, RawBytes};
pub use error::{ChannelError, Result};
pub use typed::TypedChannel;

pub use fifoprims_transport::{Direction, FifoPort};
