//! Non-blocking fixed-size element transfer over named pipes.
//!
//! fifoprims moves fixed-size elements between processes through FIFOs
//! without ever blocking the caller, so a polling host (such as a
//! cycle-driven simulator) can drive the transfer one attempt per step.
//!
//! # Crate Structure
//!
//! - [`transport`] — Pipe provisioning and lifecycle (create, open, close, unlink)
//! - [`element`] — Partial-transfer engine, codec hooks, typed channels

/// Re-export transport types.
pub mod transport {
    pub use fifoprims_transport::*;
}

/// Re-export element channel types.
pub mod element {
    pub use fifoprims_element::*;
}

pub use fifoprims_element::{Attempt, Channel, ChannelError, Stall, TypedChannel};
