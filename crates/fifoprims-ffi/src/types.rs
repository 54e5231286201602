use std::ffi::c_void;

use fifoprims_element::Channel;

#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FifoResult {
    Ok = 0,
    InvalidArgument = 1,
    TransportError = 2,
    ChannelError = 3,
    Internal = 99,
}

#[allow(dead_code)]
pub const FIFO_OK: FifoResult = FifoResult::Ok;
#[allow(dead_code)]
pub const FIFO_ERR_INVALID_ARGUMENT: FifoResult = FifoResult::InvalidArgument;
#[allow(dead_code)]
pub const FIFO_ERR_TRANSPORT: FifoResult = FifoResult::TransportError;
#[allow(dead_code)]
pub const FIFO_ERR_CHANNEL: FifoResult = FifoResult::ChannelError;
#[allow(dead_code)]
pub const FIFO_ERR_INTERNAL: FifoResult = FifoResult::Internal;

/// Bytes in front of the element in a BDPI read buffer (the length word).
pub const FIFO_BDPI_HEADER_BYTES: usize = 4;

/// Opaque channel reference handed to C callers.
pub type FifoHandle = *mut c_void;

/// Fills `rawbytes` (element-sized) from the typed value at `src`.
pub type FifoEncodeFn = Option<unsafe extern "C" fn(src: *const c_void, rawbytes: *mut u8)>;

/// Builds the typed value at `dest` from `rawbytes` (element-sized).
pub type FifoDecodeFn = Option<unsafe extern "C" fn(rawbytes: *const u8, dest: *mut c_void)>;

pub(crate) struct ChannelHandle {
    pub(crate) channel: Channel,
    pub(crate) encoder: FifoEncodeFn,
    pub(crate) decoder: FifoDecodeFn,
}

impl ChannelHandle {
    pub(crate) fn new(channel: Channel, encoder: FifoEncodeFn, decoder: FifoDecodeFn) -> Self {
        Self {
            channel,
            encoder,
            decoder,
        }
    }

    pub(crate) fn into_raw(self) -> FifoHandle {
        Box::into_raw(Box::new(self)) as FifoHandle
    }
}
