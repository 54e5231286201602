//! Entry points for simulator hosts that poll once per time step.
//!
//! The host only passes flat `uint32_t` arrays and opaque handles, so the
//! element travels as raw bytes. Every call returns without blocking.

use std::os::raw::c_char;

use fifoprims_element::{Attempt, Channel, ChannelError};

use crate::error;
use crate::transport;
use crate::types::{ChannelHandle, FifoHandle, FIFO_BDPI_HEADER_BYTES};

pub(crate) fn with_handle_mut<T>(
    handle: FifoHandle,
    on_error: T,
    f: impl FnOnce(&mut ChannelHandle) -> T,
) -> T {
    if handle.is_null() {
        let _ = error::set_invalid_argument("fifo handle cannot be null");
        return on_error;
    }

    let channel_handle = {
        // SAFETY: Pointer validity is guaranteed by the caller.
        unsafe { &mut *(handle as *mut ChannelHandle) }
    };

    f(channel_handle)
}

/// Handle a channel error from a constructor: bad arguments are reported,
/// everything else goes through the fatal policy.
pub(crate) fn constructor_error(context: &str, err: &ChannelError) -> FifoHandle {
    match err {
        ChannelError::ZeroElementSize => {
            let _ = error::set_invalid_argument(err.to_string());
            std::ptr::null_mut()
        }
        _ => error::fatal(context, err, std::ptr::null_mut()),
    }
}

/// Create the pipe at `pathname` (reusing an existing one) and open it
/// read-write for elements of `bytesize` bytes.
///
/// Holding both ends keeps the pipe usable while client processes come and
/// go for the lifetime of the simulator.
///
/// # Safety
/// `pathname` must be a non-null pointer to a NUL-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn fifo_bdpi_create(pathname: *const c_char, bytesize: usize) -> FifoHandle {
    crate::ffi_boundary(std::ptr::null_mut(), || {
        error::clear_error_state();

        let path = {
            // SAFETY: We validate null in helper.
            match unsafe { transport::required_path_arg(pathname, "pathname") } {
                Some(v) => v,
                None => return std::ptr::null_mut(),
            }
        };
        let Some(bytesize) = transport::element_size_arg(bytesize) else {
            return std::ptr::null_mut();
        };

        match Channel::create(path, bytesize) {
            Ok(channel) => ChannelHandle::new(channel, None, None).into_raw(),
            Err(err) => constructor_error("create failed", &err),
        }
    })
}

/// Attempt to read one element.
///
/// Word 0 of `retbuf` is set to 0 when the element is not complete yet, or
/// to the element byte size once it is, in which case the element bytes
/// follow from byte offset 4.
///
/// # Safety
/// `desc` must be a handle returned by `fifo_bdpi_create`. `retbuf` must be
/// writable for `4 + bytesize` bytes.
#[no_mangle]
pub unsafe extern "C" fn fifo_bdpi_read(retbuf: *mut u32, desc: FifoHandle) {
    crate::ffi_boundary((), || {
        error::clear_error_state();

        if retbuf.is_null() {
            let _ = error::set_invalid_argument("retbuf cannot be null");
            return;
        }

        with_handle_mut(desc, (), |handle| {
            let size = handle.channel.element_size();
            let out = {
                // SAFETY: The caller guarantees `retbuf` spans the header word plus one element.
                unsafe {
                    std::slice::from_raw_parts_mut(
                        retbuf.cast::<u8>(),
                        FIFO_BDPI_HEADER_BYTES + size,
                    )
                }
            };
            let (header, payload) = out.split_at_mut(FIFO_BDPI_HEADER_BYTES);
            header.fill(0);

            match handle
                .channel
                .try_read_with(|element| payload.copy_from_slice(element))
            {
                Ok(Attempt::Complete(())) => {
                    // Checked to fit 32 bits at creation.
                    header.copy_from_slice(&(size as u32).to_ne_bytes());
                }
                Ok(_) => {}
                Err(err) => error::fatal("read failed", &err, ()),
            }
        })
    })
}

/// Attempt to write the element at `data`.
///
/// Returns 1 when this call finished sending the element, 0 when the host
/// must call again (with the same element). The host must ignore `SIGPIPE`
/// for a departed reader to come back as 0.
///
/// # Safety
/// `desc` must be a handle returned by `fifo_bdpi_create`. `data` must be
/// readable for `bytesize` bytes.
#[no_mangle]
pub unsafe extern "C" fn fifo_bdpi_write(desc: FifoHandle, data: *const u32) -> u8 {
    crate::ffi_boundary(0, || {
        error::clear_error_state();

        if data.is_null() {
            let _ = error::set_invalid_argument("data cannot be null");
            return 0;
        }

        with_handle_mut(desc, 0, |handle| {
            let size = handle.channel.element_size();
            let element = {
                // SAFETY: The caller guarantees `data` is readable for one element.
                unsafe { std::slice::from_raw_parts(data.cast::<u8>(), size) }
            };

            match handle.channel.try_write_raw(element) {
                Ok(Attempt::Complete(())) => 1,
                Ok(_) => 0,
                Err(err) => error::fatal("write failed", &err, 0),
            }
        })
    })
}
