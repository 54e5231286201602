//! Producer/consumer API for C clients with typed encode/decode callbacks.

use std::ffi::c_void;
use std::os::raw::c_char;

use fifoprims_element::{Attempt, Channel, Direction};

use crate::bdpi::{constructor_error, with_handle_mut};
use crate::error;
use crate::transport;
use crate::types::{ChannelHandle, FifoDecodeFn, FifoEncodeFn, FifoHandle, FifoResult};

unsafe fn open_handle(
    pathname: *const c_char,
    bytesize: usize,
    direction: Direction,
    encoder: FifoEncodeFn,
    decoder: FifoDecodeFn,
) -> FifoHandle {
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

    match Channel::open(path, direction, bytesize) {
        Ok(channel) => ChannelHandle::new(channel, encoder, decoder).into_raw(),
        Err(err) => constructor_error("open failed", &err),
    }
}

/// Open an existing pipe write-only, encoding elements with `encoder`.
///
/// A missing consumer is not an error; the open is retried on each produce.
///
/// # Safety
/// `pathname` must be a NUL-terminated C string. `encoder` must write exactly
/// `bytesize` bytes.
#[no_mangle]
pub unsafe extern "C" fn fifo_open_as_producer(
    pathname: *const c_char,
    bytesize: usize,
    encoder: FifoEncodeFn,
) -> FifoHandle {
    crate::ffi_boundary(std::ptr::null_mut(), || {
        error::clear_error_state();
        if encoder.is_none() {
            let _ = error::set_invalid_argument("encoder cannot be null");
            return std::ptr::null_mut();
        }
        // SAFETY: Forwarded caller guarantees.
        unsafe { open_handle(pathname, bytesize, Direction::Write, encoder, None) }
    })
}

/// Open an existing pipe read-only, decoding elements with `decoder`.
///
/// # Safety
/// `pathname` must be a NUL-terminated C string. `decoder` must read at most
/// `bytesize` bytes.
#[no_mangle]
pub unsafe extern "C" fn fifo_open_as_consumer(
    pathname: *const c_char,
    bytesize: usize,
    decoder: FifoDecodeFn,
) -> FifoHandle {
    crate::ffi_boundary(std::ptr::null_mut(), || {
        error::clear_error_state();
        if decoder.is_none() {
            let _ = error::set_invalid_argument("decoder cannot be null");
            return std::ptr::null_mut();
        }
        // SAFETY: Forwarded caller guarantees.
        unsafe { open_handle(pathname, bytesize, Direction::Read, None, decoder) }
    })
}

/// Open an existing pipe read-write with both callbacks.
///
/// # Safety
/// See [`fifo_open_as_producer`] and [`fifo_open_as_consumer`].
#[no_mangle]
pub unsafe extern "C" fn fifo_open_as_producer_consumer(
    pathname: *const c_char,
    bytesize: usize,
    encoder: FifoEncodeFn,
    decoder: FifoDecodeFn,
) -> FifoHandle {
    crate::ffi_boundary(std::ptr::null_mut(), || {
        error::clear_error_state();
        if encoder.is_none() || decoder.is_none() {
            let _ = error::set_invalid_argument("encoder and decoder cannot be null");
            return std::ptr::null_mut();
        }
        // SAFETY: Forwarded caller guarantees.
        unsafe { open_handle(pathname, bytesize, Direction::ReadWrite, encoder, decoder) }
    })
}

/// Attempt to send the value at `elemsrc`. Returns true once the whole
/// element has been written.
///
/// The value is encoded when a new element starts; keep passing the same
/// value until this returns true. A departed reader returns false only when
/// the host ignores `SIGPIPE`; otherwise the signal ends the process.
///
/// # Safety
/// `desc` must be a handle from a `fifo_open_as_*` function. `elemsrc` must
/// be valid for the handle's encoder.
#[no_mangle]
pub unsafe extern "C" fn fifo_produce(desc: FifoHandle, elemsrc: *const c_void) -> bool {
    crate::ffi_boundary(false, || {
        error::clear_error_state();

        with_handle_mut(desc, false, |handle| {
            let Some(encode) = handle.encoder else {
                let _ = error::set_invalid_argument("handle has no encoder");
                return false;
            };

            let attempt = handle.channel.try_write_with(|buf| {
                // SAFETY: `buf` is exactly one element; the caller vouches for `elemsrc`.
                unsafe { encode(elemsrc, buf.as_mut_ptr()) }
            });
            match attempt {
                Ok(Attempt::Complete(())) => true,
                Ok(_) => false,
                Err(err) => error::fatal("produce failed", &err, false),
            }
        })
    })
}

/// Attempt to receive one value into `elemdest`. Returns true when a whole
/// element arrived and was decoded.
///
/// # Safety
/// `desc` must be a handle from a `fifo_open_as_*` function. `elemdest` must
/// be valid for the handle's decoder.
#[no_mangle]
pub unsafe extern "C" fn fifo_consume(desc: FifoHandle, elemdest: *mut c_void) -> bool {
    crate::ffi_boundary(false, || {
        error::clear_error_state();

        with_handle_mut(desc, false, |handle| {
            let Some(decode) = handle.decoder else {
                let _ = error::set_invalid_argument("handle has no decoder");
                return false;
            };

            let attempt = handle.channel.try_read_with(|buf| {
                // SAFETY: `buf` is exactly one element; the caller vouches for `elemdest`.
                unsafe { decode(buf.as_ptr(), elemdest) }
            });
            match attempt {
                Ok(Attempt::Complete(())) => true,
                Ok(_) => false,
                Err(err) => error::fatal("consume failed", &err, false),
            }
        })
    })
}

/// Close the handle's descriptor and free the handle. The pipe file stays.
///
/// # Safety
/// `desc` must be null or a handle returned by this library, not used again.
#[no_mangle]
pub unsafe extern "C" fn fifo_close(desc: FifoHandle) -> FifoResult {
    crate::ffi_boundary(FifoResult::Internal, || {
        error::clear_error_state();
        if desc.is_null() {
            return FifoResult::Ok;
        }

        // SAFETY: Caller guarantees this handle was allocated by this library.
        let mut handle = unsafe { Box::from_raw(desc as *mut ChannelHandle) };
        match handle.channel.close() {
            Ok(()) => FifoResult::Ok,
            Err(err) => error::fatal("close failed", &err, error::result_code(&err)),
        }
    })
}

/// Close the descriptor, unlink the pipe file, and free the handle.
///
/// # Safety
/// `desc` must be null or a handle returned by this library, not used again.
#[no_mangle]
pub unsafe extern "C" fn fifo_destroy(desc: FifoHandle) -> FifoResult {
    crate::ffi_boundary(FifoResult::Internal, || {
        error::clear_error_state();
        if desc.is_null() {
            return FifoResult::Ok;
        }

        // SAFETY: Caller guarantees this handle was allocated by this library.
        let handle = unsafe { Box::from_raw(desc as *mut ChannelHandle) };
        match handle.channel.destroy() {
            Ok(()) => FifoResult::Ok,
            Err(err) => error::fatal("destroy failed", &err, error::result_code(&err)),
        }
    })
}
