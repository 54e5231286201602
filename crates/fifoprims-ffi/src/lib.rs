//! fifoprims-ffi: C-ABI exports for fifoprims channels and the BDPI simulator adapter.

#[cfg(not(unix))]
compile_error!("fifoprims-ffi requires a Unix target");

mod api;
mod bdpi;
mod error;
mod transport;
mod types;

use std::panic::AssertUnwindSafe;

pub use api::{
    fifo_close, fifo_consume, fifo_destroy, fifo_open_as_consumer, fifo_open_as_producer,
    fifo_open_as_producer_consumer, fifo_produce,
};
pub use bdpi::{fifo_bdpi_create, fifo_bdpi_read, fifo_bdpi_write};
pub use types::{
    FifoDecodeFn, FifoEncodeFn, FifoHandle, FifoResult, FIFO_BDPI_HEADER_BYTES, FIFO_ERR_CHANNEL,
    FIFO_ERR_INTERNAL, FIFO_ERR_INVALID_ARGUMENT, FIFO_ERR_TRANSPORT, FIFO_OK,
};

fn ffi_boundary<T>(on_panic: T, f: impl FnOnce() -> T) -> T {
    match std::panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(_) => {
            error::set_panic_error();
            on_panic
        }
    }
}

#[no_mangle]
pub extern "C" fn fifo_init() -> FifoResult {
    ffi_boundary(FifoResult::Internal, || {
        error::clear_error_state();
        FifoResult::Ok
    })
}

#[no_mangle]
pub extern "C" fn fifo_cleanup() {
    ffi_boundary((), || {
        error::clear_error_state();
    });
}

#[no_mangle]
pub extern "C" fn fifo_last_error() -> *const std::os::raw::c_char {
    ffi_boundary(std::ptr::null(), error::last_error_ptr)
}

/// Choose what a fatal I/O error does.
///
/// Enabled (the default), the process prints the error and exits with
/// status 1. Disabled, the failing call returns its failure value and the
/// message is available from `fifo_last_error`.
#[no_mangle]
pub extern "C" fn fifo_set_abort_on_fatal(enabled: bool) {
    ffi_boundary((), || error::set_abort_on_fatal(enabled));
}
