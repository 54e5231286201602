use std::cell::RefCell;
use std::ffi::CString;
use std::os::raw::c_char;
use std::sync::atomic::{AtomicBool, Ordering};

use fifoprims_element::ChannelError;
use tracing::error;

use crate::types::FifoResult;

thread_local! {
    static LAST_ERROR: RefCell<CString> = RefCell::new(CString::new("").expect("empty CString should be valid"));
}

/// Whether a fatal channel error terminates the process.
static ABORT_ON_FATAL: AtomicBool = AtomicBool::new(true);

pub(crate) fn clear_error_state() {
    LAST_ERROR.with(|state| {
        *state.borrow_mut() = CString::new("").expect("empty CString should be valid");
    });
}

pub(crate) fn set_error_message(message: impl Into<String>) {
    let message = message.into();
    let sanitized = message.replace('\0', "?");
    LAST_ERROR.with(|state| {
        *state.borrow_mut() = CString::new(sanitized)
            .unwrap_or_else(|_| CString::new("internal error").expect("literal is valid"));
    });
}

pub(crate) fn set_invalid_argument(message: impl Into<String>) -> FifoResult {
    set_error_message(message);
    FifoResult::InvalidArgument
}

pub(crate) fn set_panic_error() {
    set_error_message("panic across FFI boundary");
}

pub(crate) fn set_abort_on_fatal(enabled: bool) {
    ABORT_ON_FATAL.store(enabled, Ordering::SeqCst);
}

pub(crate) fn result_code(err: &ChannelError) -> FifoResult {
    match err {
        ChannelError::Lifecycle { .. } => FifoResult::TransportError,
        ChannelError::ZeroElementSize
        | ChannelError::SizeMismatch { .. }
        | ChannelError::WrongDirection { .. }
        | ChannelError::MissingEncoder { .. }
        | ChannelError::MissingDecoder { .. } => FifoResult::InvalidArgument,
        ChannelError::Read { .. } | ChannelError::Write { .. } => FifoResult::ChannelError,
    }
}

/// Handle a fatal channel error at the C boundary.
///
/// Records the message for [`last_error_ptr`]. Unless the host opted out
/// with `fifo_set_abort_on_fatal(false)`, the process then exits with
/// status 1 after printing the diagnostic. Otherwise `sentinel` is returned.
pub(crate) fn fatal<T>(context: &str, err: &ChannelError, sentinel: T) -> T {
    let message = format!("{context}: {err}");
    error!(%message, "fatal fifo error");
    set_error_message(message.as_str());

    if ABORT_ON_FATAL.load(Ordering::SeqCst) {
        eprintln!("fifoprims: {message}");
        std::process::exit(1);
    }
    sentinel
}

pub(crate) fn last_error_ptr() -> *const c_char {
    LAST_ERROR.with(|state| state.borrow().as_ptr())
}
