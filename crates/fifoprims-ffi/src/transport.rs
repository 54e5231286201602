use std::ffi::{CStr, OsStr};
use std::os::raw::c_char;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use crate::error;

/// Convert a required C string argument into a filesystem path.
///
/// Paths are taken as raw bytes, so non-UTF-8 names are accepted.
///
/// # Safety
/// `value` must be null or point to a valid NUL-terminated C string.
pub(crate) unsafe fn required_path_arg<'a>(value: *const c_char, name: &str) -> Option<&'a Path> {
    if value.is_null() {
        let _ = error::set_invalid_argument(format!("{name} cannot be null"));
        return None;
    }

    let as_cstr = {
        // SAFETY: The caller guarantees `value` points to a valid NUL-terminated C string.
        unsafe { CStr::from_ptr(value) }
    };

    if as_cstr.to_bytes().is_empty() {
        let _ = error::set_invalid_argument(format!("{name} cannot be empty"));
        return None;
    }

    Some(Path::new(OsStr::from_bytes(as_cstr.to_bytes())))
}

/// Validate an element size coming from C.
///
/// BDPI reports the size back in a 32-bit word, so it must fit one.
pub(crate) fn element_size_arg(bytesize: usize) -> Option<usize> {
    if bytesize == 0 {
        let _ = error::set_invalid_argument("bytesize must be greater than zero");
        return None;
    }
    if u32::try_from(bytesize).is_err() {
        let _ = error::set_invalid_argument("bytesize must fit in 32 bits");
        return None;
    }
    Some(bytesize)
}
