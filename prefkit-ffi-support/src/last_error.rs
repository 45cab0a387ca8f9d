//! Per-thread last error slot
//!
//! The slot itself is `ffi_helpers`' thread-local error. Failures are stored
//! as [`LastError`] so the numeric code survives next to the message.
//! Failing calls overwrite the slot; successful calls leave it alone.

use ffi_helpers::error_handling;
use ffi_helpers::panic::Panic;
use std::ffi::{c_char, c_int};
use std::ptr;

/// Code recorded when a panic is caught at the boundary
pub const INTERNAL_ERROR_CODE: i32 = 99;

/// Code for errors recorded without one, such as `ffi_helpers`' null pointer
/// checks
pub const INVALID_ARGUMENT_CODE: i32 = 1;

/// A failure as the C caller sees it
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct LastError {
    code: i32,
    message: String,
}

impl LastError {
    /// Error with an explicit code
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Numeric error kind
    pub fn code(&self) -> i32 {
        self.code
    }
}

fn code_of(err: &anyhow::Error) -> i32 {
    if let Some(e) = err.downcast_ref::<LastError>() {
        e.code
    } else if err.downcast_ref::<Panic>().is_some() {
        INTERNAL_ERROR_CODE
    } else {
        INVALID_ARGUMENT_CODE
    }
}

/// Record a failure for the calling thread, replacing any previous one.
pub fn set_last_error(code: i32, message: impl Into<String>) {
    let error = LastError::new(code, message);
    tracing::debug!("FFI call failed (code {}): {}", error.code, error.message);
    error_handling::update_last_error(error);
}

/// Empty the calling thread's slot.
pub fn clear_last_error() {
    error_handling::clear_last_error();
}

/// Code of the stored error, 0 if none.
pub fn last_error_code() -> i32 {
    match error_handling::take_last_error() {
        Some(err) => {
            let code = code_of(&err);
            error_handling::update_last_error(err);
            code
        }
        None => 0,
    }
}

/// Byte length of the stored message, 0 if none.
pub fn last_error_length() -> i32 {
    last_error_message().map_or(0, |m| i32::try_from(m.len()).unwrap_or(i32::MAX))
}

/// Copy of the stored message
pub fn last_error_message() -> Option<String> {
    error_handling::error_message()
}

/// Copy up to `size` bytes of the stored message into `buf`.
///
/// Unlike `ffi_helpers::error_handling::error_message_utf8`, a short buffer
/// gets a truncated message rather than an error. A NUL terminator follows
/// the copied bytes when there is room for it. Returns the number of message
/// bytes copied (0 if no error is stored), or -1 if `buf` is null or `size`
/// is negative.
///
/// # Safety
///
/// `buf` must be null or valid for writes of `size` bytes.
pub unsafe fn copy_last_error_message(buf: *mut c_char, size: c_int) -> c_int {
    if buf.is_null() || size < 0 {
        return -1;
    }
    let capacity = size as usize;

    let message = last_error_message().unwrap_or_default();
    let copied = message.len().min(capacity);

    // SAFETY: `buf` is valid for `capacity` bytes and `copied <= capacity`
    unsafe {
        ptr::copy_nonoverlapping(message.as_ptr(), buf.cast::<u8>(), copied);
        if copied < capacity {
            *buf.add(copied) = 0;
        }
    }

    // copied <= size, which fits in c_int
    copied as c_int
}
