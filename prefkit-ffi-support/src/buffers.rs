//! Conversions between C arguments and Rust values

use std::ffi::{c_char, CStr};
use std::ptr;
use std::slice;
use std::str::Utf8Error;

/// A C argument that could not be turned into a Rust value
#[derive(Debug, thiserror::Error)]
pub enum ArgumentError {
    /// Required pointer was null
    #[error("`{0}` must not be null")]
    Null(&'static str),

    /// String argument was not UTF-8
    #[error("`{name}` is not valid UTF-8: {source}")]
    InvalidUtf8 {
        /// Argument name
        name: &'static str,
        /// Decoder error
        source: Utf8Error,
    },

    /// Null buffer paired with a non-zero length
    #[error("`{name}` is null but its length is {len}")]
    NullBuffer {
        /// Argument name
        name: &'static str,
        /// Claimed length
        len: usize,
    },

    /// Value length does not fit the `int` return type
    #[error("`{name}` is {len} bytes, larger than the C return type allows")]
    TooLarge {
        /// Value name
        name: &'static str,
        /// Actual length
        len: usize,
    },
}

/// Borrow a NUL-terminated UTF-8 string.
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string that stays valid
/// and unmodified for `'a`.
pub unsafe fn str_from_ptr<'a>(
    ptr: *const c_char,
    name: &'static str,
) -> Result<&'a str, ArgumentError> {
    if ptr.is_null() {
        return Err(ArgumentError::Null(name));
    }
    // SAFETY: non-null and NUL-terminated per the caller contract
    let c_str = unsafe { CStr::from_ptr(ptr) };
    c_str
        .to_str()
        .map_err(|source| ArgumentError::InvalidUtf8 { name, source })
}

/// Borrow `len` bytes. A null pointer is accepted only when `len` is 0.
///
/// # Safety
///
/// When non-null, `ptr` must be valid for reads of `len` bytes for `'a`.
pub unsafe fn bytes_from_raw<'a>(
    ptr: *const u8,
    len: usize,
    name: &'static str,
) -> Result<&'a [u8], ArgumentError> {
    if ptr.is_null() {
        return if len == 0 {
            Ok(&[])
        } else {
            Err(ArgumentError::NullBuffer { name, len })
        };
    }
    // SAFETY: non-null and valid for `len` bytes per the caller contract
    Ok(unsafe { slice::from_raw_parts(ptr, len) })
}

/// Two-phase buffer fill.
///
/// Copies `min(src.len(), out_len)` bytes into `out` and returns the full
/// length of `src`, so callers can size a buffer with `out_len == 0` and then
/// call again. `out` may be null only when `out_len` is 0.
///
/// # Safety
///
/// When non-null, `out` must be valid for writes of `out_len` bytes.
pub unsafe fn fill_buffer(
    src: &[u8],
    out: *mut u8,
    out_len: usize,
    name: &'static str,
) -> Result<i32, ArgumentError> {
    if out.is_null() && out_len != 0 {
        return Err(ArgumentError::NullBuffer { name, len: out_len });
    }
    let total = i32::try_from(src.len()).map_err(|_| ArgumentError::TooLarge {
        name,
        len: src.len(),
    })?;

    let copied = src.len().min(out_len);
    if copied > 0 {
        // SAFETY: `out` is non-null here and valid for `out_len >= copied` bytes
        unsafe { ptr::copy_nonoverlapping(src.as_ptr(), out, copied) };
    }
    Ok(total)
}
