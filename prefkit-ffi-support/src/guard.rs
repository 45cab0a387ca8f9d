//! Panic containment at the C boundary

use crate::last_error::{set_last_error, INTERNAL_ERROR_CODE};
use ffi_helpers::error_handling;
use std::panic::AssertUnwindSafe;

/// Run `f`, turning a panic into an internal error and `sentinel`.
///
/// Unwinding into foreign frames is undefined behaviour, so every exported
/// function body goes through here.
pub fn catch_panic<T>(sentinel: T, f: impl FnOnce() -> T) -> T {
    match ffi_helpers::catch_panic(AssertUnwindSafe(|| Ok::<T, anyhow::Error>(f()))) {
        Ok(value) => value,
        Err(()) => {
            // ffi_helpers recorded the payload as a `Panic`; re-record it with its code
            let message = error_handling::take_last_error()
                .map_or_else(|| "unknown panic".to_string(), |err| format!("{err:#}"));
            tracing::error!("Panic caught at FFI boundary: {}", message);
            set_last_error(INTERNAL_ERROR_CODE, format!("Internal error: {message}"));
            sentinel
        }
    }
}
