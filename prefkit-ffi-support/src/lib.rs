//! Shared plumbing for prefkit C ABI crates
//!
//! Every FFI crate reports failures through the same per-thread error slot
//! (`ffi_helpers`' last error), so a host app reads errors the same way
//! whichever library failed. The [`export_error_channel!`] macro emits the C
//! accessors for that slot.

#![warn(missing_docs)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod buffers;
pub mod guard;
pub mod last_error;

pub use buffers::{bytes_from_raw, fill_buffer, str_from_ptr, ArgumentError};
pub use guard::catch_panic;
pub use last_error::{
    clear_last_error, copy_last_error_message, last_error_code, last_error_length,
    last_error_message, set_last_error, LastError, INTERNAL_ERROR_CODE, INVALID_ARGUMENT_CODE,
};

/// Export `clear_last_error`, `last_error_length`, `error_message_utf8` and
/// `last_error_code` as C symbols. Invoke once per linked library.
#[macro_export]
macro_rules! export_error_channel {
    () => {
        /// Empty the calling thread's error slot.
        #[no_mangle]
        pub extern "C" fn clear_last_error() {
            $crate::last_error::clear_last_error();
        }

        /// UTF-8 byte length of the calling thread's error message, 0 if none.
        #[no_mangle]
        pub extern "C" fn last_error_length() -> ::std::ffi::c_int {
            $crate::last_error::last_error_length()
        }

        /// Numeric kind of the calling thread's error, 0 if none.
        #[no_mangle]
        pub extern "C" fn last_error_code() -> ::std::ffi::c_int {
            $crate::last_error::last_error_code()
        }

        /// Copy the calling thread's error message into `buf`.
        ///
        /// Returns the number of bytes copied, or -1 if `buf` is null or
        /// `size` is negative.
        ///
        /// # Safety
        ///
        /// `buf` must be null or valid for writes of `size` bytes.
        #[no_mangle]
        pub unsafe extern "C" fn error_message_utf8(
            buf: *mut ::std::ffi::c_char,
            size: ::std::ffi::c_int,
        ) -> ::std::ffi::c_int {
            // SAFETY: forwarded caller contract
            unsafe { $crate::last_error::copy_last_error_message(buf, size) }
        }
    };
}
