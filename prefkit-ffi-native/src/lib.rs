//! C ABI for prefkit preferences
//!
//! Opaque handles from [`api::preferences`] / [`api::encrypted_preferences`]
//! index a process-wide registry; see `include/prefkit.h` for the C
//! declarations. Failures return a sentinel and leave a code and message in
//! the calling thread's error slot.

#![warn(missing_docs)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod api;
pub mod logging;
pub mod registry;

prefkit_ffi_support::export_error_channel!();
