//! Exported `preferences_*` functions
//!
//! Every function validates its pointers, runs under the panic guard, and
//! reports failures through the calling thread's error slot.

use crate::registry::{register, release, with_preferences};
use prefkit_ffi_support::{
    bytes_from_raw, catch_panic, fill_buffer, set_last_error, str_from_ptr, ArgumentError,
};
use prefkit_store::{self as store, Error, ErrorKind, Preferences, Result};
use std::ffi::{c_char, c_int, c_uchar, c_void};
use std::ptr;

/// Scalar read: value absent or of another type
const GET_NOT_FOUND: c_int = -1;
/// Scalar read: bad argument
const GET_INVALID: c_int = -2;

fn invalid(e: ArgumentError) -> Error {
    Error::InvalidArgument(e.to_string())
}

fn record(err: &Error) {
    set_last_error(err.kind().code(), err.to_string());
}

fn status(result: Result<()>) -> c_int {
    match result {
        Ok(()) => 0,
        Err(e) => {
            record(&e);
            -1
        }
    }
}

fn flag(result: Result<bool>) -> c_int {
    match result {
        Ok(true) => 1,
        Ok(false) => 0,
        Err(e) => {
            record(&e);
            -1
        }
    }
}

fn scalar(result: Result<()>) -> c_int {
    match result {
        Ok(()) => 0,
        Err(e) => {
            record(&e);
            if e.kind() == ErrorKind::NotFound {
                GET_NOT_FOUND
            } else {
                GET_INVALID
            }
        }
    }
}

/// Length-returning reads: absence and type mismatch report 0.
fn length(result: Result<i32>) -> c_int {
    match result {
        Ok(n) => n,
        Err(e) => {
            record(&e);
            if e.kind() == ErrorKind::NotFound {
                0
            } else {
                -1
            }
        }
    }
}

fn handle(result: Result<Preferences>) -> *mut c_void {
    match result.and_then(register) {
        Ok(ptr) => ptr,
        Err(e) => {
            record(&e);
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Application directory and store lifecycle
// ============================================================================

/// Set the directory stores are opened in.
///
/// A relative `name` resolves under the per-user configuration directory on
/// desktop; mobile platforms need an absolute, existing path. Returns 0 on
/// success, -1 on error.
///
/// # Safety
///
/// `name` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn set_preferences_app_dir(name: *const c_char) -> c_int {
    catch_panic(-1, || {
        status((|| -> Result<()> {
            // SAFETY: caller contract
            let name = unsafe { str_from_ptr(name, "name") }.map_err(invalid)?;
            store::set_app_dir(name).map(|_| ())
        })())
    })
}

/// True if a saved store called `name` exists. Never touches the error slot.
///
/// # Safety
///
/// `name` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn preferences_exist(name: *const c_char) -> bool {
    catch_panic(false, || {
        // SAFETY: caller contract
        match unsafe { str_from_ptr(name, "name") } {
            Ok(name) => store::exists(name),
            Err(_) => false,
        }
    })
}

/// Delete the saved store called `name`. Deleting a missing store is a no-op.
///
/// # Safety
///
/// `name` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn preferences_delete(name: *const c_char) {
    catch_panic((), || {
        // SAFETY: caller contract
        let result = unsafe { str_from_ptr(name, "name") }
            .map_err(invalid)
            .and_then(store::delete);
        if let Err(e) = result {
            record(&e);
        }
    })
}

/// Open or create the plain store `name`. Returns null on error.
///
/// # Safety
///
/// `name` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn preferences(name: *const c_char) -> *mut c_void {
    catch_panic(ptr::null_mut(), || {
        // SAFETY: caller contract
        let result = unsafe { str_from_ptr(name, "name") }
            .map_err(invalid)
            .and_then(Preferences::open);
        handle(result)
    })
}

/// Open or create the encrypted store `name`. Returns null on error; a
/// wrong password fails with the AuthenticationFailed code.
///
/// # Safety
///
/// `name` and `password` must be null or valid NUL-terminated strings.
#[no_mangle]
pub unsafe extern "C" fn encrypted_preferences(
    name: *const c_char,
    password: *const c_char,
) -> *mut c_void {
    catch_panic(ptr::null_mut(), || {
        handle((|| -> Result<Preferences> {
            // SAFETY: caller contract
            let name = unsafe { str_from_ptr(name, "name") }.map_err(invalid)?;
            let password = unsafe { str_from_ptr(password, "password") }.map_err(invalid)?;
            Preferences::open_encrypted(name, password)
        })())
    })
}

/// Release a handle without saving. Null is ignored; a stale or already
/// released handle is reported as InvalidArgument.
///
/// # Safety
///
/// `preferences` is compared against live handles and never dereferenced;
/// any value is accepted.
#[no_mangle]
pub unsafe extern "C" fn preferences_free(preferences: *mut c_void) {
    catch_panic((), || {
        if preferences.is_null() {
            return;
        }
        if let Err(e) = release(preferences) {
            record(&e);
        }
    })
}

// ============================================================================
// Typed access
// ============================================================================

/// Read an i32 into `out`.
///
/// Returns 0 on success, -1 if the key is absent or holds another type,
/// -2 on invalid arguments.
///
/// # Safety
///
/// `key` must be null or a valid NUL-terminated string; `out` must be null
/// or valid for writes.
#[no_mangle]
pub unsafe extern "C" fn preferences_get_i32(
    preferences: *const c_void,
    key: *const c_char,
    out: *mut i32,
) -> c_int {
    catch_panic(GET_INVALID, || {
        ffi_helpers::null_pointer_check!(out, GET_INVALID);
        scalar((|| -> Result<()> {
            // SAFETY: caller contract
            let key = unsafe { str_from_ptr(key, "key") }.map_err(invalid)?;
            let value = with_preferences(preferences, |p| p.get_i32(key))?;
            // SAFETY: non-null and writable per caller contract
            unsafe { out.write(value) };
            Ok(())
        })())
    })
}

/// Store an i32. Returns 0 on success, -1 on error.
///
/// # Safety
///
/// `key` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn preferences_put_i32(
    preferences: *mut c_void,
    key: *const c_char,
    value: i32,
) -> c_int {
    catch_panic(-1, || {
        status((|| -> Result<()> {
            // SAFETY: caller contract
            let key = unsafe { str_from_ptr(key, "key") }.map_err(invalid)?;
            with_preferences(preferences, |p| {
                p.put_i32(key, value);
                Ok(())
            })
        })())
    })
}

/// Read a bool into `out`.
///
/// Returns 0 on success, -1 if the key is absent or holds another type,
/// -2 on invalid arguments.
///
/// # Safety
///
/// `key` must be null or a valid NUL-terminated string; `out` must be null
/// or valid for writes.
#[no_mangle]
pub unsafe extern "C" fn preferences_get_bool(
    preferences: *const c_void,
    key: *const c_char,
    out: *mut bool,
) -> c_int {
    catch_panic(GET_INVALID, || {
        ffi_helpers::null_pointer_check!(out, GET_INVALID);
        scalar((|| -> Result<()> {
            // SAFETY: caller contract
            let key = unsafe { str_from_ptr(key, "key") }.map_err(invalid)?;
            let value = with_preferences(preferences, |p| p.get_bool(key))?;
            // SAFETY: non-null and writable per caller contract
            unsafe { out.write(value) };
            Ok(())
        })())
    })
}

/// Store a bool. Returns 0 on success, -1 on error.
///
/// # Safety
///
/// `key` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn preferences_put_bool(
    preferences: *mut c_void,
    key: *const c_char,
    value: bool,
) -> c_int {
    catch_panic(-1, || {
        status((|| -> Result<()> {
            // SAFETY: caller contract
            let key = unsafe { str_from_ptr(key, "key") }.map_err(invalid)?;
            with_preferences(preferences, |p| {
                p.put_bool(key, value);
                Ok(())
            })
        })())
    })
}

/// Copy a string value's UTF-8 bytes into `out_buf` (no terminator).
///
/// Returns the full byte length N and copies `min(N, buf_len)` bytes; pass
/// `buf_len == 0` to query the size. Returns 0 when the key is absent or holds
/// another type (NotFound is recorded) or the string is empty, and -1 on
/// invalid arguments.
///
/// # Safety
///
/// `key` must be null or a valid NUL-terminated string; `out_buf` must be
/// valid for writes of `buf_len` bytes, or null with `buf_len == 0`.
#[no_mangle]
pub unsafe extern "C" fn preferences_get_string(
    preferences: *const c_void,
    key: *const c_char,
    out_buf: *mut c_uchar,
    buf_len: usize,
) -> c_int {
    catch_panic(-1, || {
        length((|| -> Result<i32> {
            // SAFETY: caller contract
            let key = unsafe { str_from_ptr(key, "key") }.map_err(invalid)?;
            with_preferences(preferences, |p| {
                let value = p.get_str(key)?;
                // SAFETY: caller contract
                unsafe { fill_buffer(value.as_bytes(), out_buf, buf_len, "out_buf") }
                    .map_err(invalid)
            })
        })())
    })
}

/// Store a string. `value` must be valid UTF-8. Returns 0 on success, -1 on
/// error.
///
/// # Safety
///
/// `key` and `value` must be null or valid NUL-terminated strings.
#[no_mangle]
pub unsafe extern "C" fn preferences_put_string(
    preferences: *mut c_void,
    key: *const c_char,
    value: *const c_char,
) -> c_int {
    catch_panic(-1, || {
        status((|| -> Result<()> {
            // SAFETY: caller contract
            let key = unsafe { str_from_ptr(key, "key") }.map_err(invalid)?;
            let value = unsafe { str_from_ptr(value, "value") }.map_err(invalid)?;
            with_preferences(preferences, |p| p.put_str(key, value))
        })())
    })
}

/// Copy a byte value into `out_buf`. Same protocol as
/// [`preferences_get_string`].
///
/// # Safety
///
/// `key` must be null or a valid NUL-terminated string; `out_buf` must be
/// valid for writes of `buf_len` bytes, or null with `buf_len == 0`.
#[no_mangle]
pub unsafe extern "C" fn preferences_get_bytes(
    preferences: *const c_void,
    key: *const c_char,
    out_buf: *mut u8,
    buf_len: usize,
) -> c_int {
    catch_panic(-1, || {
        length((|| -> Result<i32> {
            // SAFETY: caller contract
            let key = unsafe { str_from_ptr(key, "key") }.map_err(invalid)?;
            with_preferences(preferences, |p| {
                let value = p.get_bytes(key)?;
                // SAFETY: caller contract
                unsafe { fill_buffer(value, out_buf, buf_len, "out_buf") }.map_err(invalid)
            })
        })())
    })
}

/// Store `len` bytes from `value`. `value` may be null only when `len` is 0.
/// Returns 0 on success, -1 on error.
///
/// # Safety
///
/// `key` must be null or a valid NUL-terminated string; `value` must be
/// valid for reads of `len` bytes, or null with `len == 0`.
#[no_mangle]
pub unsafe extern "C" fn preferences_put_bytes(
    preferences: *mut c_void,
    key: *const c_char,
    value: *const u8,
    len: usize,
) -> c_int {
    catch_panic(-1, || {
        status((|| -> Result<()> {
            // SAFETY: caller contract
            let key = unsafe { str_from_ptr(key, "key") }.map_err(invalid)?;
            let value = unsafe { bytes_from_raw(value, len, "value") }.map_err(invalid)?;
            with_preferences(preferences, |p| p.put_bytes(key, value))
        })())
    })
}

/// 1 if `key` is present, 0 if not, -1 on error.
///
/// # Safety
///
/// `key` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn preferences_contains(
    preferences: *const c_void,
    key: *const c_char,
) -> c_int {
    catch_panic(-1, || {
        flag((|| -> Result<bool> {
            // SAFETY: caller contract
            let key = unsafe { str_from_ptr(key, "key") }.map_err(invalid)?;
            with_preferences(preferences, |p| Ok(p.contains_key(key)))
        })())
    })
}

/// Remove `key`. 1 if it was present, 0 if not, -1 on error.
///
/// # Safety
///
/// `key` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn preferences_remove(preferences: *mut c_void, key: *const c_char) -> c_int {
    catch_panic(-1, || {
        flag((|| -> Result<bool> {
            // SAFETY: caller contract
            let key = unsafe { str_from_ptr(key, "key") }.map_err(invalid)?;
            with_preferences(preferences, |p| Ok(p.remove(key).is_some()))
        })())
    })
}

// ============================================================================
// Persistence
// ============================================================================

/// Empty the in-memory map; the saved file is untouched until the next save.
/// Returns 0 on success, -1 on error.
///
/// # Safety
///
/// `preferences` is never dereferenced; any value is accepted.
#[no_mangle]
pub unsafe extern "C" fn preferences_clear(preferences: *mut c_void) -> c_int {
    catch_panic(-1, || {
        status(with_preferences(preferences, |p| {
            p.clear();
            Ok(())
        }))
    })
}

/// Delete the saved file now and empty the map. Returns 0 on success, -1 on
/// error (the store is then unchanged).
///
/// # Safety
///
/// `preferences` is never dereferenced; any value is accepted.
#[no_mangle]
pub unsafe extern "C" fn preferences_erase(preferences: *mut c_void) -> c_int {
    catch_panic(-1, || status(with_preferences(preferences, Preferences::erase)))
}

/// Atomically write the store to disk. Returns 0 on success, -1 on error.
///
/// # Safety
///
/// `preferences` is never dereferenced; any value is accepted.
#[no_mangle]
pub unsafe extern "C" fn preferences_save(preferences: *mut c_void) -> c_int {
    catch_panic(-1, || status(with_preferences(preferences, Preferences::save)))
}
