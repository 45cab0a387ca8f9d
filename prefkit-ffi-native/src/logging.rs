//! Opt-in log output for host apps

use prefkit_ffi_support::{catch_panic, set_last_error};
use prefkit_store::ErrorKind;
use std::ffi::c_int;
use tracing_subscriber::EnvFilter;

/// Send library logs to stderr, filtered by `RUST_LOG` (default `info`).
///
/// Returns 0 on success, -1 if a global subscriber is already installed.
#[no_mangle]
pub extern "C" fn preferences_enable_logging() -> c_int {
    catch_panic(-1, || {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        match tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
        {
            Ok(()) => {
                tracing::debug!("prefkit logging enabled");
                0
            }
            Err(e) => {
                set_last_error(
                    ErrorKind::InvalidArgument.code(),
                    format!("Logging already initialized: {e}"),
                );
                -1
            }
        }
    })
}
