//! Durable storage backends
//!
//! A backend keeps one opaque blob per store name. Native builds write files
//! in a directory ([`FileBackend`]); browser builds with the `wasm` feature
//! use `localStorage` ([`LocalStorageBackend`]).

mod file;
#[cfg(feature = "wasm")]
mod local_storage;

pub use file::{FileBackend, StagedWrite};
#[cfg(feature = "wasm")]
pub use local_storage::LocalStorageBackend;

use crate::Result;
use std::sync::Arc;

/// Where saved stores live
///
/// Names reaching a backend have already passed
/// [`validate_name`](crate::validate_name).
pub trait Backend: Send + Sync {
    /// The saved blob, `None` when the store was never saved.
    fn read(&self, name: &str) -> Result<Option<Vec<u8>>>;

    /// Replace the saved blob. Readers see either the old or the new blob,
    /// never a mix.
    fn write(&self, name: &str, bytes: &[u8]) -> Result<()>;

    /// Delete the saved blob. Returns whether something was removed.
    fn remove(&self, name: &str) -> Result<bool>;

    /// Whether a saved blob exists
    fn exists(&self, name: &str) -> bool;

    /// Human-readable location of the blob, for logs
    fn location(&self, name: &str) -> String;
}

/// Backend for stores opened without an explicit location.
///
/// Browsers use `localStorage`; everything else uses files in the configured
/// [app directory](crate::app_dir()).
pub fn default_backend() -> Result<Arc<dyn Backend>> {
    #[cfg(all(feature = "wasm", target_arch = "wasm32"))]
    {
        Ok(Arc::new(LocalStorageBackend))
    }
    #[cfg(not(all(feature = "wasm", target_arch = "wasm32")))]
    {
        Ok(Arc::new(FileBackend::new(crate::app_dir::app_dir()?)))
    }
}
