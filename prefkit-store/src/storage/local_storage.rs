//! Browser `localStorage` backend
//!
//! `localStorage` only holds strings, so each store is one item keyed by the
//! store name whose value is the base64 encoded blob. `setItem` replaces an
//! item in one step, which gives the same old-or-new guarantee as the file
//! backend's rename.

use super::Backend;
use crate::{Error, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::io;
use web_sys::Storage;

/// Stores as items in the page's `localStorage`
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LocalStorageBackend;

fn unsupported(message: &str) -> Error {
    Error::Io(io::Error::new(io::ErrorKind::Unsupported, message.to_string()))
}

fn js_failure(operation: &str, err: wasm_bindgen::JsValue) -> Error {
    Error::Io(io::Error::new(
        io::ErrorKind::Other,
        format!("localStorage {operation} failed: {err:?}"),
    ))
}

fn storage() -> Result<Storage> {
    let window = web_sys::window().ok_or_else(|| unsupported("global `window` object not found"))?;
    window
        .local_storage()
        .map_err(|_| unsupported("localStorage is not accessible"))?
        .ok_or_else(|| unsupported("localStorage is not available"))
}

impl Backend for LocalStorageBackend {
    fn read(&self, name: &str) -> Result<Option<Vec<u8>>> {
        let item = storage()?
            .get_item(name)
            .map_err(|e| js_failure("read", e))?;
        match item {
            Some(encoded) => STANDARD
                .decode(encoded)
                .map(Some)
                .map_err(|e| Error::Serialization(format!("stored item is not base64: {e}"))),
            None => Ok(None),
        }
    }

    fn write(&self, name: &str, bytes: &[u8]) -> Result<()> {
        storage()?
            .set_item(name, &STANDARD.encode(bytes))
            .map_err(|e| js_failure("write", e))
    }

    fn remove(&self, name: &str) -> Result<bool> {
        let storage = storage()?;
        let present = storage
            .get_item(name)
            .map_err(|e| js_failure("read", e))?
            .is_some();
        if present {
            storage
                .remove_item(name)
                .map_err(|e| js_failure("remove", e))?;
        }
        Ok(present)
    }

    /// An empty item counts as absent.
    fn exists(&self, name: &str) -> bool {
        storage()
            .and_then(|s| s.get_item(name).map_err(|e| js_failure("read", e)))
            .map(|item| item.is_some_and(|encoded| !encoded.is_empty()))
            .unwrap_or(false)
    }

    fn location(&self, name: &str) -> String {
        format!("localStorage[{name:?}]")
    }
}
