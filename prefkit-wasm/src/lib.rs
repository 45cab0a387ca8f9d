//! JavaScript bindings for prefkit
//!
//! Exposes a `Preferences` class backed by the page's `localStorage`:
//!
//! ```js
//! import init, { preferences, encryptedPreferences, exist } from "prefkit_wasm";
//!
//! await init();
//! const prefs = preferences("settings");
//! prefs.putI32("launchCount", (prefs.getI32("launchCount") ?? 0) + 1);
//! prefs.save();
//! ```
//!
//! Getters return `undefined` when the key is absent or holds another type.
//! Failures are thrown as strings of the form `"<Kind>: <message>"`.

pub mod error;

pub use error::{PreferencesError, PreferencesResult};

use prefkit_store::{default_backend, EncryptionOptions};
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
}

/// A named store held in memory until `save()`
#[derive(Debug)]
#[wasm_bindgen(js_name = Preferences)]
pub struct PreferencesHandle {
    inner: prefkit_store::Preferences,
}

#[wasm_bindgen(js_class = Preferences)]
impl PreferencesHandle {
    /// Store name
    #[wasm_bindgen(getter)]
    pub fn name(&self) -> String {
        self.inner.name().to_string()
    }

    /// Whether the store is password protected
    #[wasm_bindgen(getter, js_name = isEncrypted)]
    pub fn is_encrypted(&self) -> bool {
        self.inner.is_encrypted()
    }

    #[wasm_bindgen(js_name = getI32)]
    pub fn get_i32(&self, key: &str) -> Option<i32> {
        self.inner.get_i32(key).ok()
    }

    #[wasm_bindgen(js_name = putI32)]
    pub fn put_i32(&mut self, key: &str, value: i32) {
        self.inner.put_i32(key, value);
    }

    #[wasm_bindgen(js_name = getBool)]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.inner.get_bool(key).ok()
    }

    #[wasm_bindgen(js_name = putBool)]
    pub fn put_bool(&mut self, key: &str, value: bool) {
        self.inner.put_bool(key, value);
    }

    #[wasm_bindgen(js_name = getStr)]
    pub fn get_str(&self, key: &str) -> Option<String> {
        self.inner.get_str(key).ok().map(str::to_string)
    }

    #[wasm_bindgen(js_name = putStr)]
    pub fn put_str(&mut self, key: &str, value: &str) -> PreferencesResult<()> {
        Ok(self.inner.put_str(key, value)?)
    }

    /// Copy of a byte value as a `Uint8Array`
    #[wasm_bindgen(js_name = getBytes)]
    pub fn get_bytes(&self, key: &str) -> Option<Vec<u8>> {
        self.inner.get_bytes(key).ok().map(<[u8]>::to_vec)
    }

    #[wasm_bindgen(js_name = putBytes)]
    pub fn put_bytes(&mut self, key: &str, value: &[u8]) -> PreferencesResult<()> {
        Ok(self.inner.put_bytes(key, value)?)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    /// Remove `key`. Returns whether it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        self.inner.remove(key).is_some()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.inner.keys().map(str::to_string).collect();
        keys.sort_unstable();
        keys
    }

    /// Empty the store in memory. Storage is untouched until `save()`.
    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Remove the saved item and empty the store.
    pub fn erase(&mut self) -> PreferencesResult<()> {
        Ok(self.inner.erase()?)
    }

    /// Write the store to `localStorage`.
    pub fn save(&mut self) -> PreferencesResult<()> {
        Ok(self.inner.save()?)
    }
}

/// Open or create the plain store `name`.
#[wasm_bindgen]
pub fn preferences(name: &str) -> PreferencesResult<PreferencesHandle> {
    let inner = prefkit_store::Preferences::open_on(default_backend()?, name)?;
    Ok(PreferencesHandle { inner })
}

/// Open or create the encrypted store `name`.
#[wasm_bindgen(js_name = encryptedPreferences)]
pub fn encrypted_preferences(name: &str, password: &str) -> PreferencesResult<PreferencesHandle> {
    let inner = prefkit_store::Preferences::open_encrypted_on(
        default_backend()?,
        name,
        password,
        EncryptionOptions::default(),
    )?;
    Ok(PreferencesHandle { inner })
}

/// Whether a saved store called `name` exists
#[wasm_bindgen]
pub fn exist(name: &str) -> bool {
    prefkit_store::exists(name)
}

/// Delete the saved store `name`. Deleting a missing store succeeds.
#[wasm_bindgen(js_name = deletePreferences)]
pub fn delete_preferences(name: &str) -> PreferencesResult<()> {
    Ok(prefkit_store::delete(name)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // Outside the browser the default backend is the app directory, so the
    // bindings can be driven natively. Error paths build JS values and only
    // run under wasm-bindgen-test.
    #[test]
    fn test_bindings_round_trip_natively() {
        let dir = TempDir::new().unwrap();
        prefkit_store::set_app_dir(dir.path().to_str().unwrap()).unwrap();

        assert!(!exist("settings"));
        let mut prefs = preferences("settings").unwrap();
        assert_eq!(prefs.name(), "settings");
        assert!(!prefs.is_encrypted());

        prefs.put_i32("count", 3);
        prefs.put_bool("dark", true);
        prefs.put_str("user", "ada").unwrap();
        prefs.put_bytes("seed", &[1, 2, 3]).unwrap();
        assert_eq!(prefs.get_str("count"), None);
        prefs.save().unwrap();
        assert!(exist("settings"));

        let mut prefs = preferences("settings").unwrap();
        assert_eq!(prefs.get_i32("count"), Some(3));
        assert_eq!(prefs.get_bool("dark"), Some(true));
        assert_eq!(prefs.get_str("user").as_deref(), Some("ada"));
        assert_eq!(prefs.get_bytes("seed"), Some(vec![1, 2, 3]));
        assert_eq!(prefs.keys(), ["count", "dark", "seed", "user"]);

        assert!(prefs.remove("dark"));
        assert!(!prefs.contains("dark"));
        prefs.clear();
        assert!(prefs.keys().is_empty());
        prefs.erase().unwrap();
        assert!(!exist("settings"));

        delete_preferences("settings").unwrap();
        prefkit_store::reset_app_dir();
    }
}
