//! prefkit store engine
//!
//! Named key-value preference stores with typed values, optional password
//! encryption (Argon2id + ChaCha20-Poly1305 / AES-256-GCM) and crash-safe
//! atomic saves. Stores live in files by default, or in browser
//! `localStorage` with the `wasm` feature on `wasm32`.
//!
//! ```no_run
//! use prefkit_store::{set_app_dir, Preferences};
//!
//! set_app_dir("my-app")?;
//! let mut prefs = Preferences::open("settings")?;
//! prefs.put_i32("launch_count", 1);
//! prefs.save()?;
//! # Ok::<(), prefkit_store::Error>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod app_dir;
pub mod crypto;
pub mod error;
pub mod format;
pub mod preferences;
pub mod storage;
pub mod value;

pub use app_dir::{app_dir, reset_app_dir, resolve_app_dir, set_app_dir};
pub use crypto::{EncryptionAlgorithm, KdfParams};
pub use error::{Error, ErrorKind, Result};
pub use preferences::{
    delete, delete_in, delete_on, exists, exists_in, exists_on, validate_name,
    EncryptionOptions, Preferences,
};
#[cfg(feature = "wasm")]
pub use storage::LocalStorageBackend;
pub use storage::{default_backend, Backend, FileBackend};
pub use value::{PreferenceValue, ValueKind};
