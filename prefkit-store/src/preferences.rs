//! Named preference stores
//!
//! A [`Preferences`] is an in-memory map loaded from one file. Mutations stay
//! in memory until [`Preferences::save`]; dropping a store never writes.

use crate::crypto::{
    generate_nonce, generate_salt, EncryptionAlgorithm, KdfParams, StoreKey, SALT_LEN,
};
use crate::format::{self, EncryptedHeader, Envelope};
use crate::storage::{default_backend, Backend, FileBackend};
use crate::value::{PreferenceValue, ValueKind};
use crate::{Error, Result};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use zeroize::Zeroizing;

/// Check a store name: non-empty, ASCII alphanumerics, `-` and `_` only.
pub fn validate_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidName(name.to_string()))
    }
}

/// True when a saved store called `name` exists in the default location.
///
/// Invalid names and an unset app directory both answer `false`.
pub fn exists(name: &str) -> bool {
    match default_backend() {
        Ok(backend) => exists_on(backend.as_ref(), name),
        Err(_) => false,
    }
}

/// [`exists`] against an explicit directory.
pub fn exists_in(dir: &Path, name: &str) -> bool {
    exists_on(&FileBackend::new(dir), name)
}

/// [`exists`] against an explicit backend.
pub fn exists_on(backend: &dyn Backend, name: &str) -> bool {
    validate_name(name).is_ok() && backend.exists(name)
}

/// Remove the saved store called `name` from the default location.
///
/// Removing a store that was never saved succeeds.
pub fn delete(name: &str) -> Result<()> {
    validate_name(name)?;
    delete_on(default_backend()?.as_ref(), name)
}

/// [`delete`] against an explicit directory.
pub fn delete_in(dir: &Path, name: &str) -> Result<()> {
    delete_on(&FileBackend::new(dir), name)
}

/// [`delete`] against an explicit backend.
pub fn delete_on(backend: &dyn Backend, name: &str) -> Result<()> {
    validate_name(name)?;
    if backend.remove(name)? {
        tracing::debug!("Deleted preferences {}", backend.location(name));
    }
    Ok(())
}

/// Cipher and KDF choice for newly created encrypted stores.
///
/// Existing stores always reopen with the settings recorded in their header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncryptionOptions {
    /// Argon2id costs
    pub kdf: KdfParams,
    /// Body cipher
    pub algorithm: EncryptionAlgorithm,
}

struct EncryptionContext {
    key: StoreKey,
    salt: [u8; SALT_LEN],
    kdf: KdfParams,
}

impl EncryptionContext {
    fn create(password: &str, options: EncryptionOptions) -> Result<Self> {
        let salt = generate_salt();
        let key = StoreKey::derive(password.as_bytes(), &salt, options.kdf, options.algorithm)?;
        Ok(Self {
            key,
            salt,
            kdf: options.kdf,
        })
    }
}

/// A named, optionally encrypted key-value store
pub struct Preferences {
    name: String,
    backend: Arc<dyn Backend>,
    entries: HashMap<String, PreferenceValue>,
    encryption: Option<EncryptionContext>,
    dirty: bool,
}

impl Preferences {
    /// Open or create the plain store `name` in the default location.
    pub fn open(name: &str) -> Result<Self> {
        validate_name(name)?;
        Self::open_on(default_backend()?, name)
    }

    /// Open or create the plain store `name` in `dir`.
    ///
    /// Nothing is written until [`Preferences::save`].
    pub fn open_in(dir: &Path, name: &str) -> Result<Self> {
        Self::open_on(Arc::new(FileBackend::new(dir)), name)
    }

    /// Open or create the plain store `name` on `backend`.
    pub fn open_on(backend: Arc<dyn Backend>, name: &str) -> Result<Self> {
        Self::load(backend, name, None)
    }

    /// Open or create the encrypted store `name` in the default location.
    pub fn open_encrypted(name: &str, password: &str) -> Result<Self> {
        validate_name(name)?;
        Self::open_encrypted_on(default_backend()?, name, password, EncryptionOptions::default())
    }

    /// Open or create the encrypted store `name` in `dir` with default options.
    pub fn open_encrypted_in(dir: &Path, name: &str, password: &str) -> Result<Self> {
        Self::open_encrypted_with(dir, name, password, EncryptionOptions::default())
    }

    /// Open or create the encrypted store `name` in `dir`.
    ///
    /// `options` only apply when the store is created.
    pub fn open_encrypted_with(
        dir: &Path,
        name: &str,
        password: &str,
        options: EncryptionOptions,
    ) -> Result<Self> {
        Self::open_encrypted_on(Arc::new(FileBackend::new(dir)), name, password, options)
    }

    /// Open or create the encrypted store `name` on `backend`.
    pub fn open_encrypted_on(
        backend: Arc<dyn Backend>,
        name: &str,
        password: &str,
        options: EncryptionOptions,
    ) -> Result<Self> {
        Self::load(backend, name, Some((password, options)))
    }

    fn load(
        backend: Arc<dyn Backend>,
        name: &str,
        password: Option<(&str, EncryptionOptions)>,
    ) -> Result<Self> {
        validate_name(name)?;

        let raw = backend.read(name)?;
        let (entries, encryption) = match raw {
            Some(bytes) if !bytes.is_empty() => Self::decode(name, &bytes, password)?,
            existing => {
                if existing.is_some() {
                    tracing::warn!(
                        "Preferences {} are empty, starting fresh",
                        backend.location(name)
                    );
                }
                let encryption = match password {
                    Some((password, options)) => {
                        Some(EncryptionContext::create(password, options)?)
                    }
                    None => None,
                };
                (HashMap::new(), encryption)
            }
        };

        tracing::debug!(
            "Opened preferences `{}` ({} entries, encrypted: {})",
            name,
            entries.len(),
            encryption.is_some()
        );

        Ok(Self {
            name: name.to_string(),
            backend,
            entries,
            encryption,
            dirty: false,
        })
    }

    fn decode(
        name: &str,
        bytes: &[u8],
        password: Option<(&str, EncryptionOptions)>,
    ) -> Result<(HashMap<String, PreferenceValue>, Option<EncryptionContext>)> {
        match (format::decode(bytes)?, password) {
            (Envelope::Plain { body }, None) => Ok((format::decode_body(body)?, None)),
            (
                Envelope::Encrypted {
                    header,
                    aad,
                    ciphertext,
                },
                Some((password, _)),
            ) => {
                let key = StoreKey::derive(
                    password.as_bytes(),
                    &header.salt,
                    header.kdf,
                    header.algorithm,
                )?;
                let plaintext = key.open(&header.nonce, ciphertext, aad)?;
                let entries = format::decode_body(&plaintext)?;
                Ok((
                    entries,
                    Some(EncryptionContext {
                        key,
                        salt: header.salt,
                        kdf: header.kdf,
                    }),
                ))
            }
            (envelope, requested) => Err(Error::ProtectionMismatch {
                name: name.to_string(),
                actual: envelope.protection(),
                requested: if requested.is_some() {
                    "encrypted"
                } else {
                    "plain"
                },
            }),
        }
    }

    /// Store name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Where the store is saved, e.g. its file path
    pub fn location(&self) -> String {
        self.backend.location(&self.name)
    }

    /// Whether the store is password protected
    pub fn is_encrypted(&self) -> bool {
        self.encryption.is_some()
    }

    /// Cipher of an encrypted store
    pub fn encryption_algorithm(&self) -> Option<EncryptionAlgorithm> {
        self.encryption.as_ref().map(|ctx| ctx.key.algorithm())
    }

    /// Whether there are unsaved changes
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn mismatch(key: &str, expected: ValueKind, found: &PreferenceValue) -> Error {
        Error::TypeMismatch {
            key: key.to_string(),
            expected,
            found: found.kind(),
        }
    }

    fn lookup(&self, key: &str) -> Result<&PreferenceValue> {
        self.entries
            .get(key)
            .ok_or_else(|| Error::NotFound(key.to_string()))
    }

    /// Read an `Int32` value.
    pub fn get_i32(&self, key: &str) -> Result<i32> {
        let value = self.lookup(key)?;
        value
            .as_i32()
            .ok_or_else(|| Self::mismatch(key, ValueKind::Int32, value))
    }

    /// Read a `Bool` value.
    pub fn get_bool(&self, key: &str) -> Result<bool> {
        let value = self.lookup(key)?;
        value
            .as_bool()
            .ok_or_else(|| Self::mismatch(key, ValueKind::Bool, value))
    }

    /// Read a `Str` value.
    pub fn get_str(&self, key: &str) -> Result<&str> {
        let value = self.lookup(key)?;
        value
            .as_str()
            .ok_or_else(|| Self::mismatch(key, ValueKind::Str, value))
    }

    /// Read a `Bytes` value.
    pub fn get_bytes(&self, key: &str) -> Result<&[u8]> {
        let value = self.lookup(key)?;
        value
            .as_bytes()
            .ok_or_else(|| Self::mismatch(key, ValueKind::Bytes, value))
    }

    /// Store an `Int32` value.
    pub fn put_i32(&mut self, key: &str, value: i32) {
        self.put(key, PreferenceValue::Int32(value));
    }

    /// Store a `Bool` value.
    pub fn put_bool(&mut self, key: &str, value: bool) {
        self.put(key, PreferenceValue::Bool(value));
    }

    /// Store a `Str` value, copying it with a fallible allocation.
    pub fn put_str(&mut self, key: &str, value: &str) -> Result<()> {
        let mut owned = String::new();
        owned.try_reserve_exact(value.len())?;
        owned.push_str(value);
        self.put(key, PreferenceValue::Str(owned));
        Ok(())
    }

    /// Store a `Bytes` value, copying it with a fallible allocation.
    pub fn put_bytes(&mut self, key: &str, value: &[u8]) -> Result<()> {
        let mut owned = Vec::new();
        owned.try_reserve_exact(value.len())?;
        owned.extend_from_slice(value);
        self.put(key, PreferenceValue::Bytes(owned));
        Ok(())
    }

    /// Raw value under `key`
    pub fn get(&self, key: &str) -> Option<&PreferenceValue> {
        self.entries.get(key)
    }

    /// Insert or replace, returning the previous value.
    pub fn put(&mut self, key: &str, value: impl Into<PreferenceValue>) -> Option<PreferenceValue> {
        self.dirty = true;
        self.entries.insert(key.to_string(), value.into())
    }

    /// Remove `key`, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<PreferenceValue> {
        let removed = self.entries.remove(key);
        if removed.is_some() {
            self.dirty = true;
        }
        removed
    }

    /// Whether `key` is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// All keys, in no particular order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// All entries, in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PreferenceValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the store holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Empty the in-memory map. The saved file is untouched until the next save.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.dirty = true;
    }

    /// Delete the saved file, then empty the map.
    ///
    /// If the file cannot be removed the store is left as it was. A later
    /// [`Preferences::save`] writes a fresh file.
    pub fn erase(&mut self) -> Result<()> {
        self.backend.remove(&self.name)?;
        self.entries.clear();
        self.dirty = false;
        tracing::debug!("Erased preferences `{}`", self.name);
        Ok(())
    }

    /// Atomically replace the saved file with the current map.
    pub fn save(&mut self) -> Result<()> {
        let body = Zeroizing::new(format::encode_body(&self.entries)?);

        let bytes = match &self.encryption {
            None => format::encode_plain(&body),
            Some(ctx) => {
                let header = EncryptedHeader {
                    algorithm: ctx.key.algorithm(),
                    kdf: ctx.kdf,
                    salt: ctx.salt,
                    nonce: generate_nonce(),
                };
                let aad = header.to_bytes();
                let sealed = ctx.key.seal(&header.nonce, &body, &aad)?;

                let mut out = Vec::new();
                out.try_reserve_exact(aad.len() + sealed.len())?;
                out.extend_from_slice(&aad);
                out.extend_from_slice(&sealed);
                out
            }
        };

        self.backend.write(&self.name, &bytes)?;
        self.dirty = false;
        tracing::debug!(
            "Saved preferences `{}` ({} entries, {} bytes)",
            self.name,
            self.entries.len(),
            bytes.len()
        );
        Ok(())
    }
}

impl fmt::Debug for Preferences {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Preferences")
            .field("name", &self.name)
            .field("location", &self.location())
            .field("entries", &self.entries.len())
            .field("encrypted", &self.is_encrypted())
            .field("dirty", &self.dirty)
            .finish()
    }
}

impl Drop for Preferences {
    fn drop(&mut self) {
        if self.dirty {
            tracing::debug!("Discarding unsaved changes to preferences `{}`", self.name);
        }
    }
}
