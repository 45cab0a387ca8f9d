//! Password-based encryption for stores
//!
//! Argon2id turns the password and a per-store salt into a 32-byte key. The
//! serialized map is sealed with ChaCha20-Poly1305 or AES-256-GCM under a
//! fresh random nonce on every save; the file header is passed as associated
//! data so any change to it fails authentication.

use crate::{Error, Result};
use aes_gcm::Aes256Gcm;
use argon2::{Argon2, ParamsBuilder, Version};
use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    ChaCha20Poly1305,
};
use rand::{rngs::OsRng, RngCore};
use std::fmt;
use zeroize::Zeroizing;

/// Derived key length in bytes
pub const KEY_LEN: usize = 32;
/// Salt length in bytes
pub const SALT_LEN: usize = 32;
/// AEAD nonce length in bytes (96-bit)
pub const NONCE_LEN: usize = 12;
/// AEAD tag length in bytes
pub const TAG_LEN: usize = 16;

/// Largest accepted memory cost (256 MiB). Headers are read before they can
/// be authenticated, so this bounds what a corrupted file can make us allocate.
pub const MAX_MEMORY_KIB: u32 = 256 * 1024;
/// Largest accepted pass count
pub const MAX_ITERATIONS: u32 = 64;
/// Largest accepted parallelism
pub const MAX_LANES: u32 = 64;

/// Argon2id cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Number of passes
    pub iterations: u32,
    /// Degree of parallelism
    pub lanes: u32,
}

impl KdfParams {
    /// 64 MiB, 3 passes, 4 lanes
    pub const DEFAULT: Self = Self {
        memory_kib: 65536,
        iterations: 3,
        lanes: 4,
    };

    /// 16 MiB, 2 passes, 2 lanes, for callers that unlock on every launch
    pub const INTERACTIVE: Self = Self {
        memory_kib: 16384,
        iterations: 2,
        lanes: 2,
    };

    fn argon2(&self) -> Result<Argon2<'static>> {
        if self.memory_kib > MAX_MEMORY_KIB
            || self.iterations > MAX_ITERATIONS
            || self.lanes > MAX_LANES
        {
            return Err(Error::Crypto(format!(
                "KDF parameters exceed the supported maximum ({} KiB, {} passes, {} lanes)",
                MAX_MEMORY_KIB, MAX_ITERATIONS, MAX_LANES
            )));
        }

        let params = ParamsBuilder::new()
            .m_cost(self.memory_kib)
            .t_cost(self.iterations)
            .p_cost(self.lanes)
            .output_len(KEY_LEN)
            .build()
            .map_err(|e| Error::Crypto(format!("Invalid KDF parameters: {e}")))?;

        Ok(Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params))
    }

    /// Check the parameters are within bounds and accepted by Argon2id.
    pub fn validate(&self) -> Result<()> {
        self.argon2().map(|_| ())
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// AEAD used to seal the store body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncryptionAlgorithm {
    /// ChaCha20-Poly1305
    #[default]
    ChaCha20Poly1305,
    /// AES-256-GCM
    Aes256Gcm,
}

impl EncryptionAlgorithm {
    /// Protection byte written to the file header
    pub(crate) const fn tag(self) -> u8 {
        match self {
            EncryptionAlgorithm::ChaCha20Poly1305 => 1,
            EncryptionAlgorithm::Aes256Gcm => 2,
        }
    }

    pub(crate) const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(EncryptionAlgorithm::ChaCha20Poly1305),
            2 => Some(EncryptionAlgorithm::Aes256Gcm),
            _ => None,
        }
    }
}

impl fmt::Display for EncryptionAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncryptionAlgorithm::ChaCha20Poly1305 => write!(f, "ChaCha20-Poly1305"),
            EncryptionAlgorithm::Aes256Gcm => write!(f, "AES-256-GCM"),
        }
    }
}

/// Key derived from a store password. Zeroized on drop.
#[derive(Clone)]
pub struct StoreKey {
    key: Zeroizing<[u8; KEY_LEN]>,
    algorithm: EncryptionAlgorithm,
}

impl StoreKey {
    /// Derive a key with Argon2id.
    pub fn derive(
        password: &[u8],
        salt: &[u8; SALT_LEN],
        params: KdfParams,
        algorithm: EncryptionAlgorithm,
    ) -> Result<Self> {
        let argon2 = params.argon2()?;

        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        argon2
            .hash_password_into(password, salt, &mut *key)
            .map_err(|e| Error::Crypto(e.to_string()))?;

        Ok(Self { key, algorithm })
    }

    /// Cipher this key seals with
    pub fn algorithm(&self) -> EncryptionAlgorithm {
        self.algorithm
    }

    /// Encrypt `plaintext`, authenticating `aad` alongside it.
    pub fn seal(&self, nonce: &[u8; NONCE_LEN], plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
        let payload = Payload {
            msg: plaintext,
            aad,
        };

        let sealed = match self.algorithm {
            EncryptionAlgorithm::ChaCha20Poly1305 => {
                let cipher = ChaCha20Poly1305::new(chacha20poly1305::Key::from_slice(&self.key[..]));
                cipher.encrypt(chacha20poly1305::Nonce::from_slice(nonce), payload)
            }
            EncryptionAlgorithm::Aes256Gcm => {
                let cipher = Aes256Gcm::new(aes_gcm::Key::<Aes256Gcm>::from_slice(&self.key[..]));
                cipher.encrypt(aes_gcm::Nonce::from_slice(nonce), payload)
            }
        };

        sealed.map_err(|e| Error::Crypto(format!("{} encryption failed: {e}", self.algorithm)))
    }

    /// Decrypt and verify. Wrong keys and tampering both surface as
    /// [`Error::AuthenticationFailed`]; no partial plaintext is returned.
    pub fn open(
        &self,
        nonce: &[u8; NONCE_LEN],
        ciphertext: &[u8],
        aad: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>> {
        let payload = Payload {
            msg: ciphertext,
            aad,
        };

        let opened = match self.algorithm {
            EncryptionAlgorithm::ChaCha20Poly1305 => {
                let cipher = ChaCha20Poly1305::new(chacha20poly1305::Key::from_slice(&self.key[..]));
                cipher.decrypt(chacha20poly1305::Nonce::from_slice(nonce), payload)
            }
            EncryptionAlgorithm::Aes256Gcm => {
                let cipher = Aes256Gcm::new(aes_gcm::Key::<Aes256Gcm>::from_slice(&self.key[..]));
                cipher.decrypt(aes_gcm::Nonce::from_slice(nonce), payload)
            }
        };

        opened.map(Zeroizing::new).map_err(|_| {
            Error::AuthenticationFailed("wrong password or tampered data".to_string())
        })
    }
}

impl fmt::Debug for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreKey")
            .field("key", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

/// Random per-store salt
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Random per-save nonce
pub fn generate_nonce() -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);
    nonce
}
