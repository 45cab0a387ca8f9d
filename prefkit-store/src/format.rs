//! Durable file format
//!
//! ```text
//! 0   magic "PKST"          4 bytes
//! 4   format version        u8
//! 5   protection            u8   0 = plain, 1 = ChaCha20-Poly1305, 2 = AES-256-GCM
//! plain:      6..  JSON body
//! encrypted:  6    m_cost u32 LE | 10 t_cost u32 LE | 14 p_cost u32 LE
//!             18   salt [32]
//!             50   nonce [12]
//!             62.. ciphertext || tag   (bytes 0..62 are the AAD)
//! ```

use crate::crypto::{EncryptionAlgorithm, KdfParams, NONCE_LEN, SALT_LEN, TAG_LEN};
use crate::value::PreferenceValue;
use crate::{Error, Result};
use std::collections::{BTreeMap, HashMap};

/// File magic
pub const MAGIC: &[u8; 4] = b"PKST";
/// Current format version
pub const FORMAT_VERSION: u8 = 1;
/// Header length of a plain file
pub const PLAIN_HEADER_LEN: usize = 6;
/// Header length of an encrypted file
pub const ENCRYPTED_HEADER_LEN: usize = PLAIN_HEADER_LEN + 12 + SALT_LEN + NONCE_LEN;

const PROTECTION_PLAIN: u8 = 0;

/// Header of an encrypted file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedHeader {
    /// Body cipher
    pub algorithm: EncryptionAlgorithm,
    /// Argon2id costs the key was derived with
    pub kdf: KdfParams,
    /// Argon2id salt
    pub salt: [u8; SALT_LEN],
    /// AEAD nonce of this save
    pub nonce: [u8; NONCE_LEN],
}

impl EncryptedHeader {
    /// Serialize; the result doubles as the AEAD associated data.
    pub fn to_bytes(&self) -> [u8; ENCRYPTED_HEADER_LEN] {
        let mut out = [0u8; ENCRYPTED_HEADER_LEN];
        out[0..4].copy_from_slice(MAGIC);
        out[4] = FORMAT_VERSION;
        out[5] = self.algorithm.tag();
        out[6..10].copy_from_slice(&self.kdf.memory_kib.to_le_bytes());
        out[10..14].copy_from_slice(&self.kdf.iterations.to_le_bytes());
        out[14..18].copy_from_slice(&self.kdf.lanes.to_le_bytes());
        out[18..50].copy_from_slice(&self.salt);
        out[50..62].copy_from_slice(&self.nonce);
        out
    }
}

/// A decoded file, borrowed from the raw bytes
#[derive(Debug)]
pub enum Envelope<'a> {
    /// Unencrypted JSON body
    Plain {
        /// JSON body
        body: &'a [u8],
    },
    /// Sealed body
    Encrypted {
        /// Parsed header
        header: EncryptedHeader,
        /// Raw header bytes, authenticated as AAD
        aad: &'a [u8],
        /// Ciphertext with trailing tag
        ciphertext: &'a [u8],
    },
}

impl Envelope<'_> {
    /// "plain" or "encrypted", for error messages
    pub fn protection(&self) -> &'static str {
        match self {
            Envelope::Plain { .. } => "plain",
            Envelope::Encrypted { .. } => "encrypted",
        }
    }
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[at..at + 4]);
    u32::from_le_bytes(word)
}

/// Parse the header of a non-empty file.
pub fn decode(bytes: &[u8]) -> Result<Envelope<'_>> {
    if bytes.len() < PLAIN_HEADER_LEN {
        return Err(Error::Serialization(format!(
            "File truncated: {} bytes, header needs {}",
            bytes.len(),
            PLAIN_HEADER_LEN
        )));
    }
    if &bytes[0..4] != MAGIC {
        return Err(Error::Serialization("Not a preferences file (bad magic)".to_string()));
    }
    if bytes[4] != FORMAT_VERSION {
        return Err(Error::UnsupportedVersion(bytes[4]));
    }

    let protection = bytes[5];
    if protection == PROTECTION_PLAIN {
        return Ok(Envelope::Plain {
            body: &bytes[PLAIN_HEADER_LEN..],
        });
    }

    let algorithm = EncryptionAlgorithm::from_tag(protection).ok_or_else(|| {
        Error::Serialization(format!("Unknown protection byte: {protection}"))
    })?;

    if bytes.len() < ENCRYPTED_HEADER_LEN + TAG_LEN {
        return Err(Error::Serialization(format!(
            "Encrypted file truncated: {} bytes",
            bytes.len()
        )));
    }

    let kdf = KdfParams {
        memory_kib: read_u32(bytes, 6),
        iterations: read_u32(bytes, 10),
        lanes: read_u32(bytes, 14),
    };
    // Same bounds the writer enforces, checked before any key derivation
    if kdf.validate().is_err() {
        return Err(Error::AuthenticationFailed(
            "KDF parameters in header were rejected".to_string(),
        ));
    }

    let mut salt = [0u8; SALT_LEN];
    salt.copy_from_slice(&bytes[18..50]);
    let mut nonce = [0u8; NONCE_LEN];
    nonce.copy_from_slice(&bytes[50..62]);

    Ok(Envelope::Encrypted {
        header: EncryptedHeader {
            algorithm,
            kdf,
            salt,
            nonce,
        },
        aad: &bytes[..ENCRYPTED_HEADER_LEN],
        ciphertext: &bytes[ENCRYPTED_HEADER_LEN..],
    })
}

/// Prefix a JSON body with the plain header.
pub fn encode_plain(body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(PLAIN_HEADER_LEN + body.len());
    out.extend_from_slice(MAGIC);
    out.push(FORMAT_VERSION);
    out.push(PROTECTION_PLAIN);
    out.extend_from_slice(body);
    out
}

/// Serialize the map as JSON with keys in sorted order.
pub fn encode_body(entries: &HashMap<String, PreferenceValue>) -> Result<Vec<u8>> {
    let sorted: BTreeMap<&String, &PreferenceValue> = entries.iter().collect();
    Ok(serde_json::to_vec(&sorted)?)
}

/// Parse a JSON body.
pub fn decode_body(body: &[u8]) -> Result<HashMap<String, PreferenceValue>> {
    Ok(serde_json::from_slice(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> EncryptedHeader {
        EncryptedHeader {
            algorithm: EncryptionAlgorithm::Aes256Gcm,
            kdf: KdfParams::INTERACTIVE,
            salt: [3u8; SALT_LEN],
            nonce: [9u8; NONCE_LEN],
        }
    }

    #[test]
    fn test_header_layout() {
        let bytes = header().to_bytes();
        assert_eq!(ENCRYPTED_HEADER_LEN, 62);
        assert_eq!(&bytes[0..4], b"PKST");
        assert_eq!(bytes[4], 1);
        assert_eq!(bytes[5], 2);
        assert_eq!(&bytes[6..10], &16384u32.to_le_bytes());
        assert_eq!(&bytes[10..14], &2u32.to_le_bytes());
        assert_eq!(&bytes[14..18], &2u32.to_le_bytes());
        assert_eq!(&bytes[18..50], &[3u8; 32]);
        assert_eq!(&bytes[50..62], &[9u8; 12]);
    }

    #[test]
    fn test_decode_encrypted() {
        let mut file = header().to_bytes().to_vec();
        file.extend_from_slice(&[0xAA; TAG_LEN + 4]);

        match decode(&file).unwrap() {
            Envelope::Encrypted {
                header: parsed,
                aad,
                ciphertext,
            } => {
                assert_eq!(parsed, header());
                assert_eq!(aad.len(), ENCRYPTED_HEADER_LEN);
                assert_eq!(ciphertext.len(), TAG_LEN + 4);
            }
            Envelope::Plain { .. } => panic!("expected encrypted envelope"),
        }
    }

    #[test]
    fn test_decode_plain() {
        let file = encode_plain(br#"{"a":{"i32":1}}"#);
        let envelope = decode(&file).unwrap();
        assert_eq!(envelope.protection(), "plain");
        match envelope {
            Envelope::Plain { body } => {
                let map = decode_body(body).unwrap();
                assert_eq!(map.get("a"), Some(&PreferenceValue::Int32(1)));
            }
            Envelope::Encrypted { .. } => panic!("expected plain envelope"),
        }
    }

    #[test]
    fn test_rejects_bad_magic_and_version() {
        assert!(matches!(decode(b"NOPE\x01\x00{}"), Err(Error::Serialization(_))));
        assert!(matches!(decode(b"PKST\x07\x00{}"), Err(Error::UnsupportedVersion(7))));
        assert!(matches!(decode(b"PKS"), Err(Error::Serialization(_))));
        assert!(matches!(decode(b"PKST\x01\x09{}"), Err(Error::Serialization(_))));
    }

    #[test]
    fn test_rejects_truncated_ciphertext() {
        let mut file = header().to_bytes().to_vec();
        file.extend_from_slice(&[0u8; TAG_LEN - 1]);
        assert!(matches!(decode(&file), Err(Error::Serialization(_))));
    }

    #[test]
    fn test_rejects_absurd_kdf_costs() {
        let mut file = header().to_bytes().to_vec();
        file.extend_from_slice(&[0u8; TAG_LEN]);
        file[6..10].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(decode(&file), Err(Error::AuthenticationFailed(_))));
    }

    #[test]
    fn test_memory_cost_capped_at_256_mib() {
        let mut file = header().to_bytes().to_vec();
        file.extend_from_slice(&[0u8; TAG_LEN]);

        file[6..10].copy_from_slice(&(256 * 1024 + 1u32).to_le_bytes());
        assert!(matches!(decode(&file), Err(Error::AuthenticationFailed(_))));

        // A full gigabyte, which older bounds let through
        file[6..10].copy_from_slice(&(1024 * 1024u32).to_le_bytes());
        assert!(matches!(decode(&file), Err(Error::AuthenticationFailed(_))));

        file[6..10].copy_from_slice(&(256 * 1024u32).to_le_bytes());
        assert!(matches!(decode(&file), Ok(Envelope::Encrypted { .. })));
    }

    #[test]
    fn test_body_is_sorted_json() {
        let mut map = HashMap::new();
        map.insert("b".to_string(), PreferenceValue::Bool(false));
        map.insert("a".to_string(), PreferenceValue::Str("x".to_string()));
        let body = encode_body(&map).unwrap();
        assert_eq!(body, br#"{"a":{"str":"x"},"b":{"bool":false}}"#.to_vec());
        assert_eq!(decode_body(&body).unwrap(), map);
    }

    #[test]
    fn test_corrupt_body() {
        assert!(matches!(decode_body(b"{not json"), Err(Error::Serialization(_))));
    }
}
