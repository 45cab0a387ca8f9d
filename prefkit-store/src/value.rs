//! Typed preference values
//!
//! A key holds exactly one [`PreferenceValue`]. Writing another variant under
//! the same key replaces the entry and its type; reads never coerce.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Value stored under a preference key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PreferenceValue {
    /// 32-bit signed integer
    #[serde(rename = "i32")]
    Int32(i32),
    /// UTF-8 string
    #[serde(rename = "str")]
    Str(String),
    /// Boolean
    #[serde(rename = "bool")]
    Bool(bool),
    /// Opaque octets
    #[serde(rename = "bytes", with = "base64_bytes")]
    Bytes(Vec<u8>),
}

/// Discriminant of a [`PreferenceValue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// [`PreferenceValue::Int32`]
    Int32,
    /// [`PreferenceValue::Str`]
    Str,
    /// [`PreferenceValue::Bool`]
    Bool,
    /// [`PreferenceValue::Bytes`]
    Bytes,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Int32 => write!(f, "i32"),
            ValueKind::Str => write!(f, "string"),
            ValueKind::Bool => write!(f, "bool"),
            ValueKind::Bytes => write!(f, "bytes"),
        }
    }
}

impl PreferenceValue {
    /// The variant tag
    pub fn kind(&self) -> ValueKind {
        match self {
            PreferenceValue::Int32(_) => ValueKind::Int32,
            PreferenceValue::Str(_) => ValueKind::Str,
            PreferenceValue::Bool(_) => ValueKind::Bool,
            PreferenceValue::Bytes(_) => ValueKind::Bytes,
        }
    }

    /// Integer payload, if this is an `Int32`
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            PreferenceValue::Int32(v) => Some(*v),
            _ => None,
        }
    }

    /// Boolean payload, if this is a `Bool`
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PreferenceValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// String payload, if this is a `Str`
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PreferenceValue::Str(v) => Some(v),
            _ => None,
        }
    }

    /// Byte payload, if this is `Bytes`
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            PreferenceValue::Bytes(v) => Some(v),
            _ => None,
        }
    }

    /// Raw octets for variable-length variants (UTF-8 for strings).
    ///
    /// Used by the two-phase buffer reads at the FFI boundary.
    pub fn payload_bytes(&self) -> Option<&[u8]> {
        match self {
            PreferenceValue::Str(v) => Some(v.as_bytes()),
            PreferenceValue::Bytes(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for PreferenceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreferenceValue::Int32(v) => write!(f, "{v}"),
            PreferenceValue::Str(v) => write!(f, "{v:?}"),
            PreferenceValue::Bool(v) => write!(f, "{v}"),
            PreferenceValue::Bytes(v) => {
                for b in v {
                    write!(f, "{b:02x}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<i32> for PreferenceValue {
    fn from(v: i32) -> Self {
        PreferenceValue::Int32(v)
    }
}

impl From<bool> for PreferenceValue {
    fn from(v: bool) -> Self {
        PreferenceValue::Bool(v)
    }
}

impl From<String> for PreferenceValue {
    fn from(v: String) -> Self {
        PreferenceValue::Str(v)
    }
}

impl From<&str> for PreferenceValue {
    fn from(v: &str) -> Self {
        PreferenceValue::Str(v.to_owned())
    }
}

impl From<Vec<u8>> for PreferenceValue {
    fn from(v: Vec<u8>) -> Self {
        PreferenceValue::Bytes(v)
    }
}

impl From<&[u8]> for PreferenceValue {
    fn from(v: &[u8]) -> Self {
        PreferenceValue::Bytes(v.to_vec())
    }
}

/// Byte payloads are stored as base64 text inside the JSON body.
mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD
            .decode(text.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
