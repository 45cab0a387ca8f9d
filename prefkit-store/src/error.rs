//! Error types
//!
//! Every fallible store operation returns [`Error`]. Boundaries that cannot
//! carry a rich error (the C ABI) collapse it to an [`ErrorKind`] and its
//! stable numeric [`ErrorKind::code`].

use std::collections::TryReserveError;
use std::fmt;

use crate::value::ValueKind;

/// Result type
pub type Result<T> = std::result::Result<T, Error>;

/// Store errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Preferences name outside `[A-Za-z0-9_-]+`
    #[error("Invalid preferences name: `{0}`")]
    InvalidName(String),

    /// Argument rejected before reaching the store
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Key not present
    #[error("Key not found: `{0}`")]
    NotFound(String),

    /// Key holds a value of another type
    #[error("Key `{key}` has type {found}, expected {expected}")]
    TypeMismatch {
        /// Requested key
        key: String,
        /// Type the caller asked for
        expected: ValueKind,
        /// Type actually stored
        found: ValueKind,
    },

    /// No application directory configured
    #[error("The preferences app directory was not initialized")]
    AppDirNotSet,

    /// Wrong password or tampered data
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Plain store opened with a password, or encrypted store without one
    #[error("Preferences `{name}` is {actual}, but was opened as {requested}")]
    ProtectionMismatch {
        /// Store name
        name: String,
        /// How the file on disk is protected
        actual: &'static str,
        /// How the caller tried to open it
        requested: &'static str,
    },

    /// Durable file written by an unknown format version
    #[error("Unsupported preferences format version: {0}")]
    UnsupportedVersion(u8),

    /// Corrupt durable data or encoding failure
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Key derivation or cipher setup error
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Allocation could not be satisfied
    #[error("Allocation failed: {0}")]
    Allocation(#[from] TryReserveError),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl Error {
    /// Collapse the error into the boundary taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidName(_) => ErrorKind::InvalidName,
            Error::InvalidArgument(_) | Error::Crypto(_) => ErrorKind::InvalidArgument,
            Error::NotFound(_) | Error::TypeMismatch { .. } => ErrorKind::NotFound,
            Error::AuthenticationFailed(_) | Error::ProtectionMismatch { .. } => {
                ErrorKind::AuthenticationFailed
            }
            Error::AppDirNotSet | Error::Io(_) => ErrorKind::IoFailure,
            Error::UnsupportedVersion(_) | Error::Serialization(_) => {
                ErrorKind::SerializationFailure
            }
            Error::Allocation(_) => ErrorKind::AllocationFailure,
        }
    }

    /// True when the caller can recover by writing the key first.
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

/// Error kinds reported across the FFI boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Null pointer, malformed argument, stale handle
    InvalidArgument,
    /// Key absent or holding another type
    NotFound,
    /// Name fails the allowed-character check
    InvalidName,
    /// Wrong password, tampered ciphertext, protection mismatch
    AuthenticationFailed,
    /// Disk read/write failure or unresolved storage location
    IoFailure,
    /// Corrupt or version-mismatched durable format
    SerializationFailure,
    /// Allocation could not be satisfied
    AllocationFailure,
}

impl ErrorKind {
    /// Stable numeric code, never 0.
    pub const fn code(self) -> i32 {
        match self {
            ErrorKind::InvalidArgument => 1,
            ErrorKind::NotFound => 2,
            ErrorKind::InvalidName => 3,
            ErrorKind::AuthenticationFailed => 4,
            ErrorKind::IoFailure => 5,
            ErrorKind::SerializationFailure => 6,
            ErrorKind::AllocationFailure => 7,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::InvalidArgument => write!(f, "InvalidArgument"),
            ErrorKind::NotFound => write!(f, "NotFound"),
            ErrorKind::InvalidName => write!(f, "InvalidName"),
            ErrorKind::AuthenticationFailed => write!(f, "AuthenticationFailed"),
            ErrorKind::IoFailure => write!(f, "IOFailure"),
            ErrorKind::SerializationFailure => write!(f, "SerializationFailure"),
            ErrorKind::AllocationFailure => write!(f, "AllocationFailure"),
        }
    }
}
