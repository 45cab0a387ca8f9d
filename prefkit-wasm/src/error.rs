//! Errors surfaced to JavaScript

use prefkit_store::ErrorKind;
use thiserror::Error;
use wasm_bindgen::prelude::*;

/// A store failure, thrown into JavaScript as `"<Kind>: <message>"`
#[derive(Error, Debug)]
#[error("{kind}: {source}")]
pub struct PreferencesError {
    kind: ErrorKind,
    #[source]
    source: prefkit_store::Error,
}

impl PreferencesError {
    /// Error category
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl From<prefkit_store::Error> for PreferencesError {
    fn from(source: prefkit_store::Error) -> Self {
        Self {
            kind: source.kind(),
            source,
        }
    }
}

impl From<PreferencesError> for JsValue {
    fn from(err: PreferencesError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

/// Result type for the JavaScript bindings
pub type PreferencesResult<T> = Result<T, PreferencesError>;
