//! Opaque pagination cursors.
//!
//! A cursor is any serializable position (typically the sort key of the last
//! row served) encoded as URL-safe base64 JSON, so it can travel in a query
//! string untouched.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Cursor encoding and decoding errors.
#[derive(Debug, Error)]
pub enum CursorError {
    #[error("cursor is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("cursor payload is malformed: {0}")]
    Payload(#[from] serde_json::Error),
}

/// An encoded cursor string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cursor(String);

impl Cursor {
    /// Encode a position.
    pub fn encode<T: Serialize>(position: &T) -> Result<Self, CursorError> {
        let json = serde_json::to_vec(position)?;
        Ok(Self(URL_SAFE_NO_PAD.encode(json)))
    }

    /// Decode a cursor string received from a client.
    pub fn decode<T: DeserializeOwned>(cursor: &str) -> Result<T, CursorError> {
        let bytes = URL_SAFE_NO_PAD.decode(cursor.trim())?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Cursor> for String {
    fn from(cursor: Cursor) -> Self {
        cursor.0
    }
}
