//! Opaque pagination cursors.
//!
//! A cursor wraps the last evaluated key of a page in a versioned JSON
//! envelope, encoded as URL-safe base64 without padding so it can travel in
//! query strings unchanged.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use dynamodel_model::Item;
use serde::{Deserialize, Serialize};

use crate::error::{MapperError, MapperResult};

/// Envelope version written by [`encode`].
pub const CURSOR_VERSION: u8 = 1;

#[derive(Serialize, Deserialize)]
struct Envelope {
    v: u8,
    key: Item,
}

/// An opaque continuation token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageCursor(String);

impl PageCursor {
    /// Wrap a token received from a caller. It is validated when decoded.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The token text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode the wrapped key.
    pub fn key(&self) -> MapperResult<Item> {
        decode(&self.0)
    }
}

impl fmt::Display for PageCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Encode a last evaluated key into a cursor.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use dynamodel_core::cursor::{decode, encode};
/// use dynamodel_model::AttributeValue;
///
/// let key = HashMap::from([("id".to_owned(), AttributeValue::S("u1".to_owned()))]);
/// let cursor = encode(&key).unwrap();
/// assert_eq!(decode(cursor.as_str()).unwrap(), key);
/// ```
///
/// # Errors
///
/// Returns [`MapperError::InvalidCursor`] for an empty key.
pub fn encode(key: &Item) -> MapperResult<PageCursor> {
    if key.is_empty() {
        return Err(MapperError::invalid_cursor("cannot encode an empty key"));
    }
    let json = serde_json::to_vec(&Envelope {
        v: CURSOR_VERSION,
        key: key.clone(),
    })?;
    Ok(PageCursor(URL_SAFE_NO_PAD.encode(json)))
}

/// Decode a cursor token back into the key it wraps.
///
/// # Errors
///
/// Returns [`MapperError::InvalidCursor`] if the token is not valid base64,
/// does not hold a cursor envelope, carries an unknown version, or wraps an
/// empty key.
pub fn decode(token: &str) -> MapperResult<Item> {
    let bytes = URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|_| MapperError::invalid_cursor("token is not valid base64"))?;
    let envelope: Envelope = serde_json::from_slice(&bytes)
        .map_err(|e| MapperError::invalid_cursor(format!("malformed envelope: {e}")))?;
    if envelope.v != CURSOR_VERSION {
        return Err(MapperError::invalid_cursor(format!(
            "unsupported cursor version {}",
            envelope.v
        )));
    }
    if envelope.key.is_empty() {
        return Err(MapperError::invalid_cursor("cursor wraps an empty key"));
    }
    Ok(envelope.key)
}
