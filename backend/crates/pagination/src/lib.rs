//! Opaque cursor and pagination envelope primitives shared by list endpoints.
//!
//! Handlers accept an optional `cursor` and `limit`, hand the decoded key to
//! a repository as an exclusive lower bound, and wrap the results in a
//! [`Paginated`] envelope. Cursors are URL-safe base64 encodings of a JSON
//! key so clients treat them as opaque strings.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Default number of items returned when the caller omits `limit`.
pub const DEFAULT_LIMIT: usize = 20;
/// Largest page a caller may request.
pub const MAX_LIMIT: usize = 100;

/// Errors raised while decoding cursors or validating limits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaginationError {
    /// The cursor was not valid base64.
    #[error("cursor is not valid base64")]
    InvalidEncoding,
    /// The cursor decoded but did not contain the expected key shape.
    #[error("cursor payload is malformed: {message}")]
    InvalidPayload {
        /// Decoder message.
        message: String,
    },
    /// The limit was zero or above [`MAX_LIMIT`].
    #[error("limit must be between 1 and {max}")]
    LimitOutOfRange {
        /// Upper bound accepted by the API.
        max: usize,
    },
}

/// Opaque cursor wrapping a serialisable key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor<K> {
    key: K,
}

impl<K> Cursor<K> {
    /// Wrap a key so it can be handed to clients.
    pub const fn new(key: K) -> Self {
        Self { key }
    }

    /// Borrow the decoded key.
    pub const fn key(&self) -> &K {
        &self.key
    }

    /// Consume the cursor and return the key.
    pub fn into_key(self) -> K {
        self.key
    }
}

impl<K: Serialize> Cursor<K> {
    /// Encode the key as an opaque URL-safe token.
    ///
    /// # Errors
    ///
    /// Returns [`PaginationError::InvalidPayload`] when the key cannot be
    /// serialised to JSON.
    pub fn encode(&self) -> Result<String, PaginationError> {
        let json = serde_json::to_vec(&self.key).map_err(|err| PaginationError::InvalidPayload {
            message: err.to_string(),
        })?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }
}

impl<K: DeserializeOwned> Cursor<K> {
    /// Decode an opaque token produced by [`Cursor::encode`].
    ///
    /// # Errors
    ///
    /// Returns [`PaginationError::InvalidEncoding`] for non-base64 input and
    /// [`PaginationError::InvalidPayload`] when the JSON does not match `K`.
    pub fn decode(token: &str) -> Result<Self, PaginationError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token.trim())
            .map_err(|_| PaginationError::InvalidEncoding)?;
        let key = serde_json::from_slice(&bytes).map_err(|err| PaginationError::InvalidPayload {
            message: err.to_string(),
        })?;
        Ok(Self { key })
    }
}

/// Validated page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimit(usize);

impl PageLimit {
    /// Validate an optional caller-provided limit, applying [`DEFAULT_LIMIT`].
    ///
    /// # Errors
    ///
    /// Returns [`PaginationError::LimitOutOfRange`] for zero or values above
    /// [`MAX_LIMIT`].
    pub fn new(limit: Option<usize>) -> Result<Self, PaginationError> {
        match limit {
            None => Ok(Self(DEFAULT_LIMIT)),
            Some(value) if (1..=MAX_LIMIT).contains(&value) => Ok(Self(value)),
            Some(_) => Err(PaginationError::LimitOutOfRange { max: MAX_LIMIT }),
        }
    }

    /// Page size as a plain integer.
    pub const fn get(self) -> usize {
        self.0
    }

    /// Number of rows to fetch so the caller can tell whether another page exists.
    pub const fn lookahead(self) -> usize {
        self.0 + 1
    }
}

impl Default for PageLimit {
    fn default() -> Self {
        Self(DEFAULT_LIMIT)
    }
}

/// Page envelope returned by list endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    /// Items on this page.
    pub data: Vec<T>,
    /// Cursor for the next page, absent on the last page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

impl<T> Paginated<T> {
    /// Build a page from `limit + 1` fetched rows.
    ///
    /// When more rows than `limit` were fetched, the surplus is dropped and
    /// `key_of` derives the cursor from the last kept item.
    ///
    /// # Errors
    ///
    /// Propagates cursor encoding failures.
    pub fn from_lookahead<K, F>(
        mut rows: Vec<T>,
        limit: PageLimit,
        key_of: F,
    ) -> Result<Self, PaginationError>
    where
        K: Serialize,
        F: Fn(&T) -> K,
    {
        let has_more = rows.len() > limit.get();
        rows.truncate(limit.get());
        let next_cursor = match (has_more, rows.last()) {
            (true, Some(last)) => Some(Cursor::new(key_of(last)).encode()?),
            _ => None,
        };
        Ok(Self {
            data: rows,
            next_cursor,
        })
    }

    /// Map the items while keeping the cursor.
    pub fn map<U, F>(self, f: F) -> Paginated<U>
    where
        F: FnMut(T) -> U,
    {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            next_cursor: self.next_cursor,
        }
    }
}

/// Build the absolute URL for the next page by setting `cursor` and `limit`
/// query parameters on `base`, replacing any existing values.
pub fn next_page_url(base: &Url, cursor: &str, limit: PageLimit) -> Url {
    let retained: Vec<(String, String)> = base
        .query_pairs()
        .filter(|(name, _)| name != "cursor" && name != "limit")
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();
    let mut url = base.clone();
    {
        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        for (name, value) in &retained {
            pairs.append_pair(name, value);
        }
        pairs.append_pair("cursor", cursor);
        pairs.append_pair("limit", &limit.get().to_string());
    }
    url
}
