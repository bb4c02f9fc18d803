//! Cursor pagination for list endpoints.
//!
//! Page tokens are opaque to clients: URL-safe base64 of a small versioned
//! JSON cursor naming the last item of the previous page. Results are keyed,
//! not indexed, so pages stay stable when earlier items are removed.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{RestError, RestResult};

const CURSOR_VERSION: u8 = 1;

#[derive(Serialize, Deserialize)]
struct Cursor<K> {
    v: u8,
    after: K,
}

/// Encodes a page token resuming after `after`.
///
/// # Errors
///
/// Returns an internal error if the key cannot be serialized.
pub fn encode_token<K: Serialize>(after: &K) -> RestResult<String> {
    let json = serde_json::to_vec(&Cursor {
        v: CURSOR_VERSION,
        after,
    })
    .map_err(|e| RestError::internal(format!("failed to encode page token: {e}")))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Decodes a page token.
///
/// # Errors
///
/// Returns a malformed request error for tokens this server did not issue.
pub fn decode_token<K: DeserializeOwned>(token: &str) -> RestResult<K> {
    let invalid = || RestError::malformed("Invalid pageToken");
    let bytes = URL_SAFE_NO_PAD.decode(token).map_err(|_| invalid())?;
    let cursor: Cursor<K> = serde_json::from_slice(&bytes).map_err(|_| invalid())?;
    if cursor.v != CURSOR_VERSION {
        return Err(invalid());
    }
    Ok(cursor.after)
}

/// Returns one page of `items`, which must be sorted ascending by `key`.
///
/// An empty token starts from the beginning. Without a page size, everything
/// after the cursor is returned. The next token is `None` once the final item
/// has been returned.
///
/// # Errors
///
/// Returns a malformed request error for an undecodable token or a zero page
/// size.
pub fn paginate<T, K, F>(
    items: Vec<T>,
    key: F,
    page_token: Option<&str>,
    page_size: Option<u32>,
) -> RestResult<(Vec<T>, Option<String>)>
where
    K: Ord + Serialize + DeserializeOwned,
    F: Fn(&T) -> K,
{
    let start = match page_token.filter(|t| !t.is_empty()) {
        Some(token) => {
            let after: K = decode_token(token)?;
            items.partition_point(|item| key(item) <= after)
        }
        None => 0,
    };
    let remaining = items.len() - start;
    let size = match page_size {
        Some(0) => return Err(RestError::malformed("pageSize must be greater than zero")),
        Some(size) => usize::try_from(size).unwrap_or(usize::MAX).min(remaining),
        None => remaining,
    };

    let end = start + size;
    let next = if end < items.len() && end > start {
        Some(encode_token(&key(&items[end - 1]))?)
    } else {
        None
    };

    let page = items.into_iter().skip(start).take(size).collect();
    Ok((page, next))
}
