//! Opaque cursors over sortable row keys.

use crate::error::CursorError;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

const CURSOR_PREFIX: &str = "cursor:";

/// Cursor codec for lists ordered by a sortable key (ULIDs in this service).
///
/// The encoded form is URL-safe base64 of `cursor:<key>`, which keeps
/// clients from depending on the key format.
pub struct KeyCursor;

impl KeyCursor {
    pub fn encode(key: &str) -> String {
        URL_SAFE_NO_PAD.encode(format!("{CURSOR_PREFIX}{key}"))
    }

    pub fn decode(cursor: &str) -> Result<String, CursorError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(cursor)
            .map_err(|_| CursorError::new("not a valid cursor encoding"))?;
        let text =
            String::from_utf8(bytes).map_err(|_| CursorError::new("cursor is not valid UTF-8"))?;
        match text.strip_prefix(CURSOR_PREFIX) {
            Some(key) if !key.is_empty() => Ok(key.to_string()),
            _ => Err(CursorError::new("unrecognised cursor")),
        }
    }
}
