//! Pagination cursor codec
//!
//! The export API hands back a `nextPage` URL whose final path segment is
//! base64 of the ASCII string `"<sessionId>,<currentRow>,<maxRow>,<flag>"`.

use crate::error::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of comma separated fields in a decoded cursor
const CURSOR_FIELDS: usize = 4;

/// Decoded pagination position
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationCursor {
    /// Server-side query session
    pub session_id: String,
    /// Row offset this cursor points at
    pub current_row: u64,
    /// Last row offset of the result set
    pub max_row: u64,
    /// Continuation flag, always 0 on generated links
    pub flag: i64,
}

impl PaginationCursor {
    /// Create a cursor
    ///
    /// The session id is taken as is. Ids that are blank or contain `,` do
    /// not survive an encode/decode round trip; use [`Self::try_new`] for ids
    /// that did not come from a decoded link.
    pub fn new(session_id: impl Into<String>, current_row: u64, max_row: u64, flag: i64) -> Self {
        Self {
            session_id: session_id.into(),
            current_row,
            max_row,
            flag,
        }
    }

    /// Create a cursor, rejecting session ids the wire format cannot carry
    pub fn try_new(
        session_id: impl Into<String>,
        current_row: u64,
        max_row: u64,
        flag: i64,
    ) -> Result<Self> {
        let session_id = session_id.into();
        check_session_id(&session_id)
            .map_err(|message| Error::invalid_value("session_id", message))?;
        Ok(Self::new(session_id, current_row, max_row, flag))
    }

    /// Cursor for another offset of the same session, as used for generated links
    #[must_use]
    pub fn at_row(&self, row: u64) -> Self {
        Self {
            session_id: self.session_id.clone(),
            current_row: row,
            max_row: self.max_row,
            flag: 0,
        }
    }

    /// Whether any rows remain at or after `current_row`
    pub fn has_remaining(&self) -> bool {
        self.current_row <= self.max_row
    }
}

impl fmt::Display for PaginationCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.session_id, self.current_row, self.max_row, self.flag
        )
    }
}

/// Encodes and decodes the opaque cursor segment
#[derive(Debug, Clone, Copy, Default)]
pub struct CursorCodec;

impl CursorCodec {
    /// Encode a cursor into its base64 wire form
    pub fn encode(cursor: &PaginationCursor) -> String {
        STANDARD.encode(cursor.to_string().as_bytes())
    }

    /// Decode the cursor embedded as the last path segment of `link`
    pub fn decode(link: &str) -> Result<PaginationCursor> {
        let segment = last_segment(link);
        if segment.is_empty() {
            return Err(Error::cursor_decode(link, "link has no cursor segment"));
        }
        Self::decode_segment(segment).map_err(|message| Error::cursor_decode(link, message))
    }

    fn decode_segment(segment: &str) -> std::result::Result<PaginationCursor, String> {
        let bytes = STANDARD
            .decode(segment)
            .map_err(|e| format!("invalid base64: {e}"))?;
        if !bytes.is_ascii() {
            return Err("cursor is not ASCII".to_string());
        }
        let text = String::from_utf8(bytes).map_err(|e| format!("invalid text: {e}"))?;

        let fields: Vec<&str> = text.split(',').collect();
        if fields.len() != CURSOR_FIELDS {
            return Err(format!(
                "expected {CURSOR_FIELDS} comma separated fields, found {}",
                fields.len()
            ));
        }

        let session_id = fields[0];
        check_session_id(session_id)?;

        Ok(PaginationCursor {
            session_id: session_id.to_string(),
            current_row: parse_field(fields[1], "currentRow")?,
            max_row: parse_field(fields[2], "maxRow")?,
            flag: parse_field(fields[3], "flag")?,
        })
    }
}

fn check_session_id(session_id: &str) -> std::result::Result<(), String> {
    if session_id.trim().is_empty() {
        return Err("empty session id".to_string());
    }
    if session_id.contains(',') {
        return Err(format!("session id '{session_id}' contains ','"));
    }
    Ok(())
}

fn parse_field<T: std::str::FromStr>(raw: &str, name: &str) -> std::result::Result<T, String> {
    raw.trim()
        .parse()
        .map_err(|_| format!("{name} is not an integer: '{raw}'"))
}

/// Final path segment, ignoring any query string or fragment
fn last_segment(link: &str) -> &str {
    let end = link.find(['?', '#']).unwrap_or(link.len());
    let path = &link[..end];
    path.rsplit('/').next().unwrap_or(path)
}
