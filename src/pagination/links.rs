//! Page link enumeration
//!
//! Turns one decoded cursor into every page request needed to cover
//! `[current_row, max_row]`, without waiting on the server's `nextPage` chain.

use super::cursor::{CursorCodec, PaginationCursor};
use crate::error::{Error, Result};
use crate::types::DEFAULT_STRIDE;
use url::Url;

/// Most links a single cursor may expand to
///
/// At the default stride this covers five billion rows; larger spans come
/// from a corrupt `maxRow` rather than a real result set.
pub const MAX_PAGE_LINKS: usize = 1_000_000;

/// A fully formed page request URL
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageRequest {
    /// URL with the re-encoded cursor as its final segment
    pub url: String,
    /// Row offset embedded in the cursor
    pub row: u64,
}

impl PageRequest {
    /// Create a page request
    pub fn new(url: impl Into<String>, row: u64) -> Self {
        Self {
            url: url.into(),
            row,
        }
    }
}

/// Generates page links for a cursor against a base URL
///
/// Enumeration is a pure function of the cursor: calling it twice yields the
/// same ordered sequence.
#[derive(Debug, Clone)]
pub struct LinkEnumerator {
    base: Url,
    stride: u64,
}

impl LinkEnumerator {
    /// Create an enumerator whose links replace the final segment of `base_url`
    pub fn new(base_url: &str, stride: u64) -> Result<Self> {
        if stride == 0 {
            return Err(Error::invalid_value("stride", "must be greater than zero"));
        }
        let base = Url::parse(base_url)?;
        if base.cannot_be_a_base() {
            return Err(Error::invalid_value(
                "base_url",
                format!("'{base_url}' has no path to substitute"),
            ));
        }
        Ok(Self { base, stride })
    }

    /// Create an enumerator with the API's 5000-row stride
    pub fn with_default_stride(base_url: &str) -> Result<Self> {
        Self::new(base_url, DEFAULT_STRIDE)
    }

    /// Rows between consecutive links
    pub fn stride(&self) -> u64 {
        self.stride
    }

    /// Base URL the links are derived from
    pub fn base_url(&self) -> &str {
        self.base.as_str()
    }

    /// Number of links `links` yields for `cursor`, saturating at `usize::MAX`
    pub fn expected_links(&self, cursor: &PaginationCursor) -> usize {
        if !cursor.has_remaining() {
            return 0;
        }
        let strides = (cursor.max_row - cursor.current_row) / self.stride;
        usize::try_from(strides)
            .ok()
            .and_then(|n| n.checked_add(1))
            .unwrap_or(usize::MAX)
    }

    /// Lazily yield page requests for `current_row, current_row + stride, ...` up to `max_row`
    pub fn links<'a>(
        &'a self,
        cursor: &'a PaginationCursor,
    ) -> impl Iterator<Item = PageRequest> + 'a {
        std::iter::successors(Some(cursor.current_row), move |row| {
            row.checked_add(self.stride)
        })
        .take_while(move |row| *row <= cursor.max_row)
        .map(move |row| PageRequest::new(self.link_for(&cursor.at_row(row)), row))
    }

    /// Collect every page request for `cursor`
    ///
    /// Empty when `current_row > max_row`: the first page already held everything.
    /// Cursors spanning more than [`MAX_PAGE_LINKS`] links are rejected.
    pub fn enumerate(&self, cursor: &PaginationCursor) -> Result<Vec<PageRequest>> {
        let expected = self.expected_links(cursor);
        if expected > MAX_PAGE_LINKS {
            return Err(Error::cursor_decode(
                self.link_for(cursor),
                format!(
                    "rows {} to {} span {expected} pages, more than the {MAX_PAGE_LINKS} allowed",
                    cursor.current_row, cursor.max_row
                ),
            ));
        }
        Ok(self.links(cursor).collect())
    }

    /// URL for a single cursor
    pub fn link_for(&self, cursor: &PaginationCursor) -> String {
        let encoded = CursorCodec::encode(cursor);
        let mut url = self.base.clone();
        let prefix = url
            .path()
            .rsplit_once('/')
            .map(|(head, _)| head.to_string())
            .unwrap_or_default();
        url.set_path(&format!("{prefix}/{encoded}"));
        url.into()
    }
}
