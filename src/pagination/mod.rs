//! Pagination module
//!
//! Decodes the opaque cursor carried by a `nextPage` link and enumerates
//! every remaining page up front.
//!
//! # Overview
//!
//! - [`CursorCodec`] converts between a `nextPage` link and a [`PaginationCursor`]
//! - [`LinkEnumerator`] derives the ordered [`PageRequest`] list covering
//!   `[current_row, max_row]` in fixed strides
//!
//! Both are synchronous and side-effect free; only fetching suspends.

mod cursor;
mod links;

pub use cursor::{CursorCodec, PaginationCursor};
pub use links::{LinkEnumerator, PageRequest, MAX_PAGE_LINKS};
