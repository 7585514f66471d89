//! Mutable HTML document model.
//!
//! - `document`: arena tree with cached `html/head/body/title` lookups
//! - `attrs`: ordered, case-insensitive attribute list
//! - `parse`: `tl`-backed parser producing a [`Document`]
//! - `serialize`: markup output
//! - `query`: CSS selector matching (via `scraper`) used by ignore rules

mod attrs;
mod document;
mod parse;
mod query;
mod serialize;

use thiserror::Error;

pub use attrs::Attrs;
pub use document::{Document, ElementData, NodeData, NodeId};
pub use parse::parse_document;
pub use query::parse_selector;

/// Errors raised while turning source text into a [`Document`].
#[derive(Debug, Error)]
pub enum DomError {
    #[error("failed to parse html: {0}")]
    Parse(String),

    #[error("input is not an html document (no <html> element)")]
    NotADocument,
}
