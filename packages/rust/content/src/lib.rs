//! HTML → normalized content blocks for circex.
//!
//! Turns the source site's table-soup markup into the ordered,
//! typed [`ContentBlock`] sequence attached to every document:
//! - [`document`] — main-content selection, page-level extraction, PDF links
//! - [`blocks`] — per-element block conversion
//! - [`list`] / [`table`] — structure reconciliation for the messy bits
//! - [`normalize`] — paragraph grouping, list merging, renumbering
//!
//! [`ContentBlock`]: circex_shared::ContentBlock

pub mod blocks;
pub mod document;
pub mod list;
pub mod normalize;
pub mod table;
pub mod text;

pub use blocks::parse_content_element;
pub use document::{PdfLink, extract_pdf_links, extract_structured_content, select_main_content};
pub use normalize::group_consecutive_content;
pub use text::visible_text;
