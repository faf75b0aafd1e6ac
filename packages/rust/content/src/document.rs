//! Whole-page handling: main content selection, structured extraction,
//! PDF link discovery.
//!
//! The site serves two page generations. Older pages put the body in a
//! `<blockquote>`, newer ones in a `div[align="justify"]`; either way
//! the page is wrapped in fixed-width layout tables.

use std::sync::LazyLock;

use circex_shared::ContentBlock;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use crate::blocks::parse_content_element;
use crate::normalize::group_consecutive_content;
use crate::text::{clean_text, is_unwanted_content, visible_text};

static LEADING_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.").expect("leading number regex"));

/// A PDF attachment link found on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfLink {
    pub title: String,
    pub url: String,
}

/// Select the page's main content element.
///
/// Prefers the substantial layout table (width 95%/90%, over 1000
/// chars of text, not the navigation banner), then a `.content` /
/// `#content` element. `None` means use the whole document.
pub fn select_main_content(doc: &Html) -> Option<ElementRef<'_>> {
    let table_sel = Selector::parse(r#"table[width="95%"], table[width="90%"]"#).unwrap();
    for table in doc.select(&table_sel) {
        let text = visible_text(table);
        if text.len() > 1000 && !is_navigation_banner(&text) {
            return Some(table);
        }
    }

    let content_sel = Selector::parse(".content, #content").unwrap();
    doc.select(&content_sel).next()
}

fn is_navigation_banner(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.starts_with("Circulars/Notifications") && trimmed.ends_with("Department")
}

/// Extract the normalized block sequence from a content scope.
pub fn extract_structured_content(scope: ElementRef<'_>) -> Vec<ContentBlock> {
    let Some(main_area) = find_main_area(scope) else {
        return Vec::new();
    };

    let mut raw_blocks = Vec::new();
    for node in main_area.children() {
        if let Some(element) = ElementRef::wrap(node) {
            if let Some(block) = parse_content_element(element) {
                raw_blocks.push(block);
            }
        } else if let Some(text) = node.value().as_text() {
            // Bare text nodes between elements can carry real body
            // text on the oldest pages.
            let cleaned = clean_text(text);
            if cleaned.len() > 3 && !is_unwanted_content(&cleaned) {
                let keep = LEADING_NUMBER_RE.is_match(&cleaned)
                    || cleaned.to_lowercase().contains("acknowledge receipt")
                    || cleaned.len() > 20;
                if keep {
                    raw_blocks.push(ContentBlock::Paragraph { text: cleaned });
                }
            }
        }
    }

    debug!(raw = raw_blocks.len(), "collected raw blocks");
    group_consecutive_content(raw_blocks)
}

/// Find the body area inside the content scope: a meaningful
/// blockquote, else `div[align="justify"]`, else any substantial div,
/// else the scope itself.
fn find_main_area(scope: ElementRef<'_>) -> Option<ElementRef<'_>> {
    let blockquote_sel = Selector::parse("blockquote").unwrap();
    if let Some(bq) = scope.select(&blockquote_sel).next() {
        if visible_text(bq).len() >= 50 {
            return Some(bq);
        }
    }

    let justify_sel = Selector::parse(r#"div[align="justify"]"#).unwrap();
    if let Some(div) = scope.select(&justify_sel).next() {
        return Some(div);
    }

    let div_sel = Selector::parse("div").unwrap();
    for div in scope.select(&div_sel) {
        if visible_text(div).len() > 500 {
            return Some(div);
        }
    }

    Some(scope)
}

/// Find PDF attachment links anywhere in the page, resolved against
/// the page URL.
pub fn extract_pdf_links(doc: &Html, page_url: &str) -> Vec<PdfLink> {
    let link_sel = Selector::parse("a[href]").unwrap();
    let base = Url::parse(page_url).ok();

    let mut links = Vec::new();
    for anchor in doc.select(&link_sel) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if !href.to_lowercase().ends_with(".pdf") {
            continue;
        }
        let title = clean_text(&visible_text(anchor));
        if title.is_empty() {
            continue;
        }
        let url = match &base {
            Some(base) => base
                .join(href)
                .map(String::from)
                .unwrap_or_else(|_| href.to_string()),
            None => href.to_string(),
        };
        links.push(PdfLink { title, url });
    }
    links
}
