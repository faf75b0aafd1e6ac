//! Text extraction and boilerplate filtering helpers.

use std::sync::LazyLock;

use regex::Regex;
use scraper::ElementRef;

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("ws regex"));

static NBSP_LEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*&nbsp;\s*").expect("nbsp regex"));
static NBSP_TRAILING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*&nbsp;\s*$").expect("nbsp regex"));

/// Navigation words, bare section labels, separator runs.
static UNWANTED_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)^(Home|Back|Print|Download|Search)$",
        r"(?i)^(Department|Circular|Notification)s?\s*$",
        r"^\s*\|\s*$",
        r"^\s*[-_=]+\s*$",
    ]
    .into_iter()
    .map(|p| Regex::new(p).expect("unwanted regex"))
    .collect()
});

/// All text under an element, each fragment trimmed, joined by spaces.
pub fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Collapse whitespace runs and strip stray nbsp entities.
pub fn clean_text(text: &str) -> String {
    let collapsed = WHITESPACE_RE.replace_all(text, " ");
    let trimmed = collapsed.trim();
    let no_lead = NBSP_LEADING_RE.replace(trimmed, "");
    NBSP_TRAILING_RE.replace(&no_lead, "").into_owned()
}

/// Whether a text fragment is boilerplate to drop before block
/// construction.
pub fn is_unwanted_content(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.len() < 3 {
        return true;
    }
    UNWANTED_RES.iter().any(|re| re.is_match(trimmed))
}

/// Text of an element subtree, skipping script/style/title subtrees.
pub fn visible_text(element: ElementRef<'_>) -> String {
    let mut parts = Vec::new();
    collect_visible(element, &mut parts);
    parts.join(" ")
}

fn collect_visible(element: ElementRef<'_>, parts: &mut Vec<String>) {
    if matches!(element.value().name(), "script" | "style" | "title") {
        return;
    }
    for node in element.children() {
        if let Some(child) = ElementRef::wrap(node) {
            collect_visible(child, parts);
        } else if let Some(text) = node.value().as_text() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                parts.push(trimmed.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn clean_text_collapses_whitespace() {
        assert_eq!(clean_text("  a \n\t b  "), "a b");
        assert_eq!(clean_text("&nbsp; body &nbsp;"), "body");
    }

    #[test]
    fn unwanted_patterns() {
        assert!(is_unwanted_content("Home"));
        assert!(is_unwanted_content("Circulars"));
        assert!(is_unwanted_content(" | "));
        assert!(is_unwanted_content("-----"));
        assert!(is_unwanted_content("ab"));
        assert!(!is_unwanted_content("Banks are advised to comply."));
    }

    #[test]
    fn visible_text_skips_script_and_style() {
        let html = Html::parse_document(
            "<html><head><title>T</title><style>p{}</style></head>\
             <body><p>Kept</p><script>var x;</script></body></html>",
        );
        let text = visible_text(html.root_element());
        assert_eq!(text, "Kept");
    }
}
