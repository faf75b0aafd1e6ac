//! Element → raw content block conversion.

use circex_shared::ContentBlock;
use scraper::ElementRef;

use crate::list::parse_list_items;
use crate::table::parse_table;
use crate::text::{clean_text, element_text, is_unwanted_content};

/// Convert one structural element into a raw [`ContentBlock`].
///
/// Raw means pre-normalization: paragraphs are emitted individually
/// and blockquotes become containers; grouping happens afterwards.
pub fn parse_content_element(element: ElementRef<'_>) -> Option<ContentBlock> {
    match element.value().name() {
        "p" | "div" => {
            let text = clean_text(&element_text(element));
            if text.is_empty() || is_unwanted_content(&text) {
                return None;
            }
            Some(ContentBlock::Paragraph { text })
        }
        "ol" | "ul" => {
            let items = parse_list_items(element);
            if items.is_empty() {
                return None;
            }
            Some(ContentBlock::List { items })
        }
        "table" => parse_table(element),
        // Spans only matter when they carry substantial content, like
        // a numbered point rendered without a paragraph wrapper.
        "span" => {
            let text = clean_text(&element_text(element));
            if text.len() <= 20 || is_unwanted_content(&text) {
                return None;
            }
            Some(ContentBlock::Paragraph { text })
        }
        "blockquote" => {
            let mut blocks: Vec<ContentBlock> = element
                .children()
                .filter_map(ElementRef::wrap)
                .filter_map(parse_content_element)
                .collect();
            match blocks.len() {
                0 => None,
                1 => blocks.pop(),
                _ => Some(ContentBlock::Container { blocks }),
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn parse_first(html: &str, selector: &str) -> Option<ContentBlock> {
        let doc = Html::parse_fragment(html);
        let sel = Selector::parse(selector).unwrap();
        parse_content_element(doc.select(&sel).next().expect("element"))
    }

    #[test]
    fn paragraph_text_is_cleaned() {
        let block = parse_first("<p>  Banks are \n advised.  </p>", "p").expect("block");
        assert_eq!(
            block,
            ContentBlock::Paragraph {
                text: "Banks are advised.".into()
            }
        );
    }

    #[test]
    fn navigation_paragraph_is_dropped() {
        assert!(parse_first("<p>Home</p>", "p").is_none());
    }

    #[test]
    fn short_span_is_dropped_long_span_kept() {
        assert!(parse_first("<span>2. Short</span>", "span").is_none());
        let block = parse_first(
            "<span>2. In addition, banks shall report quarterly.</span>",
            "span",
        )
        .expect("block");
        assert!(matches!(block, ContentBlock::Paragraph { .. }));
    }

    #[test]
    fn blockquote_with_single_child_unwraps() {
        let block = parse_first(
            "<blockquote><p>Only paragraph inside the quote.</p></blockquote>",
            "blockquote",
        )
        .expect("block");
        assert!(matches!(block, ContentBlock::Paragraph { .. }));
    }

    #[test]
    fn blockquote_with_multiple_children_is_container() {
        let block = parse_first(
            "<blockquote><p>First paragraph here.</p><ol><li>item</li></ol></blockquote>",
            "blockquote",
        )
        .expect("block");
        match block {
            ContentBlock::Container { blocks } => assert_eq!(blocks.len(), 2),
            other => panic!("expected container, got {other:?}"),
        }
    }
}
