//! Block normalization: raw element blocks → the final ordered body.
//!
//! - Adjacent paragraphs merge into one `Content` block.
//! - A numbered point directly followed by lists/tables becomes a
//!   `HierarchicalContent` block owning them.
//! - Adjacent lists merge, then every multi-item list is renumbered
//!   sequentially so merged fragments read as one list.
//! - `Container` blocks are normalized recursively and spliced inline.

use std::sync::LazyLock;

use circex_shared::ContentBlock;
use regex::Regex;

/// Enumerator prefixes: "1.", "2)", "A.", "i)", "IV." and so on.
static NUMBERED_POINT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:\d+|[A-Za-z]|[IVX]+|[ivx]+)[.)]\s+").expect("numbered point regex")
});

/// Leading decimal numbering on a list item, stripped on renumber.
static ITEM_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\s*").expect("item number regex"));

/// Whether a paragraph opens with an enumerator and may own the
/// list/table blocks that follow it.
pub fn is_numbered_point(text: &str) -> bool {
    NUMBERED_POINT_RE.is_match(text)
}

/// Normalize a raw block sequence into the final document body.
pub fn group_consecutive_content(blocks: Vec<ContentBlock>) -> Vec<ContentBlock> {
    let mut grouped: Vec<ContentBlock> = Vec::new();
    let mut current: Option<ContentBlock> = None;

    let mut i = 0;
    while i < blocks.len() {
        match &blocks[i] {
            ContentBlock::Container { blocks: nested } => {
                for nested_block in group_consecutive_content(nested.clone()) {
                    match nested_block {
                        ContentBlock::Paragraph { text } => {
                            append_paragraph(&mut grouped, &mut current, text);
                        }
                        other => {
                            flush(&mut grouped, &mut current);
                            grouped.push(other);
                        }
                    }
                }
            }
            ContentBlock::Paragraph { text } => {
                // A numbered point adopts the run of lists/tables that
                // immediately follows it.
                if is_numbered_point(text) {
                    let mut j = i + 1;
                    while j < blocks.len()
                        && matches!(
                            blocks[j],
                            ContentBlock::List { .. } | ContentBlock::Table { .. }
                        )
                    {
                        j += 1;
                    }
                    if j > i + 1 {
                        flush(&mut grouped, &mut current);
                        grouped.push(ContentBlock::HierarchicalContent {
                            main_text: text.clone(),
                            sub_content: blocks[i + 1..j].to_vec(),
                        });
                        i = j;
                        continue;
                    }
                }
                append_paragraph(&mut grouped, &mut current, text.clone());
            }
            ContentBlock::List { items } => match &mut current {
                Some(ContentBlock::List { items: current_items }) => {
                    current_items.extend(items.iter().cloned());
                }
                _ => {
                    if let Some(ContentBlock::List { items: last_items }) = grouped.last_mut() {
                        last_items.extend(items.iter().cloned());
                    } else {
                        flush(&mut grouped, &mut current);
                        current = Some(ContentBlock::List {
                            items: items.clone(),
                        });
                    }
                }
            },
            other => {
                flush(&mut grouped, &mut current);
                grouped.push(other.clone());
            }
        }
        i += 1;
    }
    flush(&mut grouped, &mut current);

    // Merged lists carry numbering from their source fragments;
    // renumber so the result counts 1, 2, 3 without gaps.
    for block in &mut grouped {
        if let ContentBlock::List { items } = block {
            if items.len() > 1 {
                for (n, item) in items.iter_mut().enumerate() {
                    let stripped = ITEM_NUMBER_RE.replace(item.text.trim(), "");
                    item.text = format!("{}. {stripped}", n + 1);
                }
            }
        }
    }

    grouped
}

fn append_paragraph(
    grouped: &mut Vec<ContentBlock>,
    current: &mut Option<ContentBlock>,
    text: String,
) {
    if let Some(ContentBlock::Content { text: group_text }) = current {
        group_text.push_str("\n\n");
        group_text.push_str(&text);
    } else {
        flush(grouped, current);
        *current = Some(ContentBlock::Content { text });
    }
}

fn flush(grouped: &mut Vec<ContentBlock>, current: &mut Option<ContentBlock>) {
    if let Some(group) = current.take() {
        grouped.push(group);
    }
}
