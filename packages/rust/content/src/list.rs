//! List parsing with nesting support and malformed-markup recovery.
//!
//! The source site frequently emits a sub-list as a structural sibling
//! of its owning `<li>` instead of a child. A sibling list immediately
//! followed by another `<li>` is reattached to the preceding item.

use circex_shared::ListItem;
use scraper::ElementRef;

use crate::text::{clean_text, element_text};

/// Parse the items of an `<ol>`/`<ul>` element. Supports up to three
/// levels of nesting via recursion.
pub fn parse_list_items(list: ElementRef<'_>) -> Vec<ListItem> {
    let style = numbering_style(list);
    let children: Vec<ElementRef<'_>> = list
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|el| matches!(el.value().name(), "li" | "ol" | "ul"))
        .collect();

    let mut items: Vec<ListItem> = Vec::new();
    let mut number = 1usize;
    let mut i = 0;

    while i < children.len() {
        let child = children[i];
        match child.value().name() {
            "li" => {
                let mut text = clean_text(&item_text_excluding_lists(child));

                let formatted = format_list_number(number, style);
                if !text.is_empty() && !text.starts_with(&formatted) {
                    text = format!("{formatted} {text}");
                }

                let mut sub_items = Vec::new();
                // Properly nested lists inside this li.
                for nested in child
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|el| matches!(el.value().name(), "ol" | "ul"))
                {
                    sub_items.extend(parse_list_items(nested));
                }

                // Sibling lists that belong to this item.
                let mut j = i + 1;
                while j < children.len()
                    && matches!(children[j].value().name(), "ol" | "ul")
                {
                    let followed_by_li = match children.get(j + 1) {
                        Some(next) => next.value().name() == "li",
                        None => true,
                    };
                    if !followed_by_li {
                        break;
                    }
                    sub_items.extend(parse_list_items(children[j]));
                    j += 1;
                }
                i = j - 1;

                if !text.is_empty() || !sub_items.is_empty() {
                    items.push(ListItem { text, sub_items });
                }
                number += 1;
            }
            // A list with no owning li at all: attach to the previous
            // item when there is one, otherwise inline its items.
            _ => {
                let nested = parse_list_items(child);
                if !nested.is_empty() {
                    if let Some(last) = items.last_mut() {
                        last.sub_items.extend(nested);
                    } else {
                        items.extend(nested);
                    }
                }
            }
        }
        i += 1;
    }

    items
}

/// The text of an `<li>` with any nested list subtrees excluded.
fn item_text_excluding_lists(li: ElementRef<'_>) -> String {
    let mut parts = Vec::new();
    for node in li.children() {
        if let Some(el) = ElementRef::wrap(node) {
            if !matches!(el.value().name(), "ol" | "ul") {
                let text = element_text(el);
                if !text.is_empty() {
                    parts.push(text);
                }
            }
        } else if let Some(text) = node.value().as_text() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                parts.push(trimmed.to_string());
            }
        }
    }
    parts.join(" ")
}

/// Declared numbering style of an ordered list (`type` attribute,
/// defaulting to decimal). Unordered lists carry no style.
fn numbering_style(list: ElementRef<'_>) -> Option<&str> {
    if list.value().name() != "ol" {
        return None;
    }
    Some(list.value().attr("type").unwrap_or("1"))
}

/// Render a 1-based item number in the list's declared style.
pub fn format_list_number(number: usize, style: Option<&str>) -> String {
    match style {
        Some("A") if (1..=26).contains(&number) => {
            format!("{}.", char::from(b'A' + (number as u8 - 1)))
        }
        Some("a") if (1..=26).contains(&number) => {
            format!("{}.", char::from(b'a' + (number as u8 - 1)))
        }
        Some("I") => format!("{}.", to_roman(number)),
        Some("i") => format!("{}.", to_roman(number).to_lowercase()),
        _ => format!("{number}."),
    }
}

fn to_roman(mut num: usize) -> String {
    const VALUES: [(usize, &str); 13] = [
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    let mut result = String::new();
    for (value, symbol) in VALUES {
        while num >= value {
            result.push_str(symbol);
            num -= value;
        }
    }
    result
}
