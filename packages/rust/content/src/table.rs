//! Table parsing: header detection, row reconciliation, dedup.

use circex_shared::ContentBlock;
use scraper::{ElementRef, Selector};

use crate::text::{clean_text, element_text};

/// Words that mark a short cell as a likely column header.
const HEADER_KEYWORDS: [&str; 8] = [
    "reference",
    "requirement",
    "description",
    "name",
    "type",
    "date",
    "number",
    "status",
];

/// Parse a `<table>` element into a [`ContentBlock::Table`].
///
/// Returns `None` when the table has no rows worth keeping.
pub fn parse_table(table: ElementRef<'_>) -> Option<ContentBlock> {
    let row_sel = Selector::parse("tr").unwrap();
    let cell_sel = Selector::parse("td, th").unwrap();

    let rows: Vec<ElementRef<'_>> = table.select(&row_sel).collect();
    if rows.is_empty() {
        return None;
    }

    let first_row_cells: Vec<ElementRef<'_>> = rows[0].select(&cell_sel).collect();
    let is_header_row = detect_header_row(&first_row_cells);

    let mut headers: Option<Vec<String>> = None;
    let mut start_row = 0;
    if is_header_row && !first_row_cells.is_empty() {
        headers = Some(
            first_row_cells
                .iter()
                .map(|cell| clean_text(&element_text(*cell)))
                .collect(),
        );
        start_row = 1;
    }

    let header_signature: Option<Vec<String>> =
        headers.as_ref().map(|h| signature(h));

    let mut data: Vec<Vec<String>> = Vec::new();
    let mut seen: Vec<Vec<String>> = Vec::new();

    for row in &rows[start_row..] {
        let cells: Vec<ElementRef<'_>> = row.select(&cell_sel).collect();
        if cells.is_empty() {
            continue;
        }

        let mut row_data: Vec<String> = cells
            .iter()
            .map(|cell| clean_text(&element_text(*cell)))
            .collect();

        if row_data.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        // Reconcile column count against the header.
        if let Some(headers) = &headers {
            if row_data.len() < headers.len() {
                row_data.resize(headers.len(), String::new());
            } else if row_data.len() > headers.len() {
                row_data.truncate(headers.len());
            }
        }

        let row_signature = signature(&row_data);

        if seen.contains(&row_signature) {
            continue;
        }
        if header_signature.as_ref() == Some(&row_signature) {
            continue;
        }
        // Rows whose cells all reappear in an already-seen longer row
        // are incomplete duplicates.
        let is_subset = seen.iter().any(|seen_row| {
            row_signature.len() < seen_row.len()
                && row_signature
                    .iter()
                    .filter(|cell| !cell.trim().is_empty())
                    .all(|cell| seen_row.contains(cell))
        });
        if is_subset {
            continue;
        }
        // Mostly-empty rows against a known header are noise.
        if let Some(headers) = &headers {
            let non_empty = row_data.iter().filter(|cell| !cell.trim().is_empty()).count();
            if non_empty * 2 < headers.len() {
                continue;
            }
        }

        seen.push(row_signature);
        data.push(row_data);
    }

    if headers.is_none() && data.is_empty() {
        return None;
    }
    Some(ContentBlock::Table {
        headers,
        rows: data,
    })
}

/// A row is a header row when it uses `<th>` markup, or when at least
/// 60% of its cells look like headers (short text, domain keywords).
fn detect_header_row(cells: &[ElementRef<'_>]) -> bool {
    if cells.is_empty() {
        return false;
    }
    if cells.iter().any(|cell| cell.value().name() == "th") {
        return true;
    }

    let mut indicators = 0;
    for cell in cells {
        let text = clean_text(&element_text(*cell));
        if text.is_empty() {
            continue;
        }
        let lowered = text.to_lowercase();
        if text.len() < 100 && HEADER_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
            indicators += 1;
        } else if text.len() < 30 {
            indicators += 1;
        }
    }
    indicators as f64 >= cells.len() as f64 * 0.6
}

fn signature(row: &[String]) -> Vec<String> {
    row.iter().map(|cell| cell.trim().to_lowercase()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn parse(html: &str) -> Option<ContentBlock> {
        let doc = Html::parse_fragment(html);
        let sel = Selector::parse("table").unwrap();
        parse_table(doc.select(&sel).next().expect("table"))
    }

    fn table_parts(block: ContentBlock) -> (Option<Vec<String>>, Vec<Vec<String>>) {
        match block {
            ContentBlock::Table { headers, rows } => (headers, rows),
            other => panic!("expected table, got {other:?}"),
        }
    }

    #[test]
    fn th_row_becomes_headers() {
        let block = parse(
            "<table><tr><th>Reference</th><th>Date</th></tr>\
             <tr><td>BPRD 02</td><td>2012</td></tr></table>",
        )
        .expect("table");
        let (headers, rows) = table_parts(block);
        assert_eq!(headers, Some(vec!["Reference".into(), "Date".into()]));
        assert_eq!(rows, vec![vec!["BPRD 02".to_string(), "2012".to_string()]]);
    }

    #[test]
    fn keyword_cells_detected_as_headers_without_th() {
        let block = parse(
            "<table><tr><td>Circular Number</td><td>Issue Date</td></tr>\
             <tr><td>01</td><td>January 29, 2014</td></tr></table>",
        )
        .expect("table");
        let (headers, _) = table_parts(block);
        assert!(headers.is_some());
    }

    #[test]
    fn duplicate_and_header_echo_rows_are_dropped() {
        let block = parse(
            "<table><tr><th>Name</th><th>Status</th></tr>\
             <tr><td>Name</td><td>Status</td></tr>\
             <tr><td>Alpha</td><td>Active</td></tr>\
             <tr><td>Alpha</td><td>Active</td></tr></table>",
        )
        .expect("table");
        let (_, rows) = table_parts(block);
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn short_rows_are_padded_to_header_width() {
        let block = parse(
            "<table><tr><th>Name</th><th>Date</th><th>Status</th></tr>\
             <tr><td>Alpha</td><td>2014</td></tr></table>",
        )
        .expect("table");
        let (_, rows) = table_parts(block);
        assert_eq!(rows[0].len(), 3);
        assert_eq!(rows[0][2], "");
    }

    #[test]
    fn empty_table_is_none() {
        assert!(parse("<table></table>").is_none());
        assert!(parse("<table><tr><td> </td></tr></table>").is_none());
    }
}
