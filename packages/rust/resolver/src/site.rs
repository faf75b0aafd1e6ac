//! Department site index scraping.
//!
//! A department page links one archive index per year; each year index
//! is a table with separate "Circulars" and "Circular Letters"
//! sections. Rows carry the document identifier, its issue date, and
//! the link to the document itself.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, warn};
use url::Url;

use circex_content::visible_text;

use crate::client::SiteClient;

static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"20\d{2}").expect("year regex"));
static URL_YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/(\d{4})/").expect("url year regex"));

static LETTER_SECTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)circular\s+letters?\s+\d{4}").expect("section regex"));
static CIRCULAR_SECTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)circulars?\s+\d{4}").expect("section regex"));
static LETTER_SECTION_BARE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bcircular\s+letters?\b").expect("section regex"));
static CIRCULAR_SECTION_BARE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bcirculars?\b").expect("section regex"));
static COLUMN_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)circular.*date.*description|noti.*date.*description").expect("header regex")
});

static LETTER_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)/CL\d+\.htm").expect("letter url regex"));
static CIRCULAR_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)/C\d+\.htm").expect("circular url regex"));

static ID_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)No\.\s*(\d+)").expect("id number regex"));
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("ws regex"));

/// Header-area patterns for the document's own number.
static NUMBER_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)(?:circular|letter)\s+no\.\s*(\d+)",
        r"(?i)no\.\s*(\d+)",
        r"(?i)(\d+)\s+of\s+\d{4}",
    ]
    .into_iter()
    .map(|p| Regex::new(p).expect("number regex"))
    .collect()
});

/// Date shapes seen in document headers.
static DATE_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(\w+\s+\d{1,2},\s+\d{4})",
        r"(\d{1,2}\s+\w+\s+\d{4})",
        r"(\d{1,2}/\d{1,2}/\d{4})",
        r"(\d{4}-\d{2}-\d{2})",
    ]
    .into_iter()
    .map(|p| Regex::new(p).expect("date regex"))
    .collect()
});

/// URL fragments that mark navigation links, not documents.
const IRRELEVANT_URL_PARTS: [&str; 10] = [
    "library",
    "help",
    "index.asp",
    "sitemap",
    "contact",
    "feedback",
    "about",
    "careers",
    "events",
    "javascript:",
];

/// One year archive linked from a department page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearLink {
    pub year: String,
    pub url: String,
}

/// One document row from a year index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircularListing {
    pub title: String,
    /// Identifier from the index table's first column, when usable.
    pub id: Option<String>,
    pub date: Option<String>,
    pub url: String,
}

/// A year index split into its two sections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct YearListing {
    pub circulars: Vec<CircularListing>,
    pub circular_letters: Vec<CircularListing>,
}

#[derive(Clone, Copy, PartialEq)]
enum Section {
    Circulars,
    CircularLetters,
}

/// Scrape the year archive links from a department page, newest first.
pub async fn extract_year_links<C: SiteClient>(client: &C, department_url: &str) -> Vec<YearLink> {
    let Some(body) = client.fetch(department_url).await else {
        return Vec::new();
    };
    let mut links = parse_year_links(&body, department_url);
    links.sort_by(|a, b| b.year.cmp(&a.year));
    links
}

fn parse_year_links(body: &str, department_url: &str) -> Vec<YearLink> {
    let doc = Html::parse_document(body);
    let sel = Selector::parse(r#"a[href*="20"][href*="index.htm"]"#).unwrap();

    let mut links: Vec<YearLink> = Vec::new();
    for anchor in doc.select(&sel) {
        let href = anchor.value().attr("href").unwrap_or_default();
        let text = visible_text(anchor);
        let Some(year) = YEAR_RE
            .find(&format!("{href}{text}"))
            .map(|m| m.as_str().to_string())
        else {
            continue;
        };
        if links.iter().any(|l| l.year == year) {
            continue;
        }
        links.push(YearLink {
            year,
            url: absolute_url(department_url, href),
        });
    }
    links
}

/// Scrape one year index into classified document listings.
///
/// `title_keywords` is a whitelist applied to titles with word-boundary
/// matching; empty keeps everything.
pub async fn extract_circular_links<C: SiteClient>(
    client: &C,
    year_url: &str,
    title_keywords: &[String],
) -> YearListing {
    let Some(body) = client.fetch(year_url).await else {
        return YearListing::default();
    };
    parse_year_index(&body, year_url, title_keywords)
}

fn parse_year_index(body: &str, year_url: &str, title_keywords: &[String]) -> YearListing {
    let doc = Html::parse_document(body);

    let target_year = URL_YEAR_RE
        .captures(year_url)
        .map(|caps| caps[1].to_string());

    // The index table is the one mentioning "circular" and the year.
    let table_sel = Selector::parse("table").unwrap();
    let main_table = doc.select(&table_sel).find(|table| {
        let text = visible_text(*table).to_lowercase();
        text.contains("circular")
            && target_year
                .as_ref()
                .is_some_and(|year| text.contains(year.as_str()))
    });
    let Some(main_table) = main_table else {
        warn!(%year_url, "no circular index table found");
        return YearListing::default();
    };

    let row_sel = Selector::parse("tr").unwrap();
    let link_sel = Selector::parse(r#"a[href$=".htm"]"#).unwrap();
    let cell_sel = Selector::parse("td").unwrap();

    let mut listing = YearListing::default();
    let mut current_section: Option<Section> = None;

    for row in main_table.select(&row_sel) {
        let row_text = visible_text(row);
        let row_text = row_text.trim();

        // Section header rows flip the classification context.
        if LETTER_SECTION_RE.is_match(row_text) {
            current_section = Some(Section::CircularLetters);
            continue;
        }
        if CIRCULAR_SECTION_RE.is_match(row_text) && !row_text.to_lowercase().contains("letter") {
            current_section = Some(Section::Circulars);
            continue;
        }
        if LETTER_SECTION_BARE_RE.is_match(row_text) && row_text.len() < 50 {
            current_section = Some(Section::CircularLetters);
            continue;
        }
        if CIRCULAR_SECTION_BARE_RE.is_match(row_text)
            && !row_text.to_lowercase().contains("letter")
            && row_text.len() < 50
        {
            current_section = Some(Section::Circulars);
            continue;
        }

        if COLUMN_HEADER_RE.is_match(row_text) {
            continue;
        }
        if row_text.len() < 10 {
            continue;
        }

        let links: Vec<_> = row.select(&link_sel).collect();
        if links.is_empty() {
            continue;
        }
        let cells: Vec<_> = row.select(&cell_sel).collect();
        if cells.len() < 3 {
            continue;
        }

        let row_id = normalize_ws(&visible_text(cells[0]));
        let row_date = clean_date_text(&visible_text(cells[1]));

        for anchor in links {
            let href = anchor.value().attr("href").unwrap_or_default();
            let title = normalize_ws(&visible_text(anchor));
            if href.is_empty() || title.is_empty() {
                continue;
            }

            let full_url = absolute_url(year_url, href);
            let lowered_url = full_url.to_lowercase();
            if IRRELEVANT_URL_PARTS.iter().any(|part| lowered_url.contains(part)) {
                continue;
            }

            // Only take the first-column identifier when it looks like
            // one rather than spilled table content.
            let id = (row_id.len() < 50 && row_id.chars().any(|c| c.is_ascii_digit()))
                .then(|| row_id.clone());

            if !title_keywords.is_empty() && !contains_keywords(&title, title_keywords) {
                debug!(%title, "skipping listing, no keyword match");
                continue;
            }

            let item = CircularListing {
                title,
                id,
                date: row_date.clone(),
                url: full_url.clone(),
            };

            // URL pattern beats section context beats title wording.
            if LETTER_URL_RE.is_match(&full_url) {
                listing.circular_letters.push(item);
            } else if CIRCULAR_URL_RE.is_match(&full_url) {
                listing.circulars.push(item);
            } else if current_section == Some(Section::CircularLetters) {
                listing.circular_letters.push(item);
            } else if current_section == Some(Section::Circulars) {
                listing.circulars.push(item);
            } else if item.title.to_lowercase().contains("circular letter") {
                listing.circular_letters.push(item);
            } else {
                listing.circulars.push(item);
            }
        }
    }

    dedup_by_url(&mut listing.circulars);
    dedup_by_url(&mut listing.circular_letters);
    listing.circulars.sort_by_key(listing_sort_key);
    listing.circular_letters.sort_by_key(listing_sort_key);
    listing
}

fn dedup_by_url(items: &mut Vec<CircularListing>) {
    let mut seen = std::collections::HashSet::new();
    items.retain(|item| seen.insert(item.url.clone()));
}

fn listing_sort_key(item: &CircularListing) -> u32 {
    item.id
        .as_deref()
        .and_then(|id| ID_NUMBER_RE.captures(id))
        .and_then(|caps| caps[1].parse().ok())
        .unwrap_or(999)
}

/// Pull the document's own number and issue date out of its header
/// area (first part of the main layout table).
pub fn extract_number_and_date(body: &str) -> (Option<String>, Option<String>) {
    let doc = Html::parse_document(body);
    let table_sel = Selector::parse(r#"table[width="95%"]"#).unwrap();

    let header_text = match doc.select(&table_sel).next() {
        Some(table) => {
            let text = visible_text(table);
            text.chars().take(500).collect::<String>()
        }
        None => return (None, None),
    };

    let number = NUMBER_RES
        .iter()
        .find_map(|re| re.captures(&header_text))
        .map(|caps| caps[1].to_string());
    let date = extract_date_from_text(&header_text);
    (number, date)
}

/// Normalize a date cell: strip line breaks, collapse whitespace.
/// `None` when nothing usable remains.
pub fn clean_date_text(raw: &str) -> Option<String> {
    let cleaned = normalize_ws(raw);
    (cleaned.len() >= 3).then_some(cleaned)
}

fn extract_date_from_text(text: &str) -> Option<String> {
    let cleaned = clean_date_text(text)?;
    DATE_RES
        .iter()
        .find_map(|re| re.captures(&cleaned))
        .map(|caps| caps[1].to_string())
}

/// Word-boundary keyword whitelist match.
pub fn contains_keywords(text: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|keyword| {
        Regex::new(&format!(r"(?i)\b{}\b", regex::escape(keyword)))
            .map(|re| re.is_match(text))
            .unwrap_or(false)
    })
}

fn normalize_ws(text: &str) -> String {
    WHITESPACE_RE.replace_all(text.trim(), " ").into_owned()
}

fn absolute_url(base: &str, href: &str) -> String {
    match Url::parse(base).and_then(|base| base.join(href)) {
        Ok(url) => url.to_string(),
        Err(_) => href.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_links_dedup_and_sort_newest_first() {
        let body = r#"<html><body>
            <a href="/bprd/2021/index.htm">2021</a>
            <a href="/bprd/2019/index.htm">2019</a>
            <a href="/bprd/2021/index.htm">2021 again</a>
            <a href="/bprd/contact.htm">Contact</a>
        </body></html>"#;
        let links = parse_year_links(body, "https://www.sbp.org.pk/bprd/index.htm");
        assert_eq!(links.len(), 2);
        // Sorting happens in the async wrapper; raw parse keeps order.
        assert_eq!(links[0].year, "2021");
        assert_eq!(links[0].url, "https://www.sbp.org.pk/bprd/2021/index.htm");
    }

    #[test]
    fn year_index_classifies_by_url_then_section() {
        let body = r#"<html><body><table>
            <tr><td colspan="3">Circulars 2014</td></tr>
            <tr><td>Circular No. 02</td><td>March 5, 2014</td>
                <td><a href="C2.htm">Margin Requirements for Import Transactions</a></td></tr>
            <tr><td colspan="3">Circular Letters 2014</td></tr>
            <tr><td>Circular Letter No. 01</td><td>January 10, 2014</td>
                <td><a href="CL1.htm">Clarification regarding Margin Requirements</a></td></tr>
            <tr><td>Circular Letter No. 03</td><td>June 1, 2014</td>
                <td><a href="extra1.htm">Sectioned Item without URL Pattern</a></td></tr>
        </table></body></html>"#;
        let listing =
            parse_year_index(body, "https://www.sbp.org.pk/acd/2014/index.htm", &[]);
        assert_eq!(listing.circulars.len(), 1);
        assert_eq!(listing.circular_letters.len(), 2);
        assert_eq!(
            listing.circulars[0].url,
            "https://www.sbp.org.pk/acd/2014/C2.htm"
        );
        assert_eq!(listing.circulars[0].id.as_deref(), Some("Circular No. 02"));
        assert_eq!(listing.circulars[0].date.as_deref(), Some("March 5, 2014"));
    }

    #[test]
    fn year_index_sorts_by_listed_number() {
        let body = r#"<html><body><table>
            <tr><td colspan="3">Circulars 2014</td></tr>
            <tr><td>Circular No. 10</td><td>October 2, 2014</td>
                <td><a href="C10.htm">Tenth circular of the year</a></td></tr>
            <tr><td>Circular No. 02</td><td>February 1, 2014</td>
                <td><a href="C2.htm">Second circular of the year</a></td></tr>
        </table></body></html>"#;
        let listing =
            parse_year_index(body, "https://www.sbp.org.pk/acd/2014/index.htm", &[]);
        assert_eq!(listing.circulars[0].id.as_deref(), Some("Circular No. 02"));
        assert_eq!(listing.circulars[1].id.as_deref(), Some("Circular No. 10"));
    }

    #[test]
    fn keyword_filter_uses_word_boundaries() {
        let keywords = vec!["AML".to_string()];
        assert!(contains_keywords("Updated AML Regulations", &keywords));
        // "AML" inside a longer word must not match.
        assert!(!contains_keywords("Streamlining of Procedures", &keywords));

        let body = r#"<html><body><table>
            <tr><td colspan="3">Circulars 2014</td></tr>
            <tr><td>Circular No. 01</td><td>January 5, 2014</td>
                <td><a href="C1.htm">Streamlining of Procedures</a></td></tr>
            <tr><td>Circular No. 02</td><td>March 5, 2014</td>
                <td><a href="C2.htm">Updated AML Regulations</a></td></tr>
        </table></body></html>"#;
        let listing = parse_year_index(
            body,
            "https://www.sbp.org.pk/acd/2014/index.htm",
            &keywords,
        );
        assert_eq!(listing.circulars.len(), 1);
        assert_eq!(listing.circulars[0].title, "Updated AML Regulations");
    }

    #[test]
    fn number_and_date_from_document_header() {
        let body = r#"<html><body><table width="95%">
            <tr><td>ACD Circular No. 01 of 2014</td></tr>
            <tr><td>January 29, 2014</td></tr>
            <tr><td><blockquote>Body text follows here.</blockquote></td></tr>
        </table></body></html>"#;
        let (number, date) = extract_number_and_date(body);
        assert_eq!(number.as_deref(), Some("01"));
        assert_eq!(date.as_deref(), Some("January 29, 2014"));
    }

    #[test]
    fn clean_date_handles_breaks_and_noise() {
        assert_eq!(
            clean_date_text("March\r\n 5,\t 2014").as_deref(),
            Some("March 5, 2014")
        );
        assert_eq!(clean_date_text("  \r\n "), None);
        assert_eq!(clean_date_text("--"), None);
    }
}
