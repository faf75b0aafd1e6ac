//! The citation grammar, compiled once.
//!
//! Two branches, distinguished by the word "letter":
//!
//! ```text
//! <DEPT> circular [letter] [no.] <NUM> [of <YEAR-or-DATE>] [dated <DATE>]
//! ```
//!
//! `<DEPT>` is one or more uppercase letters/ampersand, optionally
//! possessive ("SBP's"). Capture groups are positional and shared by
//! every consumer: 1 = department, 2 = number, 3 = "of" clause,
//! 4 = "dated" clause. Grammar changes bump [`GRAMMAR_VERSION`] and
//! must keep the tests in this module passing.

use std::sync::LazyLock;

use regex::Regex;

/// Bumped whenever a branch or capture group changes meaning.
pub const GRAMMAR_VERSION: u32 = 1;

/// Plain circular branch.
pub static CIRCULAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)([A-Z&]+(?:['\u{2019}]s)?)\s+circular\s+(?:no\.\s*)?(\d+)(?:\s+of\s+([A-Za-z]+\s+\d{1,2},\s+\d{4}|\d{4}))?(?:\s+dated\s+([A-Za-z]+\s+\d{1,2},\s+\d{4}))?",
    )
    .expect("circular grammar regex")
});

/// Circular letter branch (more specific; tried first when parsing).
pub static CIRCULAR_LETTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)([A-Z&]+(?:['\u{2019}]s)?)\s+circular\s+letter\s+(?:no\.\s*)?(\d+)(?:\s+of\s+([A-Za-z]+\s+\d{1,2},\s+\d{4}|\d{4}))?(?:\s+dated\s+([A-Za-z]+\s+\d{1,2},\s+\d{4}))?",
    )
    .expect("circular letter grammar regex")
});

/// A 4-digit year anywhere in a date clause.
pub static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{4}").expect("year regex"));

/// Extract the 4-digit year from a date clause, if present.
pub fn find_year(clause: &str) -> Option<String> {
    YEAR_RE.find(clause).map(|m| m.as_str().to_string())
}
