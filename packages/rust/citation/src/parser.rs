//! Title parser: free-text citation string → structured [`Citation`].

use circex_shared::{Citation, RefKind};

use crate::grammar::{CIRCULAR_LETTER_RE, CIRCULAR_RE, find_year};

/// Parse a citation title like
/// `"AC&MFD Circular No. 01 of 2014 dated January 29, 2014"`.
///
/// Returns `None` when no grammar branch matches; callers must treat
/// that as terminal for the citation (never retried).
pub fn parse_reference_title(title: &str) -> Option<Citation> {
    let title = title.trim();
    if title.is_empty() {
        return None;
    }

    // Letter branch first: it is the more specific of the two.
    let branches = [
        (RefKind::CircularLetter, &*CIRCULAR_LETTER_RE),
        (RefKind::Circular, &*CIRCULAR_RE),
    ];

    for (kind, re) in branches {
        let Some(caps) = re.captures(title) else {
            continue;
        };

        let department = caps[1].to_uppercase();
        // Canonical 2-digit zero-padded form.
        let number = format!("{:0>2}", &caps[2]);

        let of_clause = caps.get(3).map(|m| m.as_str().to_string());
        let dated_clause = caps.get(4).map(|m| m.as_str().to_string());

        // Year comes from whichever clause carries one; "dated" wins.
        let mut year = None;
        let mut date = None;
        if let Some(of) = &of_clause {
            year = find_year(of);
            date = Some(of.clone());
        }
        if let Some(dated) = &dated_clause {
            if let Some(y) = find_year(dated) {
                year = Some(y);
            }
            date = Some(dated.clone());
        }

        return Some(Citation {
            department,
            kind,
            number,
            year,
            date,
            original_text: title.to_string(),
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_circular_citation() {
        let citation =
            parse_reference_title("AC&MFD Circular No. 01 of 2014 dated January 29, 2014")
                .expect("parse");

        assert_eq!(citation.department, "AC&MFD");
        assert_eq!(citation.kind, RefKind::Circular);
        assert_eq!(citation.number, "01");
        assert_eq!(citation.year.as_deref(), Some("2014"));
        assert_eq!(citation.date.as_deref(), Some("January 29, 2014"));
    }

    #[test]
    fn parses_letter_without_no_prefix() {
        let citation = parse_reference_title("BPRD Circular Letter 19 of 2021").expect("parse");
        assert_eq!(citation.kind, RefKind::CircularLetter);
        assert_eq!(citation.number, "19");
        assert_eq!(citation.year.as_deref(), Some("2021"));
    }

    #[test]
    fn single_digit_number_is_zero_padded() {
        let citation = parse_reference_title("BPRD circular 2 of 2012").expect("parse");
        assert_eq!(citation.number, "02");
    }

    #[test]
    fn dated_clause_year_wins_over_of_clause() {
        let citation =
            parse_reference_title("BSD Circular No. 05 of 2005 dated March 3, 2006").expect("parse");
        assert_eq!(citation.year.as_deref(), Some("2006"));
        assert_eq!(citation.date.as_deref(), Some("March 3, 2006"));
    }

    #[test]
    fn year_only_of_clause() {
        let citation = parse_reference_title("BSD Circular No. 15 of August 11, 2005")
            .expect("parse");
        assert_eq!(citation.year.as_deref(), Some("2005"));
        assert_eq!(citation.date.as_deref(), Some("August 11, 2005"));
    }

    #[test]
    fn unparseable_title_returns_none() {
        assert!(parse_reference_title("").is_none());
        assert!(parse_reference_title("Annual Report 2014").is_none());
        assert!(parse_reference_title("Circular without department").is_none());
    }
}
