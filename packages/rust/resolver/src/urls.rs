//! Candidate URL construction for a parsed citation.
//!
//! The site's zero-padding and filename casing drifted over the years,
//! so one citation maps to several plausible URLs. Candidates are
//! probed in order; order and de-duplication are part of the contract.

use circex_shared::{Citation, RefKind};

/// Build the ordered candidate URL list for a citation.
///
/// Layout is `<base>/<dept_code>/<year>/<prefix><number>.htm` with a
/// `C`/`c` prefix for circulars and `CL`/`cl` for letters, crossed
/// with the padding variants of the number. Returns an empty list when
/// the year is missing, which callers treat as unresolvable.
pub fn construct_candidate_urls(
    base_url: &str,
    dept_code: &str,
    citation: &Citation,
) -> Vec<String> {
    let Some(year) = citation.year.as_deref() else {
        return Vec::new();
    };
    if dept_code.is_empty() || citation.number.is_empty() || year.is_empty() {
        return Vec::new();
    }

    let prefixes: [&str; 2] = match citation.kind {
        RefKind::Circular => ["C", "c"],
        RefKind::CircularLetter => ["CL", "cl"],
    };

    let number = citation.number.as_str();
    let mut number_variants = vec![number.to_string()];
    if number.len() == 1 {
        number_variants.push(format!("0{number}"));
    }
    if number.len() == 2 && number.starts_with('0') {
        let stripped = number.trim_start_matches('0');
        number_variants.push(if stripped.is_empty() { "0".into() } else { stripped.into() });
    }
    number_variants.dedup();

    let base = base_url.trim_end_matches('/');
    let mut urls = Vec::new();
    for num in &number_variants {
        for prefix in prefixes {
            let url = format!("{base}/{dept_code}/{year}/{prefix}{num}.htm");
            if !urls.contains(&url) {
                urls.push(url);
            }
        }
    }
    urls
}

#[cfg(test)]
mod tests {
    use super::*;

    fn citation(number: &str, year: Option<&str>, kind: RefKind) -> Citation {
        Citation {
            department: "ACD".into(),
            kind,
            number: number.into(),
            year: year.map(String::from),
            date: None,
            original_text: String::new(),
        }
    }

    const BASE: &str = "https://www.sbp.org.pk";

    #[test]
    fn padded_number_yields_four_candidates_in_order() {
        let urls = construct_candidate_urls(
            BASE,
            "acd",
            &citation("01", Some("2014"), RefKind::Circular),
        );
        assert_eq!(
            urls,
            vec![
                "https://www.sbp.org.pk/acd/2014/C01.htm",
                "https://www.sbp.org.pk/acd/2014/c01.htm",
                "https://www.sbp.org.pk/acd/2014/C1.htm",
                "https://www.sbp.org.pk/acd/2014/c1.htm",
            ]
        );
    }

    #[test]
    fn single_digit_number_also_tries_padded_form() {
        let urls = construct_candidate_urls(
            BASE,
            "bprd",
            &citation("5", Some("2020"), RefKind::Circular),
        );
        assert!(urls.contains(&"https://www.sbp.org.pk/bprd/2020/C5.htm".to_string()));
        assert!(urls.contains(&"https://www.sbp.org.pk/bprd/2020/C05.htm".to_string()));
        assert_eq!(urls.len(), 4);
    }

    #[test]
    fn two_digit_number_without_padding_has_no_variants() {
        let urls = construct_candidate_urls(
            BASE,
            "bprd",
            &citation("19", Some("2021"), RefKind::CircularLetter),
        );
        assert_eq!(
            urls,
            vec![
                "https://www.sbp.org.pk/bprd/2021/CL19.htm",
                "https://www.sbp.org.pk/bprd/2021/cl19.htm",
            ]
        );
    }

    #[test]
    fn no_duplicates_even_when_variants_collide() {
        let urls = construct_candidate_urls(
            BASE,
            "acd",
            &citation("00", Some("2010"), RefKind::Circular),
        );
        let mut deduped = urls.clone();
        deduped.dedup();
        assert_eq!(urls, deduped);
    }

    #[test]
    fn missing_year_is_unresolvable() {
        assert!(construct_candidate_urls(BASE, "acd", &citation("01", None, RefKind::Circular))
            .is_empty());
    }
}
