//! Reference detection: scan normalized document text for citations.
//!
//! Scans the full text rather than per-paragraph because citations can
//! span text reconstructed from adjacent markup fragments. Detected
//! matches are filtered for self-references and deduplicated; actually
//! resolving them is the graph resolver's job.

use circex_shared::RefKind;
use std::collections::HashSet;
use tracing::debug;

use crate::grammar::{CIRCULAR_LETTER_RE, CIRCULAR_RE};
use crate::normalize::normalize_title;

/// One surviving citation match, ready to become a reference edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedReference {
    pub kind: RefKind,
    /// Reconstructed display title ("BPRD Circular No. 02 of 2012").
    pub title: String,
}

/// Detect citations in `content`.
///
/// `document_title` and `document_id` (the document's own canonical
/// identifier, when known) are used to exclude self-references.
pub fn detect_references(
    content: &str,
    document_title: &str,
    document_id: &str,
) -> Vec<DetectedReference> {
    let mut references = Vec::new();
    let mut seen = HashSet::new();

    // Circular matches first, then letters, preserving source order
    // within each kind.
    for (kind, re) in [
        (RefKind::Circular, &*CIRCULAR_RE),
        (RefKind::CircularLetter, &*CIRCULAR_LETTER_RE),
    ] {
        for caps in re.captures_iter(content) {
            let dept = &caps[1];
            let number = &caps[2];
            let of_clause = caps.get(3).map(|m| m.as_str());
            let dated_clause = caps.get(4).map(|m| m.as_str());

            let title = reconstruct_title(kind, &caps[0], dept, number, of_clause, dated_clause);

            if is_self_reference(kind, &title, document_title, document_id) {
                debug!(%title, "skipping self-reference");
                continue;
            }

            // One edge per logical citation even when mentioned twice.
            let dedup_key = format!(
                "{}_{}_{}_{}",
                kind.as_str(),
                dept,
                number,
                of_clause.or(dated_clause).unwrap_or("no_date"),
            );
            if !seen.insert(dedup_key) {
                continue;
            }

            references.push(DetectedReference { kind, title });
        }
    }

    references
}

/// Rebuild a clean display title from the capture groups, preserving
/// whether the source text carried a "No." prefix.
fn reconstruct_title(
    kind: RefKind,
    matched_text: &str,
    dept: &str,
    number: &str,
    of_clause: Option<&str>,
    dated_clause: Option<&str>,
) -> String {
    let kind_word = match kind {
        RefKind::Circular => "Circular",
        RefKind::CircularLetter => "Circular Letter",
    };

    let mut title = if matched_text.to_lowercase().contains("no.") {
        format!("{dept} {kind_word} No. {number}")
    } else {
        format!("{dept} {kind_word} {number}")
    };
    if let Some(of) = of_clause {
        title.push_str(&format!(" of {of}"));
    }
    if let Some(dated) = dated_clause {
        title.push_str(&format!(" dated {dated}"));
    }
    title
}

fn is_self_reference(
    kind: RefKind,
    title: &str,
    document_title: &str,
    document_id: &str,
) -> bool {
    let normalized = normalize_title(title);

    // Compare against the document's own identifier, but only when the
    // identifier is the same kind as the match.
    if !document_id.is_empty() && id_kind(document_id) == kind {
        let normalized_id = normalize_title(document_id);
        if normalized == normalized_id {
            return true;
        }
        // Same citation with a date clause present on one side only
        // ("BPRD Circular No. 02" vs "... 02 of 2012"), in either
        // direction. The trailing space keeps "Circular 1" from
        // swallowing "Circular 10".
        if normalized.starts_with(&format!("{normalized_id} "))
            || normalized_id.starts_with(&format!("{normalized} "))
        {
            return true;
        }
    }

    if !document_title.is_empty() {
        let normalized_doc = normalize_title(document_title);
        if normalized == normalized_doc {
            return true;
        }
        // Citation text embedded inside the document's own title.
        if kind == RefKind::Circular
            && normalized.len() < normalized_doc.len()
            && normalized_doc.contains(&normalized)
        {
            return true;
        }
    }

    false
}

/// Kind of the document's own identifier string.
fn id_kind(document_id: &str) -> RefKind {
    if document_id.to_lowercase().contains("letter") {
        RefKind::CircularLetter
    } else {
        RefKind::Circular
    }
}
