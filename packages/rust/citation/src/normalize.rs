//! Title normalization: any phrasing of a citation → one comparison key.
//!
//! The key is used for cache-adjacent equality checks, cycle detection
//! and self-reference detection. Two phrasings of the same logical
//! document must collide ("BPRD Circular No. 02 of 2012" and
//! "BPRD circular 2 of 2012" both normalize to "bprd circular 2 2012").
//! Dates are intentionally lossy: only the 4-digit year survives.

use crate::grammar::{CIRCULAR_LETTER_RE, CIRCULAR_RE, find_year};

/// Normalize a citation string into its comparison key.
///
/// When neither grammar branch matches, the lowercased trimmed input is
/// returned verbatim as a weaker fallback key.
pub fn normalize_title(title: &str) -> String {
    let lowered = title.trim().to_lowercase();

    let branches = [
        (true, &*CIRCULAR_LETTER_RE),
        (false, &*CIRCULAR_RE),
    ];

    for (is_letter, re) in branches {
        let Some(caps) = re.captures(&lowered) else {
            continue;
        };

        let department = caps[1].to_string();
        // Drop zero-padding by round-tripping through an integer.
        let number = caps[2].parse::<u64>().map_or_else(|_| caps[2].to_string(), |n| n.to_string());

        // Year from whichever clause is present; "dated" wins.
        let mut year = caps.get(3).and_then(|m| find_year(m.as_str()));
        if let Some(y) = caps.get(4).and_then(|m| find_year(m.as_str())) {
            year = Some(y);
        }

        let kind = if is_letter { "circular letter" } else { "circular" };
        return match year {
            Some(year) => format!("{department} {kind} {number} {year}"),
            None => format!("{department} {kind} {number}"),
        };
    }

    lowered
}
