//! Department name → URL code resolution, with historical renames.
//!
//! Two departments were renamed around 2006 and the site keeps the old
//! archives under the old code, so the issuing year decides which code
//! a citation resolves to.

/// Last year the pre-rename codes ("bsd", "bpd") were in use.
const RENAME_CUTOFF_YEAR: i32 = 2006;

/// Resolve a parsed department name (uppercase) plus optional year to
/// the lowercase URL path code.
///
/// Returns `None` for unknown departments; callers must not attempt
/// URL construction in that case.
pub fn department_code(department: &str, year: Option<&str>) -> Option<&'static str> {
    let year_num = year.and_then(|y| y.parse::<i32>().ok());

    match department {
        // Renamed in 2007; missing or unparseable year defaults to the
        // newer code.
        "BSD" => match year_num {
            Some(y) if y <= RENAME_CUTOFF_YEAR => Some("bsd"),
            _ => Some("bsrvd"),
        },
        "BPD" | "BPRD" => match year_num {
            Some(y) if y <= RENAME_CUTOFF_YEAR => Some("bpd"),
            _ => Some("bprd"),
        },
        // The agricultural credit department appears under several
        // names across eras; all live under the same archive.
        "ACD" | "AC&MFD" | "ACMFD" | "ACFID" => Some("acd"),
        "BSRVD" => Some("bsrvd"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bsd_splits_on_rename_year() {
        assert_eq!(department_code("BSD", Some("2005")), Some("bsd"));
        assert_eq!(department_code("BSD", Some("2006")), Some("bsd"));
        assert_eq!(department_code("BSD", Some("2007")), Some("bsrvd"));
    }

    #[test]
    fn bpd_splits_on_rename_year() {
        assert_eq!(department_code("BPD", Some("2006")), Some("bpd"));
        assert_eq!(department_code("BPD", Some("2007")), Some("bprd"));
        assert_eq!(department_code("BPRD", Some("2004")), Some("bpd"));
        assert_eq!(department_code("BPRD", Some("2012")), Some("bprd"));
    }

    #[test]
    fn missing_year_defaults_to_newer_code() {
        assert_eq!(department_code("BSD", None), Some("bsrvd"));
        assert_eq!(department_code("BPD", None), Some("bprd"));
        assert_eq!(department_code("BPRD", Some("n/a")), Some("bprd"));
    }

    #[test]
    fn acd_family_shares_one_archive() {
        for name in ["ACD", "AC&MFD", "ACMFD", "ACFID"] {
            assert_eq!(department_code(name, Some("2014")), Some("acd"));
        }
    }

    #[test]
    fn unknown_department_is_none() {
        assert_eq!(department_code("XYZ", Some("2014")), None);
        assert_eq!(department_code("", None), None);
    }
}
