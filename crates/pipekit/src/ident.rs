//! Catalog identifier normalization.

/// Normalize an ISRC: drop dashes and upper-case.
///
/// ```
/// assert_eq!(pipekit::normalize_isrc("qm-9k-3120-0284"), "QM9K31200284");
/// ```
pub fn normalize_isrc(isrc: &str) -> String {
    isrc.chars()
        .filter(|c| *c != '-')
        .flat_map(char::to_uppercase)
        .collect()
}

/// Normalize a UPC: strip leading zeros, then zero-pad to 12 digits.
///
/// A GTIN-14 with leading zeros collapses to its UPC. Codes longer than 12
/// digits without leading zeros come back unchanged.
pub fn normalize_upc(upc: &str) -> String {
    format!("{:0>12}", upc.trim_start_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isrc_dashes_are_removed() {
        for (isrc, expected) in [
            ("12-345-67-89012", "123456789012"),
            ("21-098-76-54321", "210987654321"),
        ] {
            assert_eq!(normalize_isrc(isrc), expected);
        }
    }

    #[test]
    fn isrc_without_dashes_is_unchanged() {
        for isrc in ["123456789012", "210987654321"] {
            assert_eq!(normalize_isrc(isrc), isrc);
        }
    }

    #[test]
    fn isrc_is_upper_cased() {
        assert_eq!(normalize_isrc("qm-9k-3120-0284"), "QM9K31200284");
        assert_eq!(normalize_isrc("qm9k31200284"), "QM9K31200284");
    }

    #[test]
    fn upc_leading_zeros_collapse_to_twelve_digits() {
        for (upc, expected) in [
            ("00616892587125", "616892587125"),
            ("00076743106828", "076743106828"),
            ("00044003728271", "044003728271"),
            ("00802097028420", "802097028420"),
            ("00061528101723", "061528101723"),
            ("00856811001800", "856811001800"),
            ("00053361303525", "053361303525"),
        ] {
            assert_eq!(normalize_upc(upc), expected);
        }
    }

    #[test]
    fn long_upc_without_leading_zero_is_unchanged() {
        for upc in ["80330753510997", "80330753513226", "80330753510300"] {
            assert_eq!(normalize_upc(upc), upc);
        }
    }

    #[test]
    fn valid_upc_is_unchanged() {
        for upc in [
            "018736260971",
            "616822105825",
            "889845354086",
            "111118824126",
            "800684021212",
        ] {
            assert_eq!(normalize_upc(upc), upc);
        }
    }

    #[test]
    fn all_zero_upc_pads_back() {
        assert_eq!(normalize_upc("0000"), "000000000000");
        assert_eq!(normalize_upc(""), "000000000000");
    }
}
