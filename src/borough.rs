//! Borough name resolution for the parcel search form.
//!
//! ACRIS encodes boroughs as option values "1" through "5". Users type
//! anything from "BROOKLYN" to "kings" to "staten is"; this module maps all
//! of it to the form code through an immutable static table.
//!
//! Matching is exact first (case-insensitive, trimmed), then falls back to
//! a prefix match. The prefix pass scans keys longest-first, then
//! alphabetically, so resolution is deterministic regardless of how the
//! table is written out.

use once_cell::sync::Lazy;

/// Borough name (and alias) to ACRIS form code.
pub const BOROUGHS: &[(&str, &str)] = &[
    ("MANHATTAN", "1"),
    ("NEW YORK", "1"),
    ("MANHATTAN / NEW YORK", "1"),
    ("BRONX", "2"),
    ("BROOKLYN", "3"),
    ("KINGS", "3"),
    ("BROOKLYN / KINGS", "3"),
    ("QUEENS", "4"),
    ("STATEN ISLAND", "5"),
    ("RICHMOND", "5"),
    ("STATEN ISLAND / RICHMOND", "5"),
];

/// Table re-ordered for the prefix pass: longest key first, ties broken
/// alphabetically. Built once at first use.
static PREFIX_ORDER: Lazy<Vec<(&'static str, &'static str)>> = Lazy::new(|| {
    let mut table: Vec<_> = BOROUGHS.to_vec();
    table.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then(a.0.cmp(b.0)));
    table
});

/// Resolve free-text borough input to the ACRIS form code ("1".."5").
///
/// Returns `None` when neither an exact nor a prefix match exists; the
/// caller treats that as fatal before launching a browser.
pub fn resolve_borough(input: &str) -> Option<&'static str> {
    let needle = input.trim().to_uppercase();
    if needle.is_empty() {
        return None;
    }

    if let Some((_, code)) = BOROUGHS.iter().find(|(name, _)| *name == needle) {
        return Some(*code);
    }

    PREFIX_ORDER
        .iter()
        .find(|(name, _)| name.starts_with(&needle))
        .map(|(_, code)| *code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_matches() {
        assert_eq!(resolve_borough("BROOKLYN"), Some("3"));
        assert_eq!(resolve_borough("Kings"), Some("3"));
        assert_eq!(resolve_borough("brooklyn / kings"), Some("3"));
        assert_eq!(resolve_borough("  Manhattan  "), Some("1"));
        assert_eq!(resolve_borough("richmond"), Some("5"));
    }

    #[test]
    fn prefix_matches() {
        assert_eq!(resolve_borough("QUEEN"), Some("4"));
        assert_eq!(resolve_borough("staten"), Some("5"));
    }

    #[test]
    fn ambiguous_prefix_is_deterministic() {
        // "BRO" prefixes BRONX, BROOKLYN, and BROOKLYN / KINGS. Longest key
        // first means the Brooklyn alias wins every run.
        assert_eq!(resolve_borough("BRO"), Some("3"));
    }

    #[test]
    fn prefix_is_longest_key_first() {
        // "BROOKLYN / KINGS" (16 chars) outranks "BROOKLYN" (8) for the
        // shared prefix; both map to the same code, so the ordering only
        // shows for prefixes spanning different codes.
        assert_eq!(resolve_borough("BROOK"), Some("3"));
        // "STATEN ISLAND / RICHMOND" wins over "STATEN ISLAND"; same code.
        assert_eq!(resolve_borough("STATEN I"), Some("5"));
    }

    #[test]
    fn unknown_borough_fails() {
        assert_eq!(resolve_borough("ATLANTIS"), None);
        assert_eq!(resolve_borough(""), None);
        assert_eq!(resolve_borough("   "), None);
    }
}
