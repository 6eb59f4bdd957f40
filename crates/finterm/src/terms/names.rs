/// Canonical form used to match term names across documents and taxonomies.
pub fn normalize_name(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    let spaced = cleaned.replace(['_', '-'], " ");
    let collapsed = spaced.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.to_lowercase()
}

/// True when the normalized `name` contains any of the normalized `needles`.
pub(crate) fn mentions_any(name: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| name.contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_name_collapses_separators_and_case() {
        let source = "\u{feff}Prepayment__Penalty  -  Early";
        assert_eq!(normalize_name(source), "prepayment penalty early");
    }

    #[test]
    fn mentions_any_matches_substrings() {
        assert!(mentions_any("annual management fee", &["management", "custody"]));
        assert!(!mentions_any("origination fee", &["management"]));
    }
}
