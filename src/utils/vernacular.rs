//! Common-name handling
//!
//! Plant sheets often cram several common names into one field
//! (`"Marigold; French Marigold | Tagetes"`). The first entry is the
//! display name, the rest become lookup aliases.

/// Format a display label for a plant.
///
/// Returns: "Display Name (Scientific name)" or just "Display Name"
pub fn display_label(name: &str, scientific_name: Option<&str>) -> String {
    match scientific_name.map(str::trim).filter(|s| !s.is_empty()) {
        Some(sci) if !sci.eq_ignore_ascii_case(name.trim()) => format!("{} ({})", name.trim(), sci),
        _ => name.trim().to_string(),
    }
}

/// Split a multi-name field on `;` or `|`, keeping the original order.
pub fn split_names(raw: &str) -> Vec<String> {
    let separators = [';', '|'];
    raw.split(|c| separators.contains(&c))
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// Split a multi-name field into (primary name, aliases).
pub fn primary_and_aliases(raw: &str) -> Option<(String, Vec<String>)> {
    let mut names = split_names(raw).into_iter();
    let primary = names.next()?;
    Some((primary, names.collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_names() {
        assert_eq!(
            split_names("Marigold; French Marigold | Tagetes"),
            vec!["Marigold", "French Marigold", "Tagetes"]
        );
        assert_eq!(split_names("   ;   "), Vec::<String>::new());
        assert_eq!(split_names("Basil"), vec!["Basil"]);
    }

    #[test]
    fn test_primary_and_aliases() {
        let (primary, aliases) = primary_and_aliases("Corn; Maize").unwrap();
        assert_eq!(primary, "Corn");
        assert_eq!(aliases, vec!["Maize"]);
        assert!(primary_and_aliases(" | ").is_none());
    }

    #[test]
    fn test_display_label() {
        assert_eq!(
            display_label("Basil", Some("Ocimum basilicum")),
            "Basil (Ocimum basilicum)"
        );
        assert_eq!(display_label("Basil", Some("  ")), "Basil");
        assert_eq!(display_label("Basil", None), "Basil");
        assert_eq!(display_label("Borage", Some("borage")), "Borage");
    }
}
