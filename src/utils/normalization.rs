//! Name Normalization Utilities
//!
//! Plant names arrive from three places that never agree on spelling:
//! record ids (`sweet_basil`), display names (`Sweet Basil`) and free text
//! typed by users or returned by the model (`  sweet-basils `). Everything
//! is folded into one comparable form before any lookup or dedup.

use smallvec::SmallVec;

/// Fold a plant name or id into its comparison form.
///
/// Lower-cases, treats `_` and `-` as spaces, drops other punctuation and
/// collapses runs of whitespace. `"  Sweet_Basil! "` becomes `"sweet basil"`.
pub fn normalize_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;

    for ch in raw.trim().chars() {
        if ch.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.extend(ch.to_lowercase());
        } else if ch.is_whitespace() || ch == '_' || ch == '-' {
            pending_space = true;
        }
        // Apostrophes, dots, parentheses etc. are dropped
    }

    out
}

/// Singular/plural variants of an already-normalized name, original first.
///
/// Only the trailing word is inflected: `"cherry tomatoes"` yields
/// `"cherry tomato"`.
pub fn name_variants(normalized: &str) -> SmallVec<[String; 3]> {
    let mut variants: SmallVec<[String; 3]> = SmallVec::new();
    if normalized.is_empty() {
        return variants;
    }
    variants.push(normalized.to_string());

    if let Some(singular) = singularize(normalized) {
        if !variants.contains(&singular) {
            variants.push(singular);
        }
    } else if !normalized.ends_with('s') {
        variants.push(format!("{}s", normalized));
    }

    variants
}

fn singularize(word: &str) -> Option<String> {
    if word.len() <= 3 {
        return None;
    }

    if let Some(stem) = word.strip_suffix("ies") {
        return Some(format!("{}y", stem));
    }

    for suffix in ["oes", "ches", "shes", "xes", "sses"] {
        if word.ends_with(suffix) {
            return Some(word[..word.len() - 2].to_string());
        }
    }

    if word.ends_with('s') && !word.ends_with("ss") && !word.ends_with("us") {
        return Some(word[..word.len() - 1].to_string());
    }

    None
}

/// Singular form of an already-normalized name (unchanged if not plural).
pub fn singular_form(normalized: &str) -> String {
    singularize(normalized).unwrap_or_else(|| normalized.to_string())
}

/// Derive a record id from a display name: `"Sweet Basil"` -> `"sweet_basil"`.
pub fn slugify(name: &str) -> String {
    normalize_name(name).replace(' ', "_")
}

/// Fold a benefit/soil tag: `"Pest_Deterrence "` -> `"pest-deterrence"`.
pub fn normalize_tag(raw: &str) -> String {
    normalize_name(raw).replace(' ', "-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Sweet_Basil! "), "sweet basil");
        assert_eq!(normalize_name("Tomato"), "tomato");
        assert_eq!(normalize_name("black-eyed   pea"), "black eyed pea");
        assert_eq!(normalize_name("St. John's Wort"), "st johns wort");
        assert_eq!(normalize_name("   "), "");
    }

    #[test]
    fn test_name_variants() {
        assert_eq!(name_variants("tomatoes").as_slice(), ["tomatoes", "tomato"]);
        assert_eq!(name_variants("strawberries").as_slice(), ["strawberries", "strawberry"]);
        assert_eq!(name_variants("carrots").as_slice(), ["carrots", "carrot"]);
        assert_eq!(name_variants("basil").as_slice(), ["basil", "basils"]);
        // Words ending in -ss / -us are not plurals
        assert_eq!(name_variants("asparagus").as_slice(), ["asparagus"]);
        assert_eq!(name_variants("grass").as_slice(), ["grass"]);
        assert!(name_variants("").is_empty());
    }

    #[test]
    fn test_singular_form() {
        assert_eq!(singular_form("marigolds"), "marigold");
        assert_eq!(singular_form("bush beans"), "bush bean");
        assert_eq!(singular_form("basil"), "basil");
    }

    #[test]
    fn test_slug_and_tag() {
        assert_eq!(slugify("Sweet Basil"), "sweet_basil");
        assert_eq!(slugify("  Bush-Bean "), "bush_bean");
        assert_eq!(normalize_tag("Pest_Deterrence "), "pest-deterrence");
        assert_eq!(normalize_tag("attracts pollinators"), "attracts-pollinators");
    }
}
