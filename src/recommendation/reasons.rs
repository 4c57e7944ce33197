//! Human-readable reasons for database recommendations.

use crate::recommendation::benefits::{canonical_tag, classify, describe};
use crate::types::{PlantRecord, RecommendationContext};
use crate::utils::normalize_name;

/// "a", "a and b", "a, b and c"
pub fn join_names<S: AsRef<str>>(names: &[S]) -> String {
    match names {
        [] => String::new(),
        [one] => one.as_ref().to_string(),
        [init @ .., last] => {
            let head: Vec<&str> = init.iter().map(|s| s.as_ref()).collect();
            format!("{} and {}", head.join(", "), last.as_ref())
        }
    }
}

/// Benefit phrases of a record, strongest class first, one per canonical tag.
pub fn benefit_phrases(record: &PlantRecord) -> Vec<String> {
    let mut tags: Vec<String> = record.benefits.iter().map(|b| canonical_tag(b)).collect();
    tags.retain(|t| !t.is_empty());
    tags.sort_by(|a, b| classify(b).cmp(&classify(a)).then_with(|| a.cmp(b)));
    tags.dedup();
    tags.iter().map(|t| describe(t)).collect()
}

/// Reason text for a database-sourced recommendation.
///
/// `record` is `None` for companion labels that do not resolve to a record;
/// those get the pairing sentence only.
pub fn database_reason(
    paired_with: &[String],
    record: Option<&PlantRecord>,
    context: &RecommendationContext,
) -> String {
    let mut reason = if paired_with.is_empty() {
        "Recorded as a companion plant".to_string()
    } else {
        format!("Good companion for {}", join_names(paired_with))
    };

    let Some(record) = record else {
        reason.push('.');
        return reason;
    };

    let phrases = benefit_phrases(record);
    if phrases.is_empty() {
        reason.push('.');
    } else {
        reason.push_str(": ");
        reason.push_str(&join_names(&phrases));
        reason.push('.');
    }

    if let Some(note) = soil_note(record, context) {
        reason.push(' ');
        reason.push_str(&note);
    }

    reason
}

/// Warning when the site soil does not match what the record asks for.
/// Silent when either side lacks the data.
pub fn soil_note(record: &PlantRecord, context: &RecommendationContext) -> Option<String> {
    let soil = record.soil_requirements.as_ref()?;
    let mut notes = Vec::new();

    if let (Some(ph), Some(range)) = (context.soil_ph, soil.ph_range) {
        if !range.contains(ph) {
            notes.push(format!(
                "prefers pH {:.1}-{:.1} (site is {:.1})",
                range.min, range.max, ph
            ));
        }
    }

    if let Some(site) = context.soil_type.as_deref() {
        let site = normalize_name(site);
        if !site.is_empty() && !soil.soil_types.is_empty() {
            let matches = soil.soil_types.iter().any(|t| normalize_name(t) == site);
            if !matches {
                let wanted: Vec<&str> = soil.soil_types.iter().map(|s| s.as_str()).collect();
                notes.push(format!("prefers {} soil", wanted.join(" or ")));
            }
        }
    }

    if notes.is_empty() {
        None
    } else {
        Some(format!("Note: {}.", join_names(&notes)))
    }
}

/// Fallback text for AI entries that arrived without a reason.
pub fn generic_ai_reason(crops: &[String]) -> String {
    format!("Suggested as a companion for {}.", join_names(crops))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Range, SoilRequirements};

    fn basil() -> PlantRecord {
        let mut r =
            PlantRecord::new("basil", "Basil").with_benefits(["ornamental", "pest-deterrence"]);
        r.soil_requirements = Some(SoilRequirements {
            soil_types: ["loam".to_string(), "sandy".to_string()].into_iter().collect(),
            ph_range: Some(Range::new(6.0, 7.0)),
            ..Default::default()
        });
        r
    }

    #[test]
    fn test_join_names() {
        assert_eq!(join_names::<&str>(&[]), "");
        assert_eq!(join_names(&["Tomato"]), "Tomato");
        assert_eq!(join_names(&["Tomato", "Basil"]), "Tomato and Basil");
        assert_eq!(join_names(&["a", "b", "c"]), "a, b and c");
    }

    #[test]
    fn test_database_reason_orders_benefits() {
        let reason = database_reason(
            &["Tomato".to_string()],
            Some(&basil()),
            &RecommendationContext::default(),
        );
        assert_eq!(reason, "Good companion for Tomato: deters pests and is ornamental.");
    }

    #[test]
    fn test_unresolved_companion_reason() {
        let reason = database_reason(
            &["Tomato".to_string(), "Pepper".to_string()],
            None,
            &RecommendationContext::default(),
        );
        assert_eq!(reason, "Good companion for Tomato and Pepper.");
    }

    #[test]
    fn test_soil_note() {
        let ctx = RecommendationContext {
            soil_ph: Some(5.0),
            soil_type: Some("Clay".to_string()),
            ..Default::default()
        };
        let note = soil_note(&basil(), &ctx).unwrap();
        assert!(note.contains("pH 6.0-7.0 (site is 5.0)"));
        assert!(note.contains("loam or sandy soil"));

        let ok = RecommendationContext {
            soil_ph: Some(6.5),
            soil_type: Some("Loam".to_string()),
            ..Default::default()
        };
        assert!(soil_note(&basil(), &ok).is_none());
        assert!(soil_note(&PlantRecord::new("x", "X"), &ctx).is_none());
    }
}
