//! Benefit Tag Lookup Tables
//!
//! Maps benefit tags to a biodiversity weight and a readable phrase.
//! Ecological functions (pest deterrence, pollinators, soil) outrank
//! general garden utility, which outranks purely aesthetic tags.

use crate::utils::normalize_tag;

/// Weight class of a benefit tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BenefitClass {
    Aesthetic,
    Other,
    Functional,
    Ecological,
}

impl BenefitClass {
    pub fn weight(&self) -> u32 {
        match self {
            BenefitClass::Ecological => 3,
            BenefitClass::Functional => 2,
            BenefitClass::Other => 1,
            BenefitClass::Aesthetic => 0,
        }
    }
}

/// A known benefit tag
#[derive(Debug, Clone)]
pub struct BenefitTag {
    pub tag: &'static str,
    pub class: BenefitClass,
    pub phrase: &'static str,
}

impl BenefitTag {
    const fn new(tag: &'static str, class: BenefitClass, phrase: &'static str) -> Self {
        Self { tag, class, phrase }
    }
}

static BENEFIT_TAGS: &[BenefitTag] = &[
    BenefitTag::new("pest-deterrence", BenefitClass::Ecological, "deters pests"),
    BenefitTag::new("pollinator-attraction", BenefitClass::Ecological, "attracts pollinators"),
    BenefitTag::new("soil-improvement", BenefitClass::Ecological, "improves the soil"),
    BenefitTag::new("nitrogen-fixation", BenefitClass::Ecological, "fixes nitrogen"),
    BenefitTag::new(
        "beneficial-insect-attraction",
        BenefitClass::Ecological,
        "attracts beneficial insects",
    ),
    BenefitTag::new("weed-suppression", BenefitClass::Functional, "suppresses weeds"),
    BenefitTag::new("ground-cover", BenefitClass::Functional, "provides ground cover"),
    BenefitTag::new("trap-crop", BenefitClass::Functional, "acts as a trap crop"),
    BenefitTag::new("structural-support", BenefitClass::Functional, "gives structural support"),
    BenefitTag::new("shade-provision", BenefitClass::Functional, "provides shade"),
    BenefitTag::new("disease-suppression", BenefitClass::Functional, "helps suppress disease"),
    BenefitTag::new("mulch", BenefitClass::Functional, "produces mulch"),
    BenefitTag::new("flavor-enhancement", BenefitClass::Functional, "improves flavor"),
    BenefitTag::new("ornamental", BenefitClass::Aesthetic, "is ornamental"),
    BenefitTag::new("aesthetic", BenefitClass::Aesthetic, "adds visual interest"),
    BenefitTag::new("fragrance", BenefitClass::Aesthetic, "is fragrant"),
    BenefitTag::new("decorative", BenefitClass::Aesthetic, "is decorative"),
];

/// Spellings seen in plant sheets -> canonical tag
static TAG_ALIASES: &[(&str, &str)] = &[
    ("pest-control", "pest-deterrence"),
    ("pest-repellent", "pest-deterrence"),
    ("repels-pests", "pest-deterrence"),
    ("attracts-pollinators", "pollinator-attraction"),
    ("pollinators", "pollinator-attraction"),
    ("soil-health", "soil-improvement"),
    ("nitrogen-fixing", "nitrogen-fixation"),
    ("nitrogen-fixer", "nitrogen-fixation"),
    ("attracts-beneficial-insects", "beneficial-insect-attraction"),
    ("beneficial-insects", "beneficial-insect-attraction"),
    ("weed-control", "weed-suppression"),
    ("living-mulch", "ground-cover"),
    ("support", "structural-support"),
    ("shade", "shade-provision"),
    ("improves-flavor", "flavor-enhancement"),
    ("flavour-enhancement", "flavor-enhancement"),
];

/// Canonical form of a tag (normalized, aliases resolved).
pub fn canonical_tag(raw: &str) -> String {
    let tag = normalize_tag(raw);
    TAG_ALIASES
        .iter()
        .find(|(alias, _)| *alias == tag)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(tag)
}

/// Table entry for a tag, if it is a known one.
pub fn lookup_tag(raw: &str) -> Option<&'static BenefitTag> {
    let tag = canonical_tag(raw);
    BENEFIT_TAGS.iter().find(|b| b.tag == tag)
}

/// Weight class of any tag; unknown tags count as `Other`.
pub fn classify(raw: &str) -> BenefitClass {
    lookup_tag(raw).map(|b| b.class).unwrap_or(BenefitClass::Other)
}

/// Biodiversity score of a tag set. Aliases of the same tag count once.
pub fn benefit_score<'a, I>(tags: I) -> u32
where
    I: IntoIterator<Item = &'a String>,
{
    let mut seen: Vec<String> = Vec::new();
    let mut score = 0;
    for raw in tags {
        let tag = canonical_tag(raw);
        if tag.is_empty() || seen.contains(&tag) {
            continue;
        }
        score += classify(&tag).weight();
        seen.push(tag);
    }
    score
}

/// Readable phrase for a tag: table phrase, or the tag with spaces.
pub fn describe(raw: &str) -> String {
    match lookup_tag(raw) {
        Some(b) => b.phrase.to_string(),
        None => canonical_tag(raw).replace('-', " "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_weights_order() {
        assert!(BenefitClass::Ecological.weight() > BenefitClass::Functional.weight());
        assert!(BenefitClass::Functional.weight() > BenefitClass::Other.weight());
        assert!(BenefitClass::Other.weight() > BenefitClass::Aesthetic.weight());
    }

    #[test]
    fn test_benefit_score() {
        assert_eq!(benefit_score(&tags(&["pest-deterrence"])), 3);
        assert_eq!(benefit_score(&tags(&["pest-deterrence", "pollinator-attraction"])), 6);
        assert_eq!(benefit_score(&tags(&["ornamental", "fragrance"])), 0);
        assert_eq!(benefit_score(&tags(&["edible-leaves"])), 1);
        // Alias and canonical spelling of the same tag count once
        assert_eq!(benefit_score(&tags(&["pest_control", "pest-deterrence"])), 3);
        assert_eq!(benefit_score(&tags(&[])), 0);
    }

    #[test]
    fn test_describe() {
        assert_eq!(describe("Attracts Pollinators"), "attracts pollinators");
        assert_eq!(describe("nitrogen_fixing"), "fixes nitrogen");
        assert_eq!(describe("edible-leaves"), "edible leaves");
    }
}
