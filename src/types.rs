//! Core data model: plant records, crops, request context and results.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeSet;

/// Closed numeric interval (pH, temperature).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    /// Build a range, swapping bounds given in the wrong order.
    pub fn new(a: f64, b: f64) -> Self {
        if a <= b {
            Range { min: a, max: b }
        } else {
            Range { min: b, max: a }
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SoilRequirements {
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub soil_types: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ph_range: Option<Range>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fertility: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drainage: Option<String>,
}

impl SoilRequirements {
    pub fn is_empty(&self) -> bool {
        self.soil_types.is_empty()
            && self.ph_range.is_none()
            && self.fertility.is_none()
            && self.drainage.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrowingConditions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sunlight: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water_needs: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_range: Option<Range>,
}

impl GrowingConditions {
    pub fn is_empty(&self) -> bool {
        self.sunlight.is_none() && self.water_needs.is_none() && self.temperature_range.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HarvestInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_to_maturity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yield_duration: Option<String>,
}

impl HarvestInfo {
    pub fn is_empty(&self) -> bool {
        self.days_to_maturity.is_none() && self.season.is_none() && self.yield_duration.is_none()
    }
}

/// A plant in the knowledge base.
///
/// Companion and antagonist entries are ids or free-text names; they do not
/// have to resolve to another record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantRecord {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scientific_name: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub aliases: BTreeSet<String>,
    #[serde(default)]
    pub companion_plants: BTreeSet<String>,
    #[serde(default)]
    pub antagonistic_plants: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soil_requirements: Option<SoilRequirements>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub growing_conditions: Option<GrowingConditions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub harvest_info: Option<HarvestInfo>,
    #[serde(default)]
    pub benefits: BTreeSet<String>,
}

impl PlantRecord {
    /// Minimal record with only id and name set.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        PlantRecord {
            id: id.into(),
            name: name.into(),
            scientific_name: None,
            aliases: BTreeSet::new(),
            companion_plants: BTreeSet::new(),
            antagonistic_plants: BTreeSet::new(),
            soil_requirements: None,
            growing_conditions: None,
            harvest_info: None,
            benefits: BTreeSet::new(),
        }
    }

    pub fn with_companions<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.companion_plants.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_antagonists<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.antagonistic_plants.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_benefits<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.benefits.extend(tags.into_iter().map(Into::into));
        self
    }
}

/// Whatever soil/growing/harvest/benefit data a record carries.
/// Missing sub-objects are omitted rather than defaulted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlantDetails {
    pub id: String,
    pub name: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soil: Option<SoilRequirements>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub growing: Option<GrowingConditions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub harvest: Option<HarvestInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub benefits: Vec<String>,
}

/// A crop confirmed by the user before asking for recommendations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedCrop {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl ConfirmedCrop {
    pub fn named(name: impl Into<String>) -> Self {
        ConfirmedCrop {
            name: name.into(),
            id: None,
        }
    }
}

impl From<&str> for ConfirmedCrop {
    fn from(name: &str) -> Self {
        ConfirmedCrop::named(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

/// One past season on the plot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HistoricalSeason {
    pub season: String,
    #[serde(default)]
    pub crops: Vec<String>,
}

/// Optional request context. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soil_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soil_ph: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<GpsCoordinate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<HistoricalSeason>,
}

impl RecommendationContext {
    /// Stable textual key used for caching AI suggestions.
    pub fn cache_key(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationSource {
    Database,
    Ai,
}

/// A ranked companion suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub plant: String,
    pub reason: String,
    pub source: RecommendationSource,
    /// Number of confirmed crops this plant is a listed companion to (database only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub support: Option<usize>,
    #[serde(default, skip_serializing_if = "SmallVec::is_empty")]
    pub paired_with: SmallVec<[String; 4]>,
}

/// Raw `{plant, reason}` pair returned by the AI fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiSuggestion {
    pub plant: String,
    #[serde(default)]
    pub reason: String,
}
