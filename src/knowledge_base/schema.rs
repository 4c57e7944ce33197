//! Plant data schema
//!
//! Turns the hand-edited `plants.json` document into typed records.
//! Required: an id (object key or `id` field) and a `name`. Everything else
//! is optional; a malformed optional field is dropped with the rest of the
//! record kept. Only a document that is not JSON, or not an object/array,
//! fails the whole load.

use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::KnowledgeBaseError;
use crate::types::{GrowingConditions, HarvestInfo, PlantRecord, Range, SoilRequirements};
use crate::utils::value::{field, get_object, value_as_f64};
use crate::utils::{get_str, get_string_list, get_u32, normalize_tag, primary_and_aliases, slugify};

/// A record that was dropped during load, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SkippedRecord {
    pub key: String,
    pub reason: String,
}

/// Parse a whole plant document.
///
/// Accepts `{id: record}`, `{"plants": {id: record}}` or `[record]` (ids
/// from each record's `id` field, or slugified from its name).
pub fn parse_document(
    doc: &Value,
) -> Result<(BTreeMap<String, PlantRecord>, Vec<SkippedRecord>), KnowledgeBaseError> {
    let mut records = BTreeMap::new();
    let mut skipped = Vec::new();

    let entries: Vec<(Option<String>, &Value)> = match doc {
        Value::Object(obj) => {
            let plants = match obj.get("plants") {
                Some(Value::Object(inner)) => inner,
                Some(Value::Array(items)) => {
                    return parse_document(&Value::Array(items.clone()));
                }
                _ => obj,
            };
            plants.iter().map(|(k, v)| (Some(k.clone()), v)).collect()
        }
        Value::Array(items) => items.iter().map(|v| (None, v)).collect(),
        other => {
            return Err(KnowledgeBaseError::InvalidShape(format!(
                "expected an object of plant records, found {}",
                json_type(other)
            )))
        }
    };

    for (position, (key, value)) in entries.into_iter().enumerate() {
        let label = key.clone().unwrap_or_else(|| format!("#{}", position));

        let Some(obj) = value.as_object() else {
            skipped.push(SkippedRecord {
                key: label,
                reason: format!("record is {}", json_type(value)),
            });
            continue;
        };

        match parse_record(key.as_deref(), obj) {
            Ok(record) => {
                if records.contains_key(&record.id) {
                    skipped.push(SkippedRecord {
                        key: label,
                        reason: format!("duplicate id {}", record.id),
                    });
                } else {
                    records.insert(record.id.clone(), record);
                }
            }
            Err(reason) => skipped.push(SkippedRecord { key: label, reason }),
        }
    }

    Ok((records, skipped))
}

/// Parse one record. `key` is the map key when the document is an object.
pub fn parse_record(key: Option<&str>, obj: &Map<String, Value>) -> Result<PlantRecord, String> {
    let raw_name = get_str(obj, &["name", "display_name", "common_name"])
        .ok_or_else(|| "missing name".to_string())?;
    let (name, mut aliases) =
        primary_and_aliases(raw_name).ok_or_else(|| "missing name".to_string())?;

    let id = key
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(|k| k.to_string())
        .or_else(|| get_str(obj, &["id"]).map(|s| s.to_string()))
        .unwrap_or_else(|| slugify(&name));
    if id.is_empty() {
        return Err("missing id".to_string());
    }

    if let Some(extra) = get_string_list(obj, &["aliases", "common_names"]) {
        aliases.extend(extra);
    }

    let mut record = PlantRecord::new(id, name);
    record.scientific_name =
        get_str(obj, &["scientific_name", "latin_name"]).map(|s| s.to_string());
    record.aliases = aliases.into_iter().filter(|a| a != &record.name).collect();
    record.companion_plants = name_set(obj, &["companion_plants", "companions"]);
    record.antagonistic_plants =
        name_set(obj, &["antagonistic_plants", "antagonists", "incompatible_plants"]);
    record.soil_requirements = get_object(obj, &["soil_requirements", "soil"])
        .map(parse_soil)
        .filter(|s| !s.is_empty());
    record.growing_conditions = get_object(obj, &["growing_conditions", "growing"])
        .map(parse_growing)
        .filter(|g| !g.is_empty());
    record.harvest_info = get_object(obj, &["harvest_info", "harvest"])
        .map(parse_harvest)
        .filter(|h| !h.is_empty());
    record.benefits = tag_set(obj, &["benefits", "benefit_tags"]);

    Ok(record)
}

fn name_set(obj: &Map<String, Value>, keys: &[&str]) -> BTreeSet<String> {
    get_string_list(obj, keys).unwrap_or_default().into_iter().collect()
}

fn tag_set(obj: &Map<String, Value>, keys: &[&str]) -> BTreeSet<String> {
    get_string_list(obj, keys)
        .unwrap_or_default()
        .iter()
        .map(|t| normalize_tag(t))
        .filter(|t| !t.is_empty())
        .collect()
}

fn tag(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    get_str(obj, keys).map(normalize_tag).filter(|t| !t.is_empty())
}

fn parse_soil(obj: &Map<String, Value>) -> SoilRequirements {
    SoilRequirements {
        soil_types: tag_set(obj, &["soil_types", "soil_type", "types"]),
        ph_range: field(obj, &["ph_range", "ph"]).and_then(parse_range),
        fertility: tag(obj, &["fertility"]),
        drainage: tag(obj, &["drainage"]),
    }
}

fn parse_growing(obj: &Map<String, Value>) -> GrowingConditions {
    GrowingConditions {
        sunlight: tag(obj, &["sunlight", "sun"]),
        water_needs: tag(obj, &["water_needs", "water"]),
        temperature_range: field(obj, &["temperature_range", "temperature"]).and_then(parse_range),
    }
}

fn parse_harvest(obj: &Map<String, Value>) -> HarvestInfo {
    let days = get_u32(obj, &["days_to_maturity", "days"]).or_else(|| {
        // "60-80" style ranges: keep the earliest day
        field(obj, &["days_to_maturity", "days"])
            .and_then(parse_range)
            .filter(|r| r.min >= 0.0 && r.min <= u32::MAX as f64)
            .map(|r| r.min.round() as u32)
    });

    HarvestInfo {
        days_to_maturity: days,
        season: tag(obj, &["season"]),
        yield_duration: tag(obj, &["yield_duration"]),
    }
}

/// Parse `{min,max}`, `[min,max]`, `"6.0-7.0"`, `"6.0 to 7.0"` or a single number.
pub fn parse_range(value: &Value) -> Option<Range> {
    match value {
        Value::Object(obj) => {
            let min = field(obj, &["min", "low", "from"]).and_then(value_as_f64);
            let max = field(obj, &["max", "high", "to"]).and_then(value_as_f64);
            match (min, max) {
                (Some(a), Some(b)) => Some(Range::new(a, b)),
                (Some(a), None) | (None, Some(a)) => Some(Range::new(a, a)),
                (None, None) => None,
            }
        }
        Value::Array(items) => match items.as_slice() {
            [a, b] => Some(Range::new(value_as_f64(a)?, value_as_f64(b)?)),
            [a] => value_as_f64(a).map(|v| Range::new(v, v)),
            _ => None,
        },
        Value::Number(_) => value_as_f64(value).map(|v| Range::new(v, v)),
        Value::String(s) => parse_range_str(s),
        _ => None,
    }
}

fn parse_range_str(raw: &str) -> Option<Range> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    let split = s
        .split_once(" to ")
        .or_else(|| s.split_once('–'))
        .or_else(|| {
            // A leading '-' is a sign, not a separator
            s.char_indices()
                .skip(1)
                .find(|(_, c)| *c == '-')
                .map(|(i, _)| (&s[..i], &s[i + 1..]))
        });

    match split {
        Some((a, b)) => Some(Range::new(leading_number(a)?, leading_number(b)?)),
        None => leading_number(s).map(|v| Range::new(v, v)),
    }
}

/// Parse the numeric prefix of strings like `"30°C"` or `" 6.5 "`.
fn leading_number(raw: &str) -> Option<f64> {
    let s = raw.trim();
    let end = s
        .char_indices()
        .find(|(i, c)| !(c.is_ascii_digit() || *c == '.' || (*i == 0 && (*c == '-' || *c == '+'))))
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    s[..end].parse::<f64>().ok().filter(|f| f.is_finite())
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_record() {
        let doc = json!({
            "tomato": {
                "name": "Tomato; Love Apple",
                "scientific_name": "Solanum lycopersicum",
                "companion_plants": ["Basil", "Marigold"],
                "antagonistic_plants": "Fennel, Cabbage",
                "soil_requirements": {
                    "soil_types": ["Loamy", "sandy_loam"],
                    "ph_range": {"min": 6.0, "max": 6.8},
                    "fertility": "High",
                    "drainage": "Well Drained"
                },
                "growing_conditions": {
                    "sunlight": "Full Sun",
                    "water_needs": "moderate",
                    "temperature_range": "18-29°C"
                },
                "harvest_info": {"days_to_maturity": "60-85", "season": "Summer"},
                "benefits": ["Pest_Deterrence"]
            }
        });

        let (records, skipped) = parse_document(&doc).unwrap();
        assert!(skipped.is_empty());
        let tomato = &records["tomato"];
        assert_eq!(tomato.name, "Tomato");
        assert!(tomato.aliases.contains("Love Apple"));
        assert_eq!(tomato.companion_plants.len(), 2);
        assert!(tomato.antagonistic_plants.contains("Cabbage"));

        let soil = tomato.soil_requirements.as_ref().unwrap();
        assert!(soil.soil_types.contains("loamy"));
        assert!(soil.soil_types.contains("sandy-loam"));
        assert_eq!(soil.ph_range, Some(Range { min: 6.0, max: 6.8 }));
        assert_eq!(soil.drainage.as_deref(), Some("well-drained"));

        let growing = tomato.growing_conditions.as_ref().unwrap();
        assert_eq!(growing.temperature_range, Some(Range { min: 18.0, max: 29.0 }));

        let harvest = tomato.harvest_info.as_ref().unwrap();
        assert_eq!(harvest.days_to_maturity, Some(60));
        assert_eq!(harvest.yield_duration, None);

        assert!(tomato.benefits.contains("pest-deterrence"));
    }

    #[test]
    fn test_missing_name_skipped() {
        let doc = json!({
            "basil": {"name": "Basil"},
            "mystery": {"companion_plants": ["Basil"]},
            "broken": "not a record"
        });

        let (records, skipped) = parse_document(&doc).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(skipped.len(), 2);
        assert!(skipped.iter().any(|s| s.key == "mystery" && s.reason == "missing name"));
    }

    #[test]
    fn test_malformed_optional_fields_dropped() {
        let doc = json!({
            "basil": {
                "name": "Basil",
                "soil_requirements": {"ph_range": "acidic"},
                "harvest_info": {"days_to_maturity": {"weird": true}},
                "benefits": 42
            }
        });

        let (records, _) = parse_document(&doc).unwrap();
        let basil = &records["basil"];
        // Empty sub-objects are omitted, never defaulted
        assert!(basil.soil_requirements.is_none());
        assert!(basil.harvest_info.is_none());
        assert!(basil.benefits.is_empty());
    }

    #[test]
    fn test_wrapped_and_array_documents() {
        let wrapped = json!({"plants": {"basil": {"name": "Basil"}}});
        let (records, _) = parse_document(&wrapped).unwrap();
        assert!(records.contains_key("basil"));

        let array = json!([
            {"name": "Sweet Basil"},
            {"id": "bean", "name": "Bush Bean"},
            {"id": "bean", "name": "Pole Bean"}
        ]);
        let (records, skipped) = parse_document(&array).unwrap();
        assert!(records.contains_key("sweet_basil"));
        assert_eq!(records["bean"].name, "Bush Bean");
        assert_eq!(skipped.len(), 1);
    }

    #[test]
    fn test_invalid_shape() {
        assert!(matches!(
            parse_document(&json!("plants")),
            Err(KnowledgeBaseError::InvalidShape(_))
        ));
    }

    #[test]
    fn test_parse_range_variants() {
        assert_eq!(parse_range(&json!([7.0, 6.0])), Some(Range { min: 6.0, max: 7.0 }));
        assert_eq!(parse_range(&json!("6.0 to 7.5")), Some(Range { min: 6.0, max: 7.5 }));
        assert_eq!(parse_range(&json!("-5-10")), Some(Range { min: -5.0, max: 10.0 }));
        assert_eq!(parse_range(&json!(6.5)), Some(Range { min: 6.5, max: 6.5 }));
        assert_eq!(parse_range(&json!({"low": "5.5"})), Some(Range { min: 5.5, max: 5.5 }));
        assert_eq!(parse_range(&json!("neutral")), None);
        assert_eq!(parse_range(&json!(true)), None);
    }
}
