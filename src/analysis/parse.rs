//! Parsing of raw model output.
//!
//! Identification answers are plain lines; suggestion answers are a JSON
//! object, usually inside a ```json fence, sometimes with prose around it
//! or a trailing comma that breaks the array.

use serde::Deserialize;

use crate::error::AnalysisError;
use crate::types::{AiSuggestion, ConfirmedCrop};

/// Characters stripped from the start of each identification line
/// (list bullets and numbering).
const LINE_PREFIX_CHARS: &[char] = &[
    '*', '-', '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', '.', ' ',
];

/// One crop per non-blank line, ids `crop_<line index>`.
pub fn parse_identified_crops(raw: &str) -> Result<Vec<ConfirmedCrop>, AnalysisError> {
    let crops: Vec<ConfirmedCrop> = raw
        .trim()
        .lines()
        .enumerate()
        .filter_map(|(i, line)| {
            let clean = line.trim().trim_start_matches(LINE_PREFIX_CHARS).trim();
            if clean.is_empty() {
                None
            } else {
                Some(ConfirmedCrop {
                    name: clean.to_string(),
                    id: Some(format!("crop_{}", i)),
                })
            }
        })
        .collect();

    if crops.is_empty() {
        return Err(AnalysisError::NoCropsIdentified);
    }
    Ok(crops)
}

#[derive(Deserialize)]
struct SuggestionEnvelope {
    recommendations: Vec<AiSuggestion>,
}

/// Extract `{"recommendations": [{plant, reason}]}` from model output.
///
/// Entries with a blank plant name are dropped.
pub fn parse_suggestions(raw: &str) -> Result<Vec<AiSuggestion>, AnalysisError> {
    let block = extract_json_block(raw)
        .ok_or_else(|| AnalysisError::Malformed("no JSON block in response".to_string()))?;

    let suggestions = match serde_json::from_str::<SuggestionEnvelope>(block) {
        Ok(envelope) => envelope.recommendations,
        Err(e) => {
            if !block.contains("\"recommendations\"") {
                return Err(AnalysisError::Malformed(format!("missing 'recommendations': {}", e)));
            }
            // Fall back to object-by-object extraction
            let recovered = parse_objects(block);
            if recovered.is_empty() {
                return Err(AnalysisError::Malformed(e.to_string()));
            }
            tracing::debug!("Recovered {} suggestions from malformed JSON", recovered.len());
            recovered
        }
    };

    Ok(suggestions
        .into_iter()
        .map(|s| AiSuggestion {
            plant: s.plant.trim().to_string(),
            reason: s.reason.trim().to_string(),
        })
        .filter(|s| !s.plant.is_empty())
        .collect())
}

/// Locate the JSON payload: a ```json fence if present, else the
/// outermost `{...}`.
fn extract_json_block(raw: &str) -> Option<&str> {
    if let Some(start) = raw.find("```json") {
        let body = &raw[start + "```json".len()..];
        let end = body.find("```").unwrap_or(body.len());
        let block = body[..end].trim();
        if !block.is_empty() {
            return Some(block);
        }
    }

    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(raw[start..=end].trim())
}

/// Try to parse individual `{plant, reason}` objects from a malformed payload.
fn parse_objects(block: &str) -> Vec<AiSuggestion> {
    // Skip the envelope's own opening brace
    let inner = match block.find('[') {
        Some(i) => &block[i + 1..],
        None => block,
    };

    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut start = None;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in inner.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' => {
                if depth == 0 {
                    continue;
                }
                depth -= 1;
                if depth == 0 {
                    if let Some(s) = start.take() {
                        let object = &inner[s..=i];
                        if let Ok(suggestion) = serde_json::from_str::<AiSuggestion>(object) {
                            out.push(suggestion);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_identified_crops() {
        let raw = "1. Tomato\n* Basil\n\n- Unknown Plant\n  10. Corn  ";
        let crops = parse_identified_crops(raw).unwrap();
        let names: Vec<&str> = crops.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Tomato", "Basil", "Unknown Plant", "Corn"]);
        assert_eq!(crops[0].id.as_deref(), Some("crop_0"));
        // Blank line 2 is skipped but indices follow line positions
        assert_eq!(crops[2].id.as_deref(), Some("crop_3"));
    }

    #[test]
    fn test_parse_identified_crops_empty() {
        assert!(matches!(
            parse_identified_crops("\n  \n* \n"),
            Err(AnalysisError::NoCropsIdentified)
        ));
    }

    #[test]
    fn test_parse_fenced_suggestions() {
        let raw = r#"Here you go:
```json
{
  "recommendations": [
    {"plant": "Clover", "reason": "fixes nitrogen"},
    {"plant": " ", "reason": "blank"}
  ]
}
```
Enjoy!"#;
        let suggestions = parse_suggestions(raw).unwrap();
        assert_eq!(
            suggestions,
            vec![AiSuggestion {
                plant: "Clover".into(),
                reason: "fixes nitrogen".into(),
            }]
        );
    }

    #[test]
    fn test_parse_bare_object() {
        let raw = r#"{"recommendations": [{"plant": "Borage", "reason": "Attracts bees."}]}"#;
        assert_eq!(parse_suggestions(raw).unwrap()[0].plant, "Borage");
    }

    #[test]
    fn test_recover_from_trailing_comma() {
        let raw = r#"{"recommendations": [
            {"plant": "Borage", "reason": "Attracts {bees}."},
            {"plant": "Dill", "reason": "Hosts wasps"},
        ]}"#;
        let suggestions = parse_suggestions(raw).unwrap();
        let plants: Vec<&str> = suggestions.iter().map(|s| s.plant.as_str()).collect();
        assert_eq!(plants, vec!["Borage", "Dill"]);
    }

    #[test]
    fn test_malformed_responses() {
        assert!(matches!(
            parse_suggestions("I cannot help with that."),
            Err(AnalysisError::Malformed(_))
        ));
        assert!(matches!(
            parse_suggestions(r#"{"plants": ["Clover"]}"#),
            Err(AnalysisError::Malformed(_))
        ));
    }
}
