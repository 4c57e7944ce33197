//! Prompt construction for the analysis model.

use std::fmt::Write;

use crate::types::{HistoricalSeason, RecommendationContext};

pub fn identification_prompt(notes: &str) -> String {
    let notes = notes.trim();
    format!(
        "You are an expert in agricultural science. Analyze the image and notes to identify \
         plants. List them one per line. Do not add other text. If unsure, use 'Unknown Plant'.\n\
         User's notes: {}",
        if notes.is_empty() { "None" } else { notes }
    )
}

pub fn suggestion_prompt(crops: &[String], context: &RecommendationContext) -> String {
    let mut out = String::new();
    out.push_str(
        "You are an expert in agricultural biodiversity, polyculture, and sustainable farming.\n\
         Based on the following information, recommend a list of compatible companion plants.\n\n",
    );

    out.push_str("**Current Confirmed Crops:**\n");
    let _ = writeln!(out, "- {}\n", crops.join(", "));

    let site = site_lines(context);
    if !site.is_empty() {
        out.push_str("**Site Conditions:**\n");
        for line in site {
            let _ = writeln!(out, "- {}", line);
        }
        out.push('\n');
    }

    out.push_str("**Historical Data for this Farmland Area:**\n");
    out.push_str(&history_block(&context.history));
    out.push_str("\n\n");

    out.push_str(
        "**Task:**\n\
         Provide a list of 3-5 recommended companion plants. For each plant, provide a brief, \
         practical explanation (2-3 sentences) of why it's a good companion, focusing on benefits \
         like pest deterrence, soil health, structural support, or attracting beneficial insects. \
         Do not recommend any of the confirmed crops.\n\
         Format the response as a JSON object with a single key 'recommendations', which is a \
         list of objects. Each object should have two keys: 'plant' (the name of the plant) and \
         'reason' (the explanation).\n\
         Example format:\n\
         ```json\n\
         {\n  \"recommendations\": [\n    {\n      \"plant\": \"Example Plant\",\n      \
         \"reason\": \"This is an example reason.\"\n    }\n  ]\n}\n\
         ```",
    );

    out
}

fn site_lines(context: &RecommendationContext) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(soil) = &context.soil_type {
        lines.push(format!("Soil type: {}", soil));
    }
    if let Some(ph) = context.soil_ph {
        lines.push(format!("Soil pH: {:.1}", ph));
    }
    if let Some(location) = &context.location {
        lines.push(format!("Location: {}", location));
    }
    if let Some(gps) = &context.coordinates {
        lines.push(format!("Coordinates: {:.4}, {:.4}", gps.latitude, gps.longitude));
    }
    lines
}

fn history_block(history: &[HistoricalSeason]) -> String {
    if history.is_empty() {
        return "No historical data available.".to_string();
    }
    serde_json::to_string_pretty(history)
        .unwrap_or_else(|_| "No historical data available.".to_string())
}
