//! Natural-language optimization requests to a typed intent.

use crate::client::TextGenerator;
use bom_catalog::PerformanceCategory;
use bom_report::{Objective, OptimizationIntent};
use serde_json::Value;
use tracing::{debug, warn};

fn intent_prompt(request: &str) -> String {
    let categories: Vec<&str> = PerformanceCategory::RANKED
        .iter()
        .map(|c| c.as_str())
        .collect();
    format!(
        r#"Classify this truck configuration request.

REQUEST: {request}

Performance categories: {}

Return ONLY a JSON object of the form
{{"maximize": ["Safety"], "minimize": "cost"}}
where "maximize" lists the categories the user wants to improve
and "minimize" is "cost", "weight" or null."#,
        categories.join(", ")
    )
}

/// Asks `generator` to classify `request`; falls back to keyword matching
/// when the service fails or answers with something unreadable.
pub fn parse_intent<G: TextGenerator + ?Sized>(generator: &G, request: &str) -> OptimizationIntent {
    let response = match generator.complete(&intent_prompt(request)) {
        Ok(response) => response,
        Err(err) => {
            warn!(error = %err, "intent classification failed; using keywords");
            return keyword_intent(request);
        }
    };
    match intent_from_response(&response) {
        Some(intent) => {
            debug!(?intent, "classified optimization intent");
            intent
        }
        None => {
            warn!("unreadable intent classification; using keywords");
            keyword_intent(request)
        }
    }
}

fn intent_from_response(response: &str) -> Option<OptimizationIntent> {
    let cleaned = response.replace("```json", "").replace("```", "");
    let start = cleaned.find('{')?;
    let end = cleaned.rfind('}')?;
    if end < start {
        return None;
    }
    let value: Value = serde_json::from_str(&cleaned[start..=end]).ok()?;

    let maximize = match value.get("maximize") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => {
            let mut maximize = Vec::new();
            for category in items
                .iter()
                .filter_map(Value::as_str)
                .filter_map(|s| s.parse::<PerformanceCategory>().ok())
                .filter(|c| *c != PerformanceCategory::Standard)
            {
                if !maximize.contains(&category) {
                    maximize.push(category);
                }
            }
            maximize
        }
        Some(_) => return None,
    };

    let minimize = match value.get("minimize") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "cost" => Some(Objective::Cost),
            "weight" => Some(Objective::Weight),
            "" | "none" | "null" => None,
            _ => return None,
        },
        Some(_) => return None,
    };

    Some(OptimizationIntent { maximize, minimize })
}

/// Keyword reading of a request: category names anywhere in the text;
/// "light"/"weight" minimize weight, "cheap"/"cost"/"budget" minimize cost.
pub fn keyword_intent(request: &str) -> OptimizationIntent {
    let lower = request.to_ascii_lowercase();
    let maximize = PerformanceCategory::RANKED
        .into_iter()
        .filter(|c| lower.contains(&c.as_str().to_ascii_lowercase()))
        .collect();
    let minimize = if lower.contains("light") || lower.contains("weight") {
        Some(Objective::Weight)
    } else if ["cheap", "cost", "budget"].iter().any(|k| lower.contains(k)) {
        Some(Objective::Cost)
    } else {
        None
    };
    OptimizationIntent { maximize, minimize }
}
