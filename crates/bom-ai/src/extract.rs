//! Requirement extraction from engineering document text.

use bom_catalog::RequirementDef;
use bom_core::{DocId, OptionId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// One bound as returned by the text-generation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedRequirement {
    #[serde(default)]
    pub component_group: String,
    #[serde(default)]
    pub spec_name: String,
    #[serde(default)]
    pub min_value: Option<f64>,
    #[serde(default)]
    pub max_value: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub raw_requirement: Option<String>,
}

impl ExtractedRequirement {
    fn is_usable(&self) -> bool {
        !self.component_group.trim().is_empty()
            && !self.spec_name.trim().is_empty()
            && (self.min_value.is_some() || self.max_value.is_some())
    }

    pub fn into_def(
        self,
        doc_id: &DocId,
        doc_title: &str,
        linked_option_id: Option<&OptionId>,
    ) -> RequirementDef {
        RequirementDef {
            doc_id: doc_id.clone(),
            doc_title: doc_title.to_string(),
            linked_option_id: linked_option_id.cloned(),
            component_group: self.component_group.trim().to_string(),
            spec_name: self.spec_name.trim().to_string(),
            min_value: self.min_value,
            max_value: self.max_value,
            unit: self.unit.unwrap_or_default(),
            raw_requirement: self.raw_requirement.unwrap_or_default(),
        }
    }
}

/// Splits `text` into windows of `size` characters, each starting
/// `size - overlap` characters after the previous one. Text that fits in one
/// window is returned whole; empty text yields no chunks.
pub fn chunk_text(text: &str, size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return Vec::new();
    }
    let size = size.max(1);
    if chars.len() <= size {
        return vec![text.to_string()];
    }
    let step = size.saturating_sub(overlap).max(1);

    let mut chunks = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + size).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += step;
    }
    chunks
}

/// The first `max_chunks` chunks joined by blank lines, cut to `max_chars`
/// characters.
pub fn extraction_text(chunks: &[String], max_chunks: usize, max_chars: usize) -> String {
    let joined = chunks
        .iter()
        .take(max_chunks)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n\n");
    joined.chars().take(max_chars).collect()
}

pub fn build_extraction_prompt(
    title: &str,
    text: &str,
    groups: &BTreeMap<String, BTreeSet<String>>,
) -> String {
    let group_lines = groups
        .iter()
        .map(|(group, specs)| {
            let specs: Vec<&str> = specs.iter().map(String::as_str).collect();
            format!("- {group}: {}", specs.join(", "))
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Extract component requirements from this engineering specification.

DOCUMENT: {title}

CONTENT:
{text}

Extract numeric requirements for supporting components. Valid component groups and their spec names:
{group_lines}

For each requirement, return JSON with the EXACT componentGroup name from above.

Return JSON array:
[
  {{"componentGroup": "Turbocharger", "specName": "boost_psi", "minValue": 45, "maxValue": null, "unit": "PSI", "rawRequirement": "Turbocharger must provide at least 45 PSI boost"}},
  {{"componentGroup": "Radiator", "specName": "cooling_capacity_btu", "minValue": 1400, "maxValue": null, "unit": "BTU/hr", "rawRequirement": "Radiator capacity of 1400 BTU/hr or more"}}
]

Return [] if no numeric requirements found. Return ONLY the JSON array."#
    )
}

/// Parses the service's answer. Code fences are ignored and the outermost
/// `[...]` is read; entries missing a group, a spec name or both bounds are
/// dropped. Anything unreadable yields an empty list.
pub fn parse_requirements(response: &str) -> Vec<ExtractedRequirement> {
    let cleaned = response.replace("```json", "").replace("```", "");
    let (Some(start), Some(end)) = (cleaned.find('['), cleaned.rfind(']')) else {
        warn!("extraction response holds no JSON array");
        return Vec::new();
    };
    if end < start {
        warn!("extraction response holds no JSON array");
        return Vec::new();
    }

    let entries: Vec<serde_json::Value> = match serde_json::from_str(&cleaned[start..=end]) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(error = %err, "extraction response is not a JSON array");
            return Vec::new();
        }
    };

    entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value::<ExtractedRequirement>(entry).ok())
        .filter(ExtractedRequirement::is_usable)
        .collect()
}
