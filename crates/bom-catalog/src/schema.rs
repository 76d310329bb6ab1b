//! Catalog schema definitions.

use bom_core::{DocId, ModelId, OptionId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Spec name to numeric value. Keys are unique; lookups of absent keys
/// compare as `0.0` (see [`BomOption::spec_value`]).
pub type SpecMap = BTreeMap<String, f64>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    pub version: u32,
    #[serde(default)]
    pub models: Vec<TruckModel>,
    #[serde(default)]
    pub options: Vec<BomOption>,
    #[serde(default)]
    pub model_options: Vec<ModelOption>,
    #[serde(default)]
    pub requirements: Vec<RequirementDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TruckModel {
    pub model_id: ModelId,
    pub model_name: String,
    #[serde(default)]
    pub description: String,
    pub base_msrp: f64,
    pub base_weight_lb: f64,
    #[serde(default)]
    pub max_payload_lb: f64,
    #[serde(default)]
    pub max_towing_lb: f64,
    #[serde(default)]
    pub sleeper_available: bool,
    #[serde(default)]
    pub model_tier: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PerformanceCategory {
    Safety,
    Comfort,
    Power,
    Economy,
    Durability,
    Hauling,
    #[serde(other)]
    Standard,
}

impl PerformanceCategory {
    pub const RANKED: [PerformanceCategory; 6] = [
        PerformanceCategory::Safety,
        PerformanceCategory::Comfort,
        PerformanceCategory::Power,
        PerformanceCategory::Economy,
        PerformanceCategory::Durability,
        PerformanceCategory::Hauling,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PerformanceCategory::Safety => "Safety",
            PerformanceCategory::Comfort => "Comfort",
            PerformanceCategory::Power => "Power",
            PerformanceCategory::Economy => "Economy",
            PerformanceCategory::Durability => "Durability",
            PerformanceCategory::Hauling => "Hauling",
            PerformanceCategory::Standard => "Standard",
        }
    }

    /// Case-insensitive parse that maps anything unknown to `Standard`.
    pub fn parse_lenient(raw: &str) -> Self {
        raw.parse().unwrap_or(PerformanceCategory::Standard)
    }
}

impl fmt::Display for PerformanceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PerformanceCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        for category in Self::RANKED {
            if category.as_str().eq_ignore_ascii_case(trimmed) {
                return Ok(category);
            }
        }
        if trimmed.eq_ignore_ascii_case("standard") {
            return Ok(PerformanceCategory::Standard);
        }
        Err(format!("unknown performance category '{trimmed}'"))
    }
}

/// One selectable BOM option. Immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BomOption {
    pub option_id: OptionId,
    pub option_name: String,
    pub system: String,
    pub subsystem: String,
    pub component_group: String,
    #[serde(default)]
    pub description: String,
    pub cost_usd: f64,
    pub weight_lb: f64,
    pub performance_category: PerformanceCategory,
    #[serde(default)]
    pub performance_score: f64,
    #[serde(default)]
    pub specs: SpecMap,
}

impl BomOption {
    /// Spec value used for requirement comparison. Absent keys read as 0.
    pub fn spec_value(&self, spec_name: &str) -> f64 {
        self.specs.get(spec_name).copied().unwrap_or(0.0)
    }
}

/// Availability of an option on a model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModelOption {
    pub model_id: ModelId,
    pub option_id: OptionId,
    #[serde(default)]
    pub is_default: bool,
}

/// An option joined with its availability flags for one model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModelOptionRow {
    #[serde(flatten)]
    pub option: BomOption,
    pub model_id: ModelId,
    pub is_default: bool,
}

/// A numeric bound on one spec of one component group, extracted from an
/// engineering document and linked to the option the document was attached to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Requirement {
    pub rule_id: i64,
    pub doc_id: DocId,
    pub doc_title: String,
    pub linked_option_id: Option<OptionId>,
    pub component_group: String,
    pub spec_name: String,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub raw_requirement: String,
}

/// Requirement as written in a seed file or produced by extraction, before
/// the store assigns a rule id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RequirementDef {
    pub doc_id: DocId,
    pub doc_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_option_id: Option<OptionId>,
    pub component_group: String,
    pub spec_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub raw_requirement: String,
}

impl RequirementDef {
    pub fn with_rule_id(self, rule_id: i64) -> Requirement {
        Requirement {
            rule_id,
            doc_id: self.doc_id,
            doc_title: self.doc_title,
            linked_option_id: self.linked_option_id,
            component_group: self.component_group,
            spec_name: self.spec_name,
            min_value: self.min_value,
            max_value: self.max_value,
            unit: self.unit,
            raw_requirement: self.raw_requirement,
        }
    }
}

/// A user's saved configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SavedConfig {
    pub config_id: bom_core::ConfigId,
    pub config_name: String,
    pub model_id: ModelId,
    pub config_options: Vec<OptionId>,
    pub total_cost_usd: f64,
    pub total_weight_lb: f64,
    #[serde(default)]
    pub performance_summary: serde_json::Value,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub is_validated: bool,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Engineering document header; body text lives in chunks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EngineeringDoc {
    pub doc_id: DocId,
    pub doc_title: String,
    #[serde(default)]
    pub linked_option_ids: Vec<OptionId>,
    pub created_at: String,
    #[serde(default)]
    pub chunk_count: usize,
    #[serde(default)]
    pub rule_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turbo(specs: &[(&str, f64)]) -> BomOption {
        BomOption {
            option_id: OptionId::from("T1"),
            option_name: "Std Turbo".to_string(),
            system: "Powertrain".to_string(),
            subsystem: "Engine".to_string(),
            component_group: "Turbocharger".to_string(),
            description: String::new(),
            cost_usd: 0.0,
            weight_lb: 85.0,
            performance_category: PerformanceCategory::Power,
            performance_score: 5.0,
            specs: specs.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }
    }

    #[test]
    fn absent_spec_reads_as_zero() {
        let opt = turbo(&[("boost_psi", 40.0)]);
        assert_eq!(opt.spec_value("boost_psi"), 40.0);
        assert_eq!(opt.spec_value("max_hp_supported"), 0.0);
    }

    #[test]
    fn category_parse_is_case_insensitive() {
        assert_eq!("safety".parse::<PerformanceCategory>(), Ok(PerformanceCategory::Safety));
        assert_eq!(
            PerformanceCategory::parse_lenient("Luxury"),
            PerformanceCategory::Standard
        );
    }

    #[test]
    fn unknown_category_deserializes_as_standard() {
        let cat: PerformanceCategory = serde_json::from_str("\"Luxury\"").unwrap();
        assert_eq!(cat, PerformanceCategory::Standard);
    }

    #[test]
    fn option_uses_camel_case_wire_names() {
        let json = serde_json::to_value(turbo(&[])).unwrap();
        assert!(json.get("optionId").is_some());
        assert!(json.get("componentGroup").is_some());
        assert!(json.get("costUsd").is_some());
    }
}
