//! Request and report types (JSON camelCase on the wire).

use bom_core::{ModelId, OptionId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequest {
    #[serde(default)]
    pub selected_option_ids: Vec<OptionId>,
    pub model_id: ModelId,
}

/// Which bound a spec value broke.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    BelowMin,
    AboveMax,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SpecMismatch {
    pub spec_name: String,
    pub current_value: f64,
    pub required_value: f64,
    pub unit: String,
    pub direction: Direction,
    /// Human-readable form, e.g. `has 40 PSI but needs 45 PSI`.
    pub reason: String,
}

/// One violated component group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    pub option_name: String,
    pub option_id: OptionId,
    pub component_group: String,
    pub source_doc: String,
    pub message: String,
    pub spec_mismatches: Vec<SpecMismatch>,
}

/// Parallel remove/add lists, one pair per violated group with a remedy.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FixPlan {
    pub remove: Vec<OptionId>,
    pub add: Vec<OptionId>,
    #[serde(default)]
    pub explanation: String,
}

impl FixPlan {
    pub fn is_empty(&self) -> bool {
        self.remove.is_empty()
    }

    pub fn len(&self) -> usize {
        self.remove.len()
    }

    /// Applies the plan to a selection: removed ids are dropped and added ids
    /// appended in plan order.
    pub fn apply(&self, selection: &[OptionId]) -> Vec<OptionId> {
        let mut next: Vec<OptionId> = selection
            .iter()
            .filter(|id| !self.remove.contains(id))
            .cloned()
            .collect();
        for id in &self.add {
            if !next.contains(id) {
                next.push(id.clone());
            }
        }
        next
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub issues: Vec<ValidationIssue>,
    pub fix_plan: Option<FixPlan>,
}

impl ValidationReport {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            issues: Vec::new(),
            fix_plan: None,
        }
    }
}
