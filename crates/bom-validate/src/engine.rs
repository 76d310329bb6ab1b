//! The validation pass over one selection.

use crate::check::check_option;
use crate::fix_plan::find_cheapest_compliant;
use crate::types::{FixPlan, ValidationIssue, ValidationReport};
use crate::ValidateResult;
use bom_catalog::{BomOption, Requirement};
use bom_core::{ModelId, OptionId};
use bom_store::{OptionCatalog, RequirementStore};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info};

/// Borrowing view over a store. Holds no state between calls, so one engine
/// can serve concurrent validations.
pub struct ValidationEngine<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S> ValidationEngine<'a, S>
where
    S: OptionCatalog + RequirementStore + ?Sized,
{
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Validates `selected` for `model_id`.
    ///
    /// When two selected options share a component group, the one listed
    /// last in `selected` is the group's representative. Ids unknown to the
    /// catalog are skipped.
    pub fn validate(
        &self,
        selected: &[OptionId],
        model_id: &ModelId,
    ) -> ValidateResult<ValidationReport> {
        if selected.is_empty() {
            return Ok(ValidationReport::valid());
        }

        let mut seen = HashSet::new();
        let unique: Vec<OptionId> = selected
            .iter()
            .filter(|id| seen.insert(*id))
            .cloned()
            .collect();

        let options = self.store.options_by_ids(&unique)?;
        let mut requirements = self.store.requirements_for_options(&unique)?;
        requirements.sort_by_key(|r| r.rule_id);

        let by_id: HashMap<&OptionId, &BomOption> =
            options.iter().map(|o| (&o.option_id, o)).collect();

        let mut representatives: HashMap<&str, &BomOption> = HashMap::new();
        for id in selected {
            if let Some(option) = by_id.get(id) {
                representatives.insert(option.component_group.as_str(), option);
            }
        }

        let mut by_group: BTreeMap<&str, Vec<&Requirement>> = BTreeMap::new();
        for requirement in &requirements {
            by_group
                .entry(requirement.component_group.as_str())
                .or_default()
                .push(requirement);
        }

        let mut issues = Vec::new();
        let mut plan = FixPlan::default();
        let mut explanations = Vec::new();

        for (group, group_requirements) in &by_group {
            let Some(representative) = representatives.get(group) else {
                debug!(group, "no selected option in group, skipping");
                continue;
            };

            let spec_mismatches = check_option(representative, group_requirements);
            if spec_mismatches.is_empty() {
                continue;
            }

            let first = group_requirements[0];
            let linked_name = first
                .linked_option_id
                .as_ref()
                .map(|id| {
                    by_id
                        .get(id)
                        .map(|o| o.option_name.clone())
                        .unwrap_or_else(|| id.to_string())
                })
                .unwrap_or_else(|| first.doc_title.clone());
            let reasons: Vec<&str> = spec_mismatches.iter().map(|m| m.reason.as_str()).collect();

            issues.push(ValidationIssue {
                option_name: representative.option_name.clone(),
                option_id: representative.option_id.clone(),
                component_group: group.to_string(),
                source_doc: first.doc_title.clone(),
                message: format!("Per {linked_name} spec: {}", reasons.join("; ")),
                spec_mismatches,
            });

            match find_cheapest_compliant(self.store, model_id, group, group_requirements)? {
                Some(replacement) => {
                    explanations.push(format!(
                        "Replace {} with {} (${:.0})",
                        representative.option_name, replacement.option_name, replacement.cost_usd
                    ));
                    plan.remove.push(representative.option_id.clone());
                    plan.add.push(replacement.option_id);
                }
                None => {
                    info!(group, model = %model_id, "no compliant option available");
                }
            }
        }

        let fix_plan = if plan.is_empty() {
            None
        } else {
            plan.explanation = format!(
                "Per engineering specifications:\n- {}",
                explanations.join("\n- ")
            );
            Some(plan)
        };

        info!(
            model = %model_id,
            selected = selected.len(),
            issues = issues.len(),
            fixes = fix_plan.as_ref().map_or(0, FixPlan::len),
            "validation finished"
        );

        Ok(ValidationReport {
            is_valid: issues.is_empty(),
            issues,
            fix_plan,
        })
    }
}

/// Convenience wrapper for a single call.
pub fn validate<S>(
    store: &S,
    selected: &[OptionId],
    model_id: &ModelId,
) -> ValidateResult<ValidationReport>
where
    S: OptionCatalog + RequirementStore + ?Sized,
{
    ValidationEngine::new(store).validate(selected, model_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bom_catalog::{
        Catalog, ModelOption, ModelOptionRow, PerformanceCategory, RequirementDef, TruckModel,
    };
    use bom_core::DocId;
    use bom_store::{MemoryStore, StoreResult};
    use std::collections::BTreeSet;

    fn option(id: &str, group: &str, cost: f64, specs: &[(&str, f64)]) -> BomOption {
        BomOption {
            option_id: OptionId::from(id),
            option_name: format!("{group} {id}"),
            system: "Powertrain".to_string(),
            subsystem: "Engine".to_string(),
            component_group: group.to_string(),
            description: String::new(),
            cost_usd: cost,
            weight_lb: 10.0,
            performance_category: PerformanceCategory::Power,
            performance_score: 5.0,
            specs: specs.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }
    }

    fn store(options: Vec<BomOption>, requirements: Vec<RequirementDef>) -> MemoryStore {
        let model_options = options
            .iter()
            .map(|o| ModelOption {
                model_id: ModelId::from("M1"),
                option_id: o.option_id.clone(),
                is_default: false,
            })
            .collect();
        MemoryStore::new(Catalog {
            version: 1,
            models: vec![TruckModel {
                model_id: ModelId::from("M1"),
                model_name: "Hauler".to_string(),
                description: String::new(),
                base_msrp: 1.0,
                base_weight_lb: 1.0,
                max_payload_lb: 0.0,
                max_towing_lb: 0.0,
                sleeper_available: false,
                model_tier: String::new(),
            }],
            options,
            model_options,
            requirements,
        })
        .unwrap()
    }

    fn min_rule(linked: &str, group: &str, spec: &str, min: f64) -> RequirementDef {
        RequirementDef {
            doc_id: DocId::from("DOC-1"),
            doc_title: "Integration Spec".to_string(),
            linked_option_id: Some(OptionId::from(linked)),
            component_group: group.to_string(),
            spec_name: spec.to_string(),
            min_value: Some(min),
            max_value: None,
            unit: String::new(),
            raw_requirement: String::new(),
        }
    }

    #[test]
    fn last_listed_option_represents_its_group() {
        let store = store(
            vec![
                option("E", "Engine", 0.0, &[]),
                option("T1", "Turbocharger", 0.0, &[("boost_psi", 40.0)]),
                option("T2", "Turbocharger", 900.0, &[("boost_psi", 50.0)]),
            ],
            vec![min_rule("E", "Turbocharger", "boost_psi", 45.0)],
        );
        let ids = |v: &[&str]| v.iter().map(|s| OptionId::from(*s)).collect::<Vec<_>>();

        let passing = validate(&store, &ids(&["E", "T1", "T2"]), &ModelId::from("M1")).unwrap();
        assert!(passing.is_valid);

        let failing = validate(&store, &ids(&["E", "T2", "T1"]), &ModelId::from("M1")).unwrap();
        assert!(!failing.is_valid);
        assert_eq!(failing.issues[0].option_id, OptionId::from("T1"));
    }

    #[test]
    fn unknown_and_duplicate_ids_are_tolerated() {
        let store = store(
            vec![
                option("E", "Engine", 0.0, &[]),
                option("T1", "Turbocharger", 0.0, &[("boost_psi", 40.0)]),
            ],
            vec![min_rule("E", "Turbocharger", "boost_psi", 45.0)],
        );
        let selected = vec![
            OptionId::from("E"),
            OptionId::from("GHOST"),
            OptionId::from("T1"),
            OptionId::from("T1"),
        ];
        let report = validate(&store, &selected, &ModelId::from("M1")).unwrap();
        assert_eq!(report.issues.len(), 1);
        assert!(report.fix_plan.is_none());
    }

    /// Store whose every call fails, standing in for a lost connection.
    struct DownStore;

    impl OptionCatalog for DownStore {
        fn list_models(&self) -> StoreResult<Vec<TruckModel>> {
            Err(bom_store::StoreError::Unavailable("down".into()))
        }
        fn get_model(&self, _: &ModelId) -> StoreResult<Option<TruckModel>> {
            Err(bom_store::StoreError::Unavailable("down".into()))
        }
        fn options_by_ids(&self, _: &[OptionId]) -> StoreResult<Vec<BomOption>> {
            Err(bom_store::StoreError::Unavailable("down".into()))
        }
        fn options_for_group(&self, _: &ModelId, _: &str) -> StoreResult<Vec<BomOption>> {
            Err(bom_store::StoreError::Unavailable("down".into()))
        }
        fn options_for_model(&self, _: Option<&ModelId>) -> StoreResult<Vec<ModelOptionRow>> {
            Err(bom_store::StoreError::Unavailable("down".into()))
        }
        fn group_spec_names(&self) -> StoreResult<BTreeMap<String, BTreeSet<String>>> {
            Err(bom_store::StoreError::Unavailable("down".into()))
        }
        fn ping(&self) -> StoreResult<()> {
            Err(bom_store::StoreError::Unavailable("down".into()))
        }
    }

    impl RequirementStore for DownStore {
        fn requirements_for_options(&self, _: &[OptionId]) -> StoreResult<Vec<Requirement>> {
            Err(bom_store::StoreError::Unavailable("down".into()))
        }
        fn requirements_for_document(&self, _: &DocId) -> StoreResult<Vec<Requirement>> {
            Err(bom_store::StoreError::Unavailable("down".into()))
        }
        fn insert_requirement(&self, _: &RequirementDef) -> StoreResult<i64> {
            Err(bom_store::StoreError::Unavailable("down".into()))
        }
    }

    #[test]
    fn store_failure_is_data_unavailable() {
        let err = validate(&DownStore, &[OptionId::from("X")], &ModelId::from("M1")).unwrap_err();
        assert!(matches!(err, crate::ValidateError::DataUnavailable(_)));
    }

    #[test]
    fn empty_selection_never_touches_store() {
        let report = validate(&DownStore, &[], &ModelId::from("M1")).unwrap();
        assert_eq!(report, ValidationReport::valid());
    }
}
