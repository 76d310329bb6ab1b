//! In-memory store over a loaded [`Catalog`].
//!
//! Same ordering contracts as the SQLite backend; used by service and route
//! tests.

use crate::traits::{ConfigStore, DocumentStore, OptionCatalog, RequirementStore};
use crate::{StoreError, StoreResult};
use bom_catalog::{
    BomOption, Catalog, EngineeringDoc, IntegrityError, ModelOptionRow, Requirement,
    RequirementDef, SavedConfig, TruckModel, check_catalog,
};
use bom_core::{ConfigId, DocId, ModelId, OptionId};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct State {
    requirements: Vec<Requirement>,
    next_rule_id: i64,
    configs: Vec<SavedConfig>,
    documents: Vec<(EngineeringDoc, Vec<String>)>,
}

pub struct MemoryStore {
    catalog: Catalog,
    state: Mutex<State>,
}

impl MemoryStore {
    /// Builds a store from a catalog, assigning rule ids to its requirements
    /// in file order starting at 1.
    pub fn new(catalog: Catalog) -> StoreResult<Self> {
        check_catalog(&catalog)?;
        let mut state = State {
            next_rule_id: 1,
            ..State::default()
        };
        for def in &catalog.requirements {
            let rule_id = state.next_rule_id;
            state.next_rule_id += 1;
            state.requirements.push(def.clone().with_rule_id(rule_id));
        }
        Ok(Self {
            catalog,
            state: Mutex::new(state),
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    fn state(&self) -> StoreResult<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store mutex poisoned".to_string()))
    }

    fn option_seq(&self, option_id: &OptionId) -> usize {
        self.catalog
            .options
            .iter()
            .position(|o| &o.option_id == option_id)
            .unwrap_or(usize::MAX)
    }

    fn option(&self, option_id: &OptionId) -> Option<&BomOption> {
        self.catalog.options.iter().find(|o| &o.option_id == option_id)
    }
}

fn cmp_cost(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

impl OptionCatalog for MemoryStore {
    fn list_models(&self) -> StoreResult<Vec<TruckModel>> {
        let mut models = self.catalog.models.clone();
        models.sort_by(|a, b| cmp_cost(a.base_msrp, b.base_msrp));
        Ok(models)
    }

    fn get_model(&self, model_id: &ModelId) -> StoreResult<Option<TruckModel>> {
        Ok(self
            .catalog
            .models
            .iter()
            .find(|m| &m.model_id == model_id)
            .cloned())
    }

    fn options_by_ids(&self, ids: &[OptionId]) -> StoreResult<Vec<BomOption>> {
        let wanted: HashSet<&OptionId> = ids.iter().collect();
        Ok(self
            .catalog
            .options
            .iter()
            .filter(|o| wanted.contains(&o.option_id))
            .cloned()
            .collect())
    }

    fn options_for_group(
        &self,
        model_id: &ModelId,
        component_group: &str,
    ) -> StoreResult<Vec<BomOption>> {
        let mut candidates: Vec<(usize, &BomOption)> = self
            .catalog
            .model_options
            .iter()
            .filter(|link| &link.model_id == model_id)
            .filter_map(|link| self.option(&link.option_id))
            .filter(|o| o.component_group == component_group)
            .map(|o| (self.option_seq(&o.option_id), o))
            .collect();
        candidates.sort_by(|(seq_a, a), (seq_b, b)| {
            cmp_cost(a.cost_usd, b.cost_usd).then(seq_a.cmp(seq_b))
        });
        Ok(candidates.into_iter().map(|(_, o)| o.clone()).collect())
    }

    fn options_for_model(&self, model_id: Option<&ModelId>) -> StoreResult<Vec<ModelOptionRow>> {
        let mut rows: Vec<(usize, ModelOptionRow)> = self
            .catalog
            .model_options
            .iter()
            .filter(|link| model_id.is_none_or(|m| &link.model_id == m))
            .filter_map(|link| {
                self.option(&link.option_id).map(|option| {
                    (
                        self.option_seq(&link.option_id),
                        ModelOptionRow {
                            option: option.clone(),
                            model_id: link.model_id.clone(),
                            is_default: link.is_default,
                        },
                    )
                })
            })
            .collect();
        rows.sort_by(|(seq_a, a), (seq_b, b)| {
            a.option
                .system
                .cmp(&b.option.system)
                .then_with(|| a.option.subsystem.cmp(&b.option.subsystem))
                .then_with(|| a.option.component_group.cmp(&b.option.component_group))
                .then_with(|| cmp_cost(a.option.cost_usd, b.option.cost_usd))
                .then_with(|| seq_a.cmp(seq_b))
                .then_with(|| a.model_id.cmp(&b.model_id))
        });
        Ok(rows.into_iter().map(|(_, row)| row).collect())
    }

    fn group_spec_names(&self) -> StoreResult<BTreeMap<String, BTreeSet<String>>> {
        let mut groups: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for option in &self.catalog.options {
            groups
                .entry(option.component_group.clone())
                .or_default()
                .extend(option.specs.keys().cloned());
        }
        Ok(groups)
    }

    fn ping(&self) -> StoreResult<()> {
        self.state().map(|_| ())
    }
}

impl RequirementStore for MemoryStore {
    fn requirements_for_options(&self, option_ids: &[OptionId]) -> StoreResult<Vec<Requirement>> {
        let wanted: HashSet<&OptionId> = option_ids.iter().collect();
        let state = self.state()?;
        Ok(state
            .requirements
            .iter()
            .filter(|r| {
                r.linked_option_id
                    .as_ref()
                    .is_some_and(|id| wanted.contains(id))
            })
            .cloned()
            .collect())
    }

    fn requirements_for_document(&self, doc_id: &DocId) -> StoreResult<Vec<Requirement>> {
        let state = self.state()?;
        Ok(state
            .requirements
            .iter()
            .filter(|r| &r.doc_id == doc_id)
            .cloned()
            .collect())
    }

    fn insert_requirement(&self, requirement: &RequirementDef) -> StoreResult<i64> {
        let mut state = self.state()?;
        let rule_id = state.next_rule_id;
        state.next_rule_id += 1;
        state
            .requirements
            .push(requirement.clone().with_rule_id(rule_id));
        Ok(rule_id)
    }
}

impl ConfigStore for MemoryStore {
    fn insert_config(&self, config: &SavedConfig) -> StoreResult<()> {
        let mut state = self.state()?;
        if state.configs.iter().any(|c| c.config_id == config.config_id) {
            return Err(StoreError::Unavailable(format!(
                "configuration '{}' already exists",
                config.config_id
            )));
        }
        state.configs.push(config.clone());
        Ok(())
    }

    fn list_configs(&self) -> StoreResult<Vec<SavedConfig>> {
        let state = self.state()?;
        let mut configs: Vec<SavedConfig> = state.configs.iter().rev().cloned().collect();
        // Stable sort keeps later inserts first among equal timestamps.
        configs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(configs)
    }

    fn get_config(&self, config_id: &ConfigId) -> StoreResult<Option<SavedConfig>> {
        let state = self.state()?;
        Ok(state
            .configs
            .iter()
            .find(|c| &c.config_id == config_id)
            .cloned())
    }

    fn update_config(
        &self,
        config_id: &ConfigId,
        config_name: &str,
        notes: &str,
        updated_at: &str,
    ) -> StoreResult<()> {
        let mut state = self.state()?;
        let config = state
            .configs
            .iter_mut()
            .find(|c| &c.config_id == config_id)
            .ok_or_else(|| StoreError::not_found("Configuration", config_id.as_str()))?;
        config.config_name = config_name.to_string();
        config.notes = notes.to_string();
        config.updated_at = Some(updated_at.to_string());
        Ok(())
    }

    fn delete_config(&self, config_id: &ConfigId) -> StoreResult<bool> {
        let mut state = self.state()?;
        let before = state.configs.len();
        state.configs.retain(|c| &c.config_id != config_id);
        Ok(state.configs.len() < before)
    }
}

impl DocumentStore for MemoryStore {
    fn save_document(
        &self,
        doc: &EngineeringDoc,
        chunks: &[String],
        requirements: &[RequirementDef],
    ) -> StoreResult<bool> {
        // Reject before touching state so a failed save changes nothing.
        if let Some(bad) = requirements
            .iter()
            .find(|r| r.min_value.is_none() && r.max_value.is_none())
        {
            return Err(IntegrityError::InvalidValue {
                field: format!("requirement {}.{}", bad.component_group, bad.spec_name),
                value: "none".to_string(),
                reason: "needs a minimum or a maximum bound".to_string(),
            }
            .into());
        }

        let mut state = self.state()?;
        state.requirements.retain(|r| r.doc_id != doc.doc_id);
        let before = state.documents.len();
        state.documents.retain(|(d, _)| d.doc_id != doc.doc_id);
        let replaced = state.documents.len() < before;
        state.documents.push((doc.clone(), chunks.to_vec()));
        for requirement in requirements {
            let rule_id = state.next_rule_id;
            state.next_rule_id += 1;
            state
                .requirements
                .push(requirement.clone().with_rule_id(rule_id));
        }
        Ok(replaced)
    }

    fn list_documents(&self) -> StoreResult<Vec<EngineeringDoc>> {
        let state = self.state()?;
        let mut docs: Vec<EngineeringDoc> = state
            .documents
            .iter()
            .rev()
            .map(|(doc, chunks)| with_counts(doc, chunks, &state.requirements))
            .collect();
        docs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(docs)
    }

    fn get_document(&self, doc_id: &DocId) -> StoreResult<Option<EngineeringDoc>> {
        let state = self.state()?;
        Ok(state
            .documents
            .iter()
            .find(|(doc, _)| &doc.doc_id == doc_id)
            .map(|(doc, chunks)| with_counts(doc, chunks, &state.requirements)))
    }

    fn document_chunks(&self, doc_id: &DocId) -> StoreResult<Vec<String>> {
        let state = self.state()?;
        Ok(state
            .documents
            .iter()
            .find(|(doc, _)| &doc.doc_id == doc_id)
            .map(|(_, chunks)| chunks.clone())
            .unwrap_or_default())
    }

    fn delete_document(&self, doc_id: &DocId) -> StoreResult<bool> {
        let mut state = self.state()?;
        state.requirements.retain(|r| &r.doc_id != doc_id);
        let before = state.documents.len();
        state.documents.retain(|(doc, _)| &doc.doc_id != doc_id);
        Ok(state.documents.len() < before)
    }
}

fn with_counts(
    doc: &EngineeringDoc,
    chunks: &[String],
    requirements: &[Requirement],
) -> EngineeringDoc {
    EngineeringDoc {
        chunk_count: chunks.len(),
        rule_count: requirements.iter().filter(|r| r.doc_id == doc.doc_id).count(),
        ..doc.clone()
    }
}
