//! Store interfaces consumed by the engine and the service layer.

use crate::StoreResult;
use bom_catalog::{
    BomOption, EngineeringDoc, ModelOptionRow, Requirement, RequirementDef, SavedConfig,
    TruckModel,
};
use bom_core::{ConfigId, DocId, ModelId, OptionId};
use std::collections::{BTreeMap, BTreeSet};

/// Read access to catalog rows.
pub trait OptionCatalog: Send + Sync {
    /// Models ordered by base MSRP.
    fn list_models(&self) -> StoreResult<Vec<TruckModel>>;

    fn get_model(&self, model_id: &ModelId) -> StoreResult<Option<TruckModel>>;

    /// Options whose id is in `ids`, in catalog order. Unknown ids are skipped.
    fn options_by_ids(&self, ids: &[OptionId]) -> StoreResult<Vec<BomOption>>;

    /// Options available to `model_id` in `component_group`, ascending by
    /// cost with ties in catalog order.
    fn options_for_group(
        &self,
        model_id: &ModelId,
        component_group: &str,
    ) -> StoreResult<Vec<BomOption>>;

    /// Availability rows ordered by system, subsystem, component group, cost
    /// (then catalog order). `None` lists every model.
    fn options_for_model(&self, model_id: Option<&ModelId>) -> StoreResult<Vec<ModelOptionRow>>;

    /// Component group to the spec names its options carry.
    fn group_spec_names(&self) -> StoreResult<BTreeMap<String, BTreeSet<String>>>;

    /// Trivial round trip used by health checks.
    fn ping(&self) -> StoreResult<()>;
}

pub trait RequirementStore: Send + Sync {
    /// Requirements linked to any of `option_ids`, ascending by rule id.
    fn requirements_for_options(&self, option_ids: &[OptionId]) -> StoreResult<Vec<Requirement>>;

    fn requirements_for_document(&self, doc_id: &DocId) -> StoreResult<Vec<Requirement>>;

    /// Stores a requirement and returns its assigned rule id.
    fn insert_requirement(&self, requirement: &RequirementDef) -> StoreResult<i64>;
}

pub trait ConfigStore: Send + Sync {
    fn insert_config(&self, config: &SavedConfig) -> StoreResult<()>;

    /// Newest first.
    fn list_configs(&self) -> StoreResult<Vec<SavedConfig>>;

    fn get_config(&self, config_id: &ConfigId) -> StoreResult<Option<SavedConfig>>;

    /// Renames a configuration and replaces its notes. Missing id is `NotFound`.
    fn update_config(
        &self,
        config_id: &ConfigId,
        config_name: &str,
        notes: &str,
        updated_at: &str,
    ) -> StoreResult<()>;

    /// Returns whether a row was removed.
    fn delete_config(&self, config_id: &ConfigId) -> StoreResult<bool>;
}

pub trait DocumentStore: Send + Sync {
    /// Stores the header, its chunks and the requirements extracted from it
    /// in one write. An earlier copy under the same id is replaced together
    /// with its requirements. A failed write leaves the earlier copy intact.
    /// Returns whether an earlier copy was replaced.
    fn save_document(
        &self,
        doc: &EngineeringDoc,
        chunks: &[String],
        requirements: &[RequirementDef],
    ) -> StoreResult<bool>;

    /// Headers with chunk and rule counts filled in, newest first.
    fn list_documents(&self) -> StoreResult<Vec<EngineeringDoc>>;

    fn get_document(&self, doc_id: &DocId) -> StoreResult<Option<EngineeringDoc>>;

    /// Chunk bodies in chunk order.
    fn document_chunks(&self, doc_id: &DocId) -> StoreResult<Vec<String>>;

    /// Removes the header, its chunks and every requirement extracted from it.
    fn delete_document(&self, doc_id: &DocId) -> StoreResult<bool>;
}

/// Everything the service layer needs from one backend.
pub trait Store: OptionCatalog + RequirementStore + ConfigStore + DocumentStore {}

impl<T> Store for T where T: OptionCatalog + RequirementStore + ConfigStore + DocumentStore {}
