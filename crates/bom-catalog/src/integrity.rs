//! Catalog integrity checks run before a seed file is imported.

use crate::schema::{BomOption, Catalog, RequirementDef, TruckModel};
use std::collections::{HashMap, HashSet};

#[derive(thiserror::Error, Debug)]
pub enum IntegrityError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

pub fn check_catalog(catalog: &Catalog) -> Result<(), IntegrityError> {
    if catalog.version > crate::LATEST_VERSION {
        return Err(IntegrityError::UnsupportedVersion {
            version: catalog.version,
        });
    }

    let mut model_ids = HashSet::new();
    for model in &catalog.models {
        if !model_ids.insert(&model.model_id) {
            return Err(IntegrityError::DuplicateId {
                id: model.model_id.to_string(),
                context: "models".to_string(),
            });
        }
        check_model(model)?;
    }

    let mut options_by_id = HashMap::new();
    for option in &catalog.options {
        if options_by_id.insert(&option.option_id, option).is_some() {
            return Err(IntegrityError::DuplicateId {
                id: option.option_id.to_string(),
                context: "options".to_string(),
            });
        }
        check_option(option)?;
    }

    let mut availability = HashSet::new();
    let mut defaults: HashMap<(&str, &str), &str> = HashMap::new();
    for link in &catalog.model_options {
        if !model_ids.contains(&link.model_id) {
            return Err(IntegrityError::MissingReference {
                id: link.model_id.to_string(),
                context: "model_options model_id".to_string(),
            });
        }
        let Some(option) = options_by_id.get(&link.option_id) else {
            return Err(IntegrityError::MissingReference {
                id: link.option_id.to_string(),
                context: "model_options option_id".to_string(),
            });
        };
        if !availability.insert((&link.model_id, &link.option_id)) {
            return Err(IntegrityError::DuplicateId {
                id: format!("{}/{}", link.model_id, link.option_id),
                context: "model_options".to_string(),
            });
        }
        if link.is_default {
            let key = (link.model_id.as_str(), option.component_group.as_str());
            if let Some(existing) = defaults.insert(key, link.option_id.as_str()) {
                return Err(IntegrityError::InvalidValue {
                    field: format!(
                        "model '{}' group '{}' default",
                        link.model_id, option.component_group
                    ),
                    value: link.option_id.to_string(),
                    reason: format!("'{existing}' is already the default"),
                });
            }
        }
    }

    for requirement in &catalog.requirements {
        check_requirement(requirement, &options_by_id)?;
    }

    Ok(())
}

fn check_model(model: &TruckModel) -> Result<(), IntegrityError> {
    let context = format!("model '{}'", model.model_id);
    check_non_negative_finite("base_msrp", model.base_msrp, &context)?;
    check_non_negative_finite("base_weight_lb", model.base_weight_lb, &context)?;
    check_non_negative_finite("max_payload_lb", model.max_payload_lb, &context)?;
    check_non_negative_finite("max_towing_lb", model.max_towing_lb, &context)?;
    Ok(())
}

fn check_option(option: &BomOption) -> Result<(), IntegrityError> {
    let context = format!("option '{}'", option.option_id);
    if option.component_group.trim().is_empty() {
        return Err(IntegrityError::InvalidValue {
            field: format!("{context} component_group"),
            value: option.component_group.clone(),
            reason: "must not be empty".to_string(),
        });
    }
    check_non_negative_finite("cost_usd", option.cost_usd, &context)?;
    check_non_negative_finite("weight_lb", option.weight_lb, &context)?;
    if !option.performance_score.is_finite() {
        return Err(IntegrityError::InvalidValue {
            field: format!("{context} performance_score"),
            value: option.performance_score.to_string(),
            reason: "must be finite".to_string(),
        });
    }
    for (name, value) in &option.specs {
        if !value.is_finite() {
            return Err(IntegrityError::InvalidValue {
                field: format!("{context} spec '{name}'"),
                value: value.to_string(),
                reason: "must be finite".to_string(),
            });
        }
    }
    Ok(())
}

fn check_requirement(
    requirement: &RequirementDef,
    options_by_id: &HashMap<&bom_core::OptionId, &BomOption>,
) -> Result<(), IntegrityError> {
    let context = format!(
        "requirement '{}' {}.{}",
        requirement.doc_id, requirement.component_group, requirement.spec_name
    );
    if let Some(linked) = &requirement.linked_option_id {
        if !options_by_id.contains_key(linked) {
            return Err(IntegrityError::MissingReference {
                id: linked.to_string(),
                context: format!("{context} linked_option_id"),
            });
        }
    }
    if requirement.min_value.is_none() && requirement.max_value.is_none() {
        return Err(IntegrityError::InvalidValue {
            field: context,
            value: "none".to_string(),
            reason: "needs a minimum or a maximum bound".to_string(),
        });
    }
    for (field, bound) in [
        ("min_value", requirement.min_value),
        ("max_value", requirement.max_value),
    ] {
        if let Some(v) = bound {
            if !v.is_finite() {
                return Err(IntegrityError::InvalidValue {
                    field: format!("{context} {field}"),
                    value: v.to_string(),
                    reason: "must be finite".to_string(),
                });
            }
        }
    }
    Ok(())
}

fn check_non_negative_finite(
    field: &'static str,
    value: f64,
    context: &str,
) -> Result<(), IntegrityError> {
    bom_core::ensure_non_negative(value, field)
        .map(|_| ())
        .map_err(|err| IntegrityError::InvalidValue {
            field: format!("{context} {field}"),
            value: value.to_string(),
            reason: err.to_string(),
        })
}
