//! Configuration reports.

use crate::config_service;
use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use bom_core::{ConfigId, ModelId, OptionId};
use bom_report::{ConfigurationReport, report_for_model};

pub fn report(
    ctx: &AppContext,
    model_id: &ModelId,
    selected: Vec<OptionId>,
) -> AppResult<ConfigurationReport> {
    Ok(report_for_model(ctx.store(), model_id, selected)?)
}

/// Report for a saved configuration's model and selection.
pub fn report_for_config(ctx: &AppContext, config_id: &ConfigId) -> AppResult<ConfigurationReport> {
    let config = config_service::get_config(ctx, config_id)?;
    report(ctx, &config.model_id, config.config_options)
}

/// Reads an option list given either as a JSON array of strings or as
/// comma-separated ids. Blank input is an empty list.
pub fn parse_option_list(raw: &str) -> AppResult<Vec<OptionId>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    if trimmed.starts_with('[') {
        let values: Vec<serde_json::Value> = serde_json::from_str(trimmed)
            .map_err(|e| AppError::InvalidInput(format!("options is not a JSON array: {e}")))?;
        return values
            .into_iter()
            .map(|value| match value {
                serde_json::Value::String(s) => Ok(OptionId::from(s)),
                serde_json::Value::Number(n) => Ok(OptionId::from(n.to_string())),
                other => Err(AppError::InvalidInput(format!(
                    "option id must be a string, got {other}"
                ))),
            })
            .collect();
    }
    Ok(trimmed
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(OptionId::from)
        .collect())
}
