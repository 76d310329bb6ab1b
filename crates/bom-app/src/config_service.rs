//! Saved configurations.

use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use bom_catalog::SavedConfig;
use bom_core::{ConfigId, ModelId, OptionId};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveConfigRequest {
    pub config_name: String,
    pub model_id: ModelId,
    #[serde(default)]
    pub selected_options: Vec<OptionId>,
    #[serde(default)]
    pub total_cost: f64,
    #[serde(default)]
    pub total_weight: f64,
    #[serde(default)]
    pub performance_summary: serde_json::Value,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub is_validated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateConfigRequest {
    pub config_id: ConfigId,
    pub config_name: String,
    #[serde(default)]
    pub notes: String,
}

fn timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn save_config(ctx: &AppContext, request: &SaveConfigRequest) -> AppResult<ConfigId> {
    save_config_at(ctx, request, Utc::now())
}

/// Saves with an explicit clock. Ids are `CFG-<unix millis>`, bumped past
/// any id already taken.
pub fn save_config_at(
    ctx: &AppContext,
    request: &SaveConfigRequest,
    now: DateTime<Utc>,
) -> AppResult<ConfigId> {
    if request.config_name.trim().is_empty() {
        return Err(AppError::InvalidInput("configName is required".to_string()));
    }
    let store = ctx.store();
    if store.get_model(&request.model_id)?.is_none() {
        return Err(AppError::NotFound(format!("Model not found: {}", request.model_id)));
    }

    let mut millis = now.timestamp_millis();
    let config_id = loop {
        let candidate = ConfigId::new(format!("CFG-{millis}"));
        if store.get_config(&candidate)?.is_none() {
            break candidate;
        }
        millis += 1;
    };

    let config = SavedConfig {
        config_id: config_id.clone(),
        config_name: request.config_name.trim().to_string(),
        model_id: request.model_id.clone(),
        config_options: request.selected_options.clone(),
        total_cost_usd: request.total_cost,
        total_weight_lb: request.total_weight,
        performance_summary: request.performance_summary.clone(),
        notes: request.notes.clone(),
        is_validated: request.is_validated,
        created_at: timestamp(now),
        updated_at: None,
    };
    store.insert_config(&config)?;
    info!(
        config_id = %config_id,
        model_id = %config.model_id,
        options = config.config_options.len(),
        "saved configuration"
    );
    Ok(config_id)
}

/// Newest first.
pub fn list_configs(ctx: &AppContext) -> AppResult<Vec<SavedConfig>> {
    Ok(ctx.store().list_configs()?)
}

pub fn get_config(ctx: &AppContext, config_id: &ConfigId) -> AppResult<SavedConfig> {
    ctx.store()
        .get_config(config_id)?
        .ok_or_else(|| AppError::NotFound(format!("Configuration not found: {config_id}")))
}

pub fn update_config(ctx: &AppContext, request: &UpdateConfigRequest) -> AppResult<()> {
    if request.config_name.trim().is_empty() {
        return Err(AppError::InvalidInput("configName is required".to_string()));
    }
    ctx.store().update_config(
        &request.config_id,
        request.config_name.trim(),
        &request.notes,
        &timestamp(Utc::now()),
    )?;
    info!(config_id = %request.config_id, "updated configuration");
    Ok(())
}

pub fn delete_config(ctx: &AppContext, config_id: &ConfigId) -> AppResult<()> {
    if !ctx.store().delete_config(config_id)? {
        return Err(AppError::NotFound(format!("Configuration not found: {config_id}")));
    }
    info!(config_id = %config_id, "deleted configuration");
    Ok(())
}
