//! Catalog browsing.

use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use bom_catalog::{ModelOptionRow, TruckModel};
use bom_core::ModelId;

/// Models ordered by base MSRP.
pub fn list_models(ctx: &AppContext) -> AppResult<Vec<TruckModel>> {
    Ok(ctx.store().list_models()?)
}

pub fn get_model(ctx: &AppContext, model_id: &ModelId) -> AppResult<TruckModel> {
    ctx.store()
        .get_model(model_id)?
        .ok_or_else(|| AppError::NotFound(format!("Model not found: {model_id}")))
}

/// Availability rows for one model, or for every model when `model_id` is
/// `None`, ordered by system, subsystem, component group and cost.
pub fn list_options(
    ctx: &AppContext,
    model_id: Option<&ModelId>,
) -> AppResult<Vec<ModelOptionRow>> {
    Ok(ctx.store().options_for_model(model_id)?)
}
