//! Natural-language optimization over one model's catalog.

use crate::catalog_service;
use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use bom_ai::{keyword_intent, parse_intent};
use bom_core::ModelId;
use bom_report::{OptimizationIntent, OptimizationResult, optimize};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeRequest {
    pub model_id: ModelId,
    #[serde(default)]
    pub request: String,
    /// Skips intent parsing when given.
    #[serde(default)]
    pub intent: Option<OptimizationIntent>,
}

/// Resolves the request's intent (explicit, classified by the text
/// generator, or read from keywords) and picks one option per group.
pub fn optimize_request(
    ctx: &AppContext,
    request: &OptimizeRequest,
) -> AppResult<OptimizationResult> {
    let intent = match &request.intent {
        Some(intent) => intent.clone(),
        None if request.request.trim().is_empty() => {
            return Err(AppError::InvalidInput(
                "either request text or an intent is required".to_string(),
            ));
        }
        None => match ctx.generator() {
            Some(generator) => parse_intent(generator, &request.request),
            None => keyword_intent(&request.request),
        },
    };

    catalog_service::get_model(ctx, &request.model_id)?;
    let rows = ctx.store().options_for_model(Some(&request.model_id))?;
    let result = optimize(&rows, &intent);
    info!(
        model_id = %request.model_id,
        picks = result.recommendations.len(),
        total_cost = result.total_cost,
        "optimized configuration"
    );
    Ok(result)
}
