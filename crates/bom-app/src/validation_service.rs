//! Selection validation.

use crate::context::AppContext;
use crate::error::AppResult;
use bom_validate::{ValidateRequest, ValidationEngine, ValidationReport};

pub fn validate_selection(
    ctx: &AppContext,
    request: &ValidateRequest,
) -> AppResult<ValidationReport> {
    let engine = ValidationEngine::new(ctx.store());
    Ok(engine.validate(&request.selected_option_ids, &request.model_id)?)
}
