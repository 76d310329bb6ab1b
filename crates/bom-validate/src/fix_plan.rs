//! Cheapest compliant replacement within one component group.

use crate::ValidateResult;
use crate::check::satisfies_all;
use bom_catalog::{BomOption, Requirement};
use bom_core::ModelId;
use bom_store::OptionCatalog;
use std::borrow::Borrow;
use tracing::debug;

/// First option of `component_group` available to `model_id`, scanned in
/// ascending cost (ties in catalog order), that satisfies every requirement.
///
/// `Ok(None)` means no option of the group complies; that is not an error.
pub fn find_cheapest_compliant<C, R>(
    catalog: &C,
    model_id: &ModelId,
    component_group: &str,
    requirements: &[R],
) -> ValidateResult<Option<BomOption>>
where
    C: OptionCatalog + ?Sized,
    R: Borrow<Requirement>,
{
    let candidates = catalog.options_for_group(model_id, component_group)?;
    for candidate in candidates {
        if satisfies_all(&candidate, requirements) {
            debug!(
                group = component_group,
                option = %candidate.option_id,
                cost = candidate.cost_usd,
                "compliant candidate found"
            );
            return Ok(Some(candidate));
        }
        debug!(
            group = component_group,
            option = %candidate.option_id,
            "candidate rejected"
        );
    }
    Ok(None)
}
