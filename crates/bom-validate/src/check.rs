//! Per-option bound checks.
//!
//! A spec the option does not carry reads as `0.0`, so a min-bounded
//! requirement on an absent spec always fails.

use crate::types::{Direction, SpecMismatch};
use bom_catalog::{BomOption, Requirement};
use std::borrow::Borrow;
use tracing::debug;

/// Mismatches of `option` against every requirement, in requirement order.
/// Min and max are checked independently.
pub fn check_option<R: Borrow<Requirement>>(
    option: &BomOption,
    requirements: &[R],
) -> Vec<SpecMismatch> {
    let mut mismatches = Vec::new();
    for requirement in requirements {
        let requirement = requirement.borrow();
        let actual = option.spec_value(&requirement.spec_name);

        if let Some(min) = requirement.min_value {
            if actual < min {
                mismatches.push(SpecMismatch {
                    spec_name: requirement.spec_name.clone(),
                    current_value: actual,
                    required_value: min,
                    unit: requirement.unit.clone(),
                    direction: Direction::BelowMin,
                    reason: format!(
                        "has {} but needs {}",
                        with_unit(actual, &requirement.unit),
                        with_unit(min, &requirement.unit)
                    ),
                });
            }
        }
        if let Some(max) = requirement.max_value {
            if actual > max {
                mismatches.push(SpecMismatch {
                    spec_name: requirement.spec_name.clone(),
                    current_value: actual,
                    required_value: max,
                    unit: requirement.unit.clone(),
                    direction: Direction::AboveMax,
                    reason: format!(
                        "has {} but allows at most {}",
                        with_unit(actual, &requirement.unit),
                        with_unit(max, &requirement.unit)
                    ),
                });
            }
        }

        debug!(
            option = %option.option_id,
            spec = %requirement.spec_name,
            actual,
            min = ?requirement.min_value,
            max = ?requirement.max_value,
            "requirement checked"
        );
    }
    mismatches
}

pub fn satisfies_all<R: Borrow<Requirement>>(option: &BomOption, requirements: &[R]) -> bool {
    requirements.iter().all(|requirement| {
        let requirement = requirement.borrow();
        let actual = option.spec_value(&requirement.spec_name);
        requirement.min_value.is_none_or(|min| actual >= min)
            && requirement.max_value.is_none_or(|max| actual <= max)
    })
}

fn with_unit(value: f64, unit: &str) -> String {
    if unit.is_empty() {
        format!("{value}")
    } else {
        format!("{value} {unit}")
    }
}
