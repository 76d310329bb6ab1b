//! bom-validate: requirement compliance and fix plans for a truck
//! configuration.
//!
//! Given the selected option ids of a model, the engine looks up the
//! requirements linked to the selection, checks each component group's
//! selected option against its group's bounds and, for every violated group,
//! proposes the cheapest option of that model satisfying all of them.
//!
//! The engine is stateless and synchronous; all data comes from the store
//! traits in `bom-store`.

pub mod check;
pub mod engine;
pub mod fix_plan;
pub mod types;

pub use check::{check_option, satisfies_all};
pub use engine::{ValidationEngine, validate};
pub use fix_plan::find_cheapest_compliant;
pub use types::*;

use bom_store::StoreError;

pub type ValidateResult<T> = Result<T, ValidateError>;

/// The only failure the engine raises: the store could not answer. Rule
/// violations are reported in the [`ValidationReport`], never as errors.
#[derive(thiserror::Error, Debug)]
pub enum ValidateError {
    #[error("Validation data unavailable: {0}")]
    DataUnavailable(#[from] StoreError),
}
