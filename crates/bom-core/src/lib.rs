//! bom-core: shared foundation for the truck configurator.
//!
//! Contains:
//! - ids (string-backed identifiers for options, models, configs, documents)
//! - numeric (finite and non-negative guards)
//! - units (uom mass in pounds + serde adapter)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod units;

pub use error::{BomError, BomResult};
pub use ids::*;
pub use numeric::*;
pub use units::*;
