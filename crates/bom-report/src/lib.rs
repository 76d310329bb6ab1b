//! bom-report: read-side views over a model's options.
//!
//! - [`hierarchy`]: System → Subsystem → Component Group report with per-item
//!   status and totals.
//! - [`optimize`]: deterministic per-group picks for a structured
//!   optimization intent.

pub mod hierarchy;
pub mod optimize;

pub use hierarchy::{
    BomItem, ComponentGroupNode, ConfigurationReport, ItemStatus, ReportTotals, SubsystemNode,
    SystemNode, build_hierarchy, build_report, report_for_model,
};
pub use optimize::{Objective, OptimizationIntent, OptimizationResult, Recommendation, optimize};
