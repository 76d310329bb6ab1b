//! Shared application service layer for the truck configurator.
//!
//! Both frontends (CLI and HTTP) call these functions with an
//! [`AppContext`]; business rules live in the library crates underneath.

pub mod catalog_service;
pub mod config;
pub mod config_service;
pub mod context;
pub mod describe_service;
pub mod document_service;
pub mod error;
pub mod health;
pub mod optimize_service;
pub mod progress;
pub mod report_service;
pub mod validation_service;

pub use config::{AiConfig, AppConfig, DocumentConfig, ServerConfig};
pub use config_service::{SaveConfigRequest, UpdateConfigRequest};
pub use context::{AppContext, build_generator, init_database, open_store, seed_if_empty};
pub use describe_service::{DescribeRequest, DescribeResult, describe_config};
pub use document_service::{IngestRequest, IngestResult};
pub use error::{AppError, AppResult};
pub use health::{HealthStatus, health};
pub use optimize_service::{OptimizeRequest, optimize_request};
pub use progress::{IngestProgressEvent, IngestStage};
pub use report_service::parse_option_list;
pub use validation_service::validate_selection;
