//! Error types for the bom-app service layer.

use std::path::PathBuf;

/// Application error shared by the CLI and the HTTP front. Backend errors
/// are flattened to strings so frontends only match on the category.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Text generation error: {0}")]
    Ai(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read config file: {path}")]
    ConfigFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for bom-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<bom_store::StoreError> for AppError {
    fn from(err: bom_store::StoreError) -> Self {
        use bom_store::StoreError;
        match err {
            StoreError::NotFound { .. } => AppError::NotFound(err.to_string()),
            StoreError::Unavailable(_) => AppError::DataUnavailable(err.to_string()),
            StoreError::Integrity(_) => AppError::Catalog(err.to_string()),
            other => AppError::Store(other.to_string()),
        }
    }
}

impl From<bom_validate::ValidateError> for AppError {
    fn from(err: bom_validate::ValidateError) -> Self {
        AppError::DataUnavailable(err.to_string())
    }
}

impl From<bom_ai::AiError> for AppError {
    fn from(err: bom_ai::AiError) -> Self {
        match err {
            bom_ai::AiError::Config(msg) => AppError::Config(msg),
            other => AppError::Ai(other.to_string()),
        }
    }
}

impl From<bom_catalog::CatalogError> for AppError {
    fn from(err: bom_catalog::CatalogError) -> Self {
        AppError::Catalog(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Config(err.to_string())
    }
}
