//! bom-store: persistence for the catalog, requirements, saved configurations
//! and engineering documents.
//!
//! The read/write surface is split into small traits (see [`traits`]) so the
//! validation engine only depends on the lookups it needs. Two backends are
//! provided: [`SqliteStore`] for real deployments and [`MemoryStore`] for tests
//! and demos.

pub mod hash;
pub mod memory;
pub mod sqlite;
pub mod traits;

pub use hash::document_id;
pub use memory::MemoryStore;
pub use sqlite::{ImportSummary, SqliteStore};
pub use traits::*;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Catalog rejected: {0}")]
    Integrity(#[from] bom_catalog::IntegrityError),
}

impl StoreError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}
