//! Handles shared by every service call.

use crate::config::{AiConfig, AppConfig};
use crate::error::{AppError, AppResult};
use bom_ai::{
    CompletionSettings, FileTokenIssuer, HttpCompletionClient, StaticTokenIssuer, TextGenerator,
    TokenCache,
};
use bom_store::{ImportSummary, SqliteStore, Store};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Store plus optional text-generation client. Cheap to clone; each handle
/// is `Send + Sync` so one context serves concurrent requests.
#[derive(Clone)]
pub struct AppContext {
    store: Arc<dyn Store>,
    generator: Option<Arc<dyn TextGenerator>>,
    config: AppConfig,
}

impl AppContext {
    pub fn new(
        store: Arc<dyn Store>,
        generator: Option<Arc<dyn TextGenerator>>,
        config: AppConfig,
    ) -> Self {
        Self {
            store,
            generator,
            config,
        }
    }

    /// Opens the configured SQLite database and builds the text-generation
    /// client when an endpoint is configured.
    pub fn open(config: AppConfig) -> AppResult<Self> {
        let store = open_store(&config)?;
        let generator = build_generator(&config.ai)?;
        Ok(Self::new(Arc::new(store), generator, config))
    }

    pub fn store(&self) -> &dyn Store {
        &*self.store
    }

    pub fn generator(&self) -> Option<&dyn TextGenerator> {
        self.generator.as_deref()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

pub fn open_store(config: &AppConfig) -> AppResult<SqliteStore> {
    info!(path = %config.database_path.display(), "opening database");
    Ok(SqliteStore::new(&config.database_path)?)
}

/// Imports a catalog seed file into `store`, replacing catalog rows.
pub fn init_database(store: &SqliteStore, seed_path: &Path) -> AppResult<ImportSummary> {
    let catalog = bom_catalog::load_path(seed_path)?;
    Ok(store.import_catalog(&catalog)?)
}

/// Imports `seed_path` only when the store holds no models and the file
/// exists. Returns the import summary when it ran.
pub fn seed_if_empty(store: &SqliteStore, seed_path: &Path) -> AppResult<Option<ImportSummary>> {
    use bom_store::OptionCatalog;

    if !store.list_models()?.is_empty() || !seed_path.exists() {
        return Ok(None);
    }
    info!(seed = %seed_path.display(), "database is empty; importing seed catalog");
    init_database(store, seed_path).map(Some)
}

pub fn build_generator(ai: &AiConfig) -> AppResult<Option<Arc<dyn TextGenerator>>> {
    if !ai.enabled() {
        return Ok(None);
    }
    let settings = CompletionSettings {
        endpoint: ai.endpoint.clone(),
        model: ai.model.clone(),
        timeout_ms: ai.timeout_ms,
        ..CompletionSettings::default()
    };
    let skew = chrono::Duration::seconds(ai.refresh_skew_s);

    let generator: Arc<dyn TextGenerator> = match (&ai.access_token, &ai.token_file) {
        (Some(token), _) => Arc::new(HttpCompletionClient::new(
            settings,
            TokenCache::new(StaticTokenIssuer::new(token.clone()), skew),
        )?),
        (None, Some(path)) => Arc::new(HttpCompletionClient::new(
            settings,
            TokenCache::new(
                FileTokenIssuer::new(path.clone(), chrono::Duration::seconds(ai.token_lifetime_s)),
                skew,
            ),
        )?),
        (None, None) => {
            return Err(AppError::Config(
                "ai.endpoint is set but neither ai.access_token nor ai.token_file is".to_string(),
            ));
        }
    };
    info!(endpoint = %ai.endpoint, model = %ai.model, "text generation enabled");
    Ok(Some(generator))
}
