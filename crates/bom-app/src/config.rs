//! Application configuration: defaults, then an optional YAML file, then
//! `BOM_*` environment variables.

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// SQLite file; `:memory:` opens a private in-memory database.
    pub database_path: PathBuf,
    /// Catalog seed imported by `init` (and by the server when the database
    /// is empty).
    pub seed_path: PathBuf,
    pub ai: AiConfig,
    pub server: ServerConfig,
    pub documents: DocumentConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("bom.sqlite3"),
            seed_path: PathBuf::from("data/catalog.yaml"),
            ai: AiConfig::default(),
            server: ServerConfig::default(),
            documents: DocumentConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Chat-completions URL. Empty disables text generation.
    pub endpoint: String,
    pub model: String,
    pub timeout_ms: u64,
    /// Personal access token; never expires.
    pub access_token: Option<String>,
    /// Session token file re-read on refresh when no access token is set.
    pub token_file: Option<PathBuf>,
    pub token_lifetime_s: i64,
    pub refresh_skew_s: i64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            model: "mistral-large2".to_string(),
            timeout_ms: 30_000,
            access_token: None,
            token_file: None,
            token_lifetime_s: 59 * 60,
            refresh_skew_s: 60,
        }
    }
}

impl AiConfig {
    pub fn enabled(&self) -> bool {
        !self.endpoint.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    /// Leading chunks handed to extraction.
    pub extract_chunks: usize,
    /// Character cap on the extraction text.
    pub extract_chars: usize,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1500,
            chunk_overlap: 200,
            extract_chunks: 5,
            extract_chars: 6000,
        }
    }
}

impl AppConfig {
    /// Defaults, overlaid by `path` when given, overlaid by the process
    /// environment.
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.check()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| AppError::ConfigFileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Applies `BOM_*` overrides read through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> AppResult<()> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("BOM_DATABASE_PATH") {
            self.database_path = PathBuf::from(v);
        }
        if let Some(v) = get("BOM_SEED_PATH") {
            self.seed_path = PathBuf::from(v);
        }
        if let Some(v) = get("BOM_AI_ENDPOINT") {
            self.ai.endpoint = v;
        }
        if let Some(v) = get("BOM_AI_MODEL") {
            self.ai.model = v;
        }
        if let Some(v) = get("BOM_AI_TIMEOUT_MS") {
            self.ai.timeout_ms = parse_env("BOM_AI_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = get("BOM_AI_TOKEN") {
            self.ai.access_token = Some(v);
        }
        if let Some(v) = get("BOM_AI_TOKEN_FILE") {
            self.ai.token_file = Some(PathBuf::from(v));
        }
        if let Some(v) = get("BOM_HTTP_BIND") {
            self.server.bind = v;
        }
        Ok(())
    }

    pub fn check(&self) -> AppResult<()> {
        let docs = &self.documents;
        if docs.chunk_size == 0 {
            return Err(AppError::Config("documents.chunk_size must be > 0".to_string()));
        }
        if docs.chunk_overlap >= docs.chunk_size {
            return Err(AppError::Config(format!(
                "documents.chunk_overlap ({}) must be smaller than chunk_size ({})",
                docs.chunk_overlap, docs.chunk_size
            )));
        }
        if self.ai.refresh_skew_s < 0 || self.ai.token_lifetime_s <= self.ai.refresh_skew_s {
            return Err(AppError::Config(
                "ai.token_lifetime_s must exceed ai.refresh_skew_s".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_env<T: FromStr>(key: &str, raw: &str) -> AppResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::Config(format!("{key} has an invalid value '{raw}'")))
}
