//! SQLite-backed store.
//!
//! One connection behind a mutex; every statement binds its values as
//! parameters. `IN (...)` lists are expanded to numbered placeholders, never
//! to literal values.

use crate::traits::{ConfigStore, DocumentStore, OptionCatalog, RequirementStore};
use crate::{StoreError, StoreResult};
use bom_catalog::{
    BomOption, Catalog, EngineeringDoc, ModelOptionRow, PerformanceCategory, Requirement,
    RequirementDef, SavedConfig, SpecMap, TruckModel, check_catalog,
};
use bom_core::{ConfigId, DocId, ModelId, OptionId};
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, warn};

const OPTION_COLUMNS: &str = "o.option_id, o.option_name, o.system, o.subsystem, \
     o.component_group, o.description, o.cost_usd, o.weight_lb, \
     o.performance_category, o.performance_score, o.specs";

const MODEL_COLUMNS: &str = "model_id, model_name, description, base_msrp, base_weight_lb, \
     max_payload_lb, max_towing_lb, sleeper_available, model_tier";

const REQUIREMENT_COLUMNS: &str = "rule_id, doc_id, doc_title, linked_option_id, \
     component_group, spec_name, min_value, max_value, unit, raw_requirement";

const CONFIG_COLUMNS: &str = "config_id, config_name, model_id, config_options, \
     total_cost_usd, total_weight_lb, performance_summary, notes, is_validated, \
     created_at, updated_at";

/// Row counts written by [`SqliteStore::import_catalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportSummary {
    pub models: usize,
    pub options: usize,
    pub model_options: usize,
    pub requirements: usize,
}

#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Opens (or creates) a database file. `":memory:"` opens a private
    /// in-memory database.
    pub fn new(db_path: impl AsRef<Path>) -> StoreResult<Self> {
        let db_path = db_path.as_ref();
        if db_path == Path::new(":memory:") {
            return Self::in_memory();
        }
        Self::from_connection(Connection::open(db_path)?)
    }

    pub fn in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("connection mutex poisoned".to_string()))
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS models (
                model_id TEXT PRIMARY KEY,
                model_name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                base_msrp REAL NOT NULL,
                base_weight_lb REAL NOT NULL,
                max_payload_lb REAL NOT NULL DEFAULT 0,
                max_towing_lb REAL NOT NULL DEFAULT 0,
                sleeper_available INTEGER NOT NULL DEFAULT 0,
                model_tier TEXT NOT NULL DEFAULT ''
            );

            CREATE TABLE IF NOT EXISTS options (
                option_id TEXT PRIMARY KEY,
                seq INTEGER NOT NULL,
                option_name TEXT NOT NULL,
                system TEXT NOT NULL,
                subsystem TEXT NOT NULL,
                component_group TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                cost_usd REAL NOT NULL,
                weight_lb REAL NOT NULL,
                performance_category TEXT NOT NULL,
                performance_score REAL NOT NULL DEFAULT 0,
                specs TEXT NOT NULL DEFAULT '{}'
            );

            CREATE INDEX IF NOT EXISTS idx_options_group
                ON options(component_group, cost_usd, seq);

            CREATE TABLE IF NOT EXISTS model_options (
                model_id TEXT NOT NULL REFERENCES models(model_id) ON DELETE CASCADE,
                option_id TEXT NOT NULL REFERENCES options(option_id) ON DELETE CASCADE,
                is_default INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (model_id, option_id)
            );

            CREATE TABLE IF NOT EXISTS requirements (
                rule_id INTEGER PRIMARY KEY AUTOINCREMENT,
                doc_id TEXT NOT NULL,
                doc_title TEXT NOT NULL,
                linked_option_id TEXT,
                component_group TEXT NOT NULL,
                spec_name TEXT NOT NULL,
                min_value REAL,
                max_value REAL,
                unit TEXT NOT NULL DEFAULT '',
                raw_requirement TEXT NOT NULL DEFAULT '',
                CHECK (min_value IS NOT NULL OR max_value IS NOT NULL)
            );

            CREATE INDEX IF NOT EXISTS idx_requirements_linked
                ON requirements(linked_option_id);

            CREATE INDEX IF NOT EXISTS idx_requirements_doc
                ON requirements(doc_id);

            CREATE TABLE IF NOT EXISTS saved_configs (
                config_id TEXT PRIMARY KEY,
                config_name TEXT NOT NULL,
                model_id TEXT NOT NULL,
                config_options TEXT NOT NULL,
                total_cost_usd REAL NOT NULL,
                total_weight_lb REAL NOT NULL,
                performance_summary TEXT NOT NULL DEFAULT 'null',
                notes TEXT NOT NULL DEFAULT '',
                is_validated INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT
            );

            CREATE TABLE IF NOT EXISTS documents (
                doc_id TEXT PRIMARY KEY,
                doc_title TEXT NOT NULL,
                linked_option_ids TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS document_chunks (
                doc_id TEXT NOT NULL REFERENCES documents(doc_id) ON DELETE CASCADE,
                chunk_index INTEGER NOT NULL,
                chunk_text TEXT NOT NULL,
                PRIMARY KEY (doc_id, chunk_index)
            );",
        )?;
        Ok(())
    }

    /// Replaces the catalog tables with `catalog`'s rows.
    ///
    /// Seed requirements replace earlier requirements of the same document
    /// ids; requirements of other documents are kept.
    pub fn import_catalog(&self, catalog: &Catalog) -> StoreResult<ImportSummary> {
        check_catalog(catalog)?;

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM model_options", [])?;
        tx.execute("DELETE FROM options", [])?;
        tx.execute("DELETE FROM models", [])?;

        for model in &catalog.models {
            tx.execute(
                &format!(
                    "INSERT INTO models ({MODEL_COLUMNS}) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
                ),
                params![
                    model.model_id.as_str(),
                    model.model_name,
                    model.description,
                    model.base_msrp,
                    model.base_weight_lb,
                    model.max_payload_lb,
                    model.max_towing_lb,
                    model.sleeper_available,
                    model.model_tier,
                ],
            )?;
        }

        for (seq, option) in catalog.options.iter().enumerate() {
            let specs = serde_json::to_string(&option.specs)?;
            tx.execute(
                "INSERT INTO options (option_id, seq, option_name, system, subsystem,
                     component_group, description, cost_usd, weight_lb,
                     performance_category, performance_score, specs)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    option.option_id.as_str(),
                    seq as i64,
                    option.option_name,
                    option.system,
                    option.subsystem,
                    option.component_group,
                    option.description,
                    option.cost_usd,
                    option.weight_lb,
                    option.performance_category.as_str(),
                    option.performance_score,
                    specs,
                ],
            )?;
        }

        for link in &catalog.model_options {
            tx.execute(
                "INSERT INTO model_options (model_id, option_id, is_default) VALUES (?1, ?2, ?3)",
                params![link.model_id.as_str(), link.option_id.as_str(), link.is_default],
            )?;
        }

        let seed_docs: BTreeSet<&str> = catalog
            .requirements
            .iter()
            .map(|r| r.doc_id.as_str())
            .collect();
        for doc_id in &seed_docs {
            tx.execute("DELETE FROM requirements WHERE doc_id = ?1", params![doc_id])?;
        }
        for requirement in &catalog.requirements {
            insert_requirement_row(&tx, requirement)?;
        }

        tx.commit()?;

        let summary = ImportSummary {
            models: catalog.models.len(),
            options: catalog.options.len(),
            model_options: catalog.model_options.len(),
            requirements: catalog.requirements.len(),
        };
        info!(
            models = summary.models,
            options = summary.options,
            requirements = summary.requirements,
            "catalog imported"
        );
        Ok(summary)
    }
}

fn placeholders(count: usize) -> String {
    (1..=count)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn parse_specs(option_id: &str, raw: &str) -> SpecMap {
    match serde_json::from_str::<SpecMap>(raw) {
        Ok(specs) => specs,
        Err(err) => {
            warn!(option_id, error = %err, "malformed spec map, treating as empty");
            SpecMap::new()
        }
    }
}

fn option_from_row(row: &Row<'_>) -> rusqlite::Result<BomOption> {
    let option_id: String = row.get(0)?;
    let category: String = row.get(8)?;
    let specs: Option<String> = row.get(10)?;
    let specs = specs
        .map(|raw| parse_specs(&option_id, &raw))
        .unwrap_or_default();
    Ok(BomOption {
        option_id: OptionId::new(option_id),
        option_name: row.get(1)?,
        system: row.get(2)?,
        subsystem: row.get(3)?,
        component_group: row.get(4)?,
        description: row.get(5)?,
        cost_usd: row.get(6)?,
        weight_lb: row.get(7)?,
        performance_category: PerformanceCategory::parse_lenient(&category),
        performance_score: row.get(9)?,
        specs,
    })
}

fn model_from_row(row: &Row<'_>) -> rusqlite::Result<TruckModel> {
    Ok(TruckModel {
        model_id: ModelId::new(row.get::<_, String>(0)?),
        model_name: row.get(1)?,
        description: row.get(2)?,
        base_msrp: row.get(3)?,
        base_weight_lb: row.get(4)?,
        max_payload_lb: row.get(5)?,
        max_towing_lb: row.get(6)?,
        sleeper_available: row.get(7)?,
        model_tier: row.get(8)?,
    })
}

fn requirement_from_row(row: &Row<'_>) -> rusqlite::Result<Requirement> {
    Ok(Requirement {
        rule_id: row.get(0)?,
        doc_id: DocId::new(row.get::<_, String>(1)?),
        doc_title: row.get(2)?,
        linked_option_id: row.get::<_, Option<String>>(3)?.map(OptionId::new),
        component_group: row.get(4)?,
        spec_name: row.get(5)?,
        min_value: row.get(6)?,
        max_value: row.get(7)?,
        unit: row.get(8)?,
        raw_requirement: row.get(9)?,
    })
}

/// Raw config row; JSON columns are decoded outside the row closure so
/// decoding errors surface as `Serialization`.
struct ConfigRow {
    config_id: String,
    config_name: String,
    model_id: String,
    config_options: String,
    total_cost_usd: f64,
    total_weight_lb: f64,
    performance_summary: String,
    notes: String,
    is_validated: bool,
    created_at: String,
    updated_at: Option<String>,
}

impl ConfigRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            config_id: row.get(0)?,
            config_name: row.get(1)?,
            model_id: row.get(2)?,
            config_options: row.get(3)?,
            total_cost_usd: row.get(4)?,
            total_weight_lb: row.get(5)?,
            performance_summary: row.get(6)?,
            notes: row.get(7)?,
            is_validated: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }

    fn decode(self) -> StoreResult<SavedConfig> {
        Ok(SavedConfig {
            config_id: ConfigId::new(self.config_id),
            config_name: self.config_name,
            model_id: ModelId::new(self.model_id),
            config_options: serde_json::from_str(&self.config_options)?,
            total_cost_usd: self.total_cost_usd,
            total_weight_lb: self.total_weight_lb,
            performance_summary: serde_json::from_str(&self.performance_summary)?,
            notes: self.notes,
            is_validated: self.is_validated,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn insert_requirement_row(conn: &Connection, requirement: &RequirementDef) -> StoreResult<i64> {
    conn.execute(
        "INSERT INTO requirements (doc_id, doc_title, linked_option_id, component_group,
             spec_name, min_value, max_value, unit, raw_requirement)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            requirement.doc_id.as_str(),
            requirement.doc_title,
            requirement.linked_option_id.as_ref().map(|id| id.as_str()),
            requirement.component_group,
            requirement.spec_name,
            requirement.min_value,
            requirement.max_value,
            requirement.unit,
            requirement.raw_requirement,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

impl OptionCatalog for SqliteStore {
    fn list_models(&self) -> StoreResult<Vec<TruckModel>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {MODEL_COLUMNS} FROM models ORDER BY base_msrp, rowid"
        ))?;
        let models = stmt
            .query_map([], model_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(models)
    }

    fn get_model(&self, model_id: &ModelId) -> StoreResult<Option<TruckModel>> {
        let conn = self.conn()?;
        let model = conn
            .query_row(
                &format!("SELECT {MODEL_COLUMNS} FROM models WHERE model_id = ?1"),
                params![model_id.as_str()],
                model_from_row,
            )
            .optional()?;
        Ok(model)
    }

    fn options_by_ids(&self, ids: &[OptionId]) -> StoreResult<Vec<BomOption>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {OPTION_COLUMNS} FROM options o WHERE o.option_id IN ({}) ORDER BY o.seq",
            placeholders(ids.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let options = stmt
            .query_map(params_from_iter(ids.iter().map(|id| id.as_str())), option_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(options)
    }

    fn options_for_group(
        &self,
        model_id: &ModelId,
        component_group: &str,
    ) -> StoreResult<Vec<BomOption>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {OPTION_COLUMNS}
             FROM model_options mo
             JOIN options o ON o.option_id = mo.option_id
             WHERE mo.model_id = ?1 AND o.component_group = ?2
             ORDER BY o.cost_usd ASC, o.seq ASC"
        ))?;
        let options = stmt
            .query_map(params![model_id.as_str(), component_group], option_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(options)
    }

    fn options_for_model(&self, model_id: Option<&ModelId>) -> StoreResult<Vec<ModelOptionRow>> {
        let conn = self.conn()?;
        let base = format!(
            "SELECT {OPTION_COLUMNS}, mo.model_id, mo.is_default
             FROM model_options mo
             JOIN options o ON o.option_id = mo.option_id"
        );
        let order =
            "ORDER BY o.system, o.subsystem, o.component_group, o.cost_usd, o.seq, mo.model_id";
        let map_row = |row: &Row<'_>| -> rusqlite::Result<ModelOptionRow> {
            Ok(ModelOptionRow {
                option: option_from_row(row)?,
                model_id: ModelId::new(row.get::<_, String>(11)?),
                is_default: row.get(12)?,
            })
        };
        let rows = match model_id {
            Some(model_id) => {
                let mut stmt = conn.prepare(&format!("{base} WHERE mo.model_id = ?1 {order}"))?;
                let rows = stmt
                    .query_map(params![model_id.as_str()], map_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let mut stmt = conn.prepare(&format!("{base} {order}"))?;
                let rows = stmt
                    .query_map([], map_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
        };
        Ok(rows)
    }

    fn group_spec_names(&self) -> StoreResult<BTreeMap<String, BTreeSet<String>>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT option_id, component_group, specs FROM options ORDER BY seq")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut groups: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (option_id, group, specs) in rows {
            let names = groups.entry(group).or_default();
            names.extend(parse_specs(&option_id, &specs).into_keys());
        }
        Ok(groups)
    }

    fn ping(&self) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }
}

impl RequirementStore for SqliteStore {
    fn requirements_for_options(&self, option_ids: &[OptionId]) -> StoreResult<Vec<Requirement>> {
        if option_ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {REQUIREMENT_COLUMNS} FROM requirements
             WHERE linked_option_id IN ({}) ORDER BY rule_id",
            placeholders(option_ids.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let requirements = stmt
            .query_map(
                params_from_iter(option_ids.iter().map(|id| id.as_str())),
                requirement_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(requirements)
    }

    fn requirements_for_document(&self, doc_id: &DocId) -> StoreResult<Vec<Requirement>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {REQUIREMENT_COLUMNS} FROM requirements WHERE doc_id = ?1 ORDER BY rule_id"
        ))?;
        let requirements = stmt
            .query_map(params![doc_id.as_str()], requirement_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(requirements)
    }

    fn insert_requirement(&self, requirement: &RequirementDef) -> StoreResult<i64> {
        let conn = self.conn()?;
        insert_requirement_row(&conn, requirement)
    }
}

impl ConfigStore for SqliteStore {
    fn insert_config(&self, config: &SavedConfig) -> StoreResult<()> {
        let options = serde_json::to_string(&config.config_options)?;
        let summary = serde_json::to_string(&config.performance_summary)?;
        let conn = self.conn()?;
        conn.execute(
            &format!(
                "INSERT INTO saved_configs ({CONFIG_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
            ),
            params![
                config.config_id.as_str(),
                config.config_name,
                config.model_id.as_str(),
                options,
                config.total_cost_usd,
                config.total_weight_lb,
                summary,
                config.notes,
                config.is_validated,
                config.created_at,
                config.updated_at,
            ],
        )?;
        Ok(())
    }

    fn list_configs(&self) -> StoreResult<Vec<SavedConfig>> {
        let rows = {
            let conn = self.conn()?;
            let mut stmt = conn.prepare(&format!(
                "SELECT {CONFIG_COLUMNS} FROM saved_configs ORDER BY created_at DESC, rowid DESC"
            ))?;
            let rows = stmt
                .query_map([], ConfigRow::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };
        rows.into_iter().map(ConfigRow::decode).collect()
    }

    fn get_config(&self, config_id: &ConfigId) -> StoreResult<Option<SavedConfig>> {
        let row = {
            let conn = self.conn()?;
            conn.query_row(
                &format!("SELECT {CONFIG_COLUMNS} FROM saved_configs WHERE config_id = ?1"),
                params![config_id.as_str()],
                ConfigRow::from_row,
            )
            .optional()?
        };
        row.map(ConfigRow::decode).transpose()
    }

    fn update_config(
        &self,
        config_id: &ConfigId,
        config_name: &str,
        notes: &str,
        updated_at: &str,
    ) -> StoreResult<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE saved_configs SET config_name = ?1, notes = ?2, updated_at = ?3
             WHERE config_id = ?4",
            params![config_name, notes, updated_at, config_id.as_str()],
        )?;
        if changed == 0 {
            return Err(StoreError::not_found("Configuration", config_id.as_str()));
        }
        Ok(())
    }

    fn delete_config(&self, config_id: &ConfigId) -> StoreResult<bool> {
        let conn = self.conn()?;
        let removed = conn.execute(
            "DELETE FROM saved_configs WHERE config_id = ?1",
            params![config_id.as_str()],
        )?;
        Ok(removed > 0)
    }
}

/// Raw document header row, see [`ConfigRow`].
struct DocumentRow {
    doc_id: String,
    doc_title: String,
    linked_option_ids: String,
    created_at: String,
    chunk_count: i64,
    rule_count: i64,
}

impl DocumentRow {
    const SELECT: &'static str = "SELECT d.doc_id, d.doc_title, d.linked_option_ids, d.created_at,
            (SELECT COUNT(*) FROM document_chunks c WHERE c.doc_id = d.doc_id),
            (SELECT COUNT(*) FROM requirements r WHERE r.doc_id = d.doc_id)
         FROM documents d";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            doc_id: row.get(0)?,
            doc_title: row.get(1)?,
            linked_option_ids: row.get(2)?,
            created_at: row.get(3)?,
            chunk_count: row.get(4)?,
            rule_count: row.get(5)?,
        })
    }

    fn decode(self) -> StoreResult<EngineeringDoc> {
        Ok(EngineeringDoc {
            doc_id: DocId::new(self.doc_id),
            doc_title: self.doc_title,
            linked_option_ids: serde_json::from_str(&self.linked_option_ids)?,
            created_at: self.created_at,
            chunk_count: self.chunk_count.max(0) as usize,
            rule_count: self.rule_count.max(0) as usize,
        })
    }
}

impl DocumentStore for SqliteStore {
    fn save_document(
        &self,
        doc: &EngineeringDoc,
        chunks: &[String],
        requirements: &[RequirementDef],
    ) -> StoreResult<bool> {
        let linked = serde_json::to_string(&doc.linked_option_ids)?;
        let doc_id = doc.doc_id.as_str();
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM requirements WHERE doc_id = ?1", params![doc_id])?;
        tx.execute("DELETE FROM document_chunks WHERE doc_id = ?1", params![doc_id])?;
        let replaced = tx.execute("DELETE FROM documents WHERE doc_id = ?1", params![doc_id])? > 0;
        tx.execute(
            "INSERT INTO documents (doc_id, doc_title, linked_option_ids, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![doc_id, doc.doc_title, linked, doc.created_at],
        )?;
        for (index, chunk) in chunks.iter().enumerate() {
            tx.execute(
                "INSERT INTO document_chunks (doc_id, chunk_index, chunk_text) VALUES (?1, ?2, ?3)",
                params![doc_id, index as i64, chunk],
            )?;
        }
        for requirement in requirements {
            insert_requirement_row(&tx, requirement)?;
        }
        tx.commit()?;
        Ok(replaced)
    }

    fn list_documents(&self) -> StoreResult<Vec<EngineeringDoc>> {
        let rows = {
            let conn = self.conn()?;
            let mut stmt = conn.prepare(&format!(
                "{} ORDER BY d.created_at DESC, d.rowid DESC",
                DocumentRow::SELECT
            ))?;
            let rows = stmt
                .query_map([], DocumentRow::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };
        rows.into_iter().map(DocumentRow::decode).collect()
    }

    fn get_document(&self, doc_id: &DocId) -> StoreResult<Option<EngineeringDoc>> {
        let row = {
            let conn = self.conn()?;
            conn.query_row(
                &format!("{} WHERE d.doc_id = ?1", DocumentRow::SELECT),
                params![doc_id.as_str()],
                DocumentRow::from_row,
            )
            .optional()?
        };
        row.map(DocumentRow::decode).transpose()
    }

    fn document_chunks(&self, doc_id: &DocId) -> StoreResult<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT chunk_text FROM document_chunks WHERE doc_id = ?1 ORDER BY chunk_index",
        )?;
        let chunks = stmt
            .query_map(params![doc_id.as_str()], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(chunks)
    }

    fn delete_document(&self, doc_id: &DocId) -> StoreResult<bool> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM requirements WHERE doc_id = ?1",
            params![doc_id.as_str()],
        )?;
        tx.execute(
            "DELETE FROM document_chunks WHERE doc_id = ?1",
            params![doc_id.as_str()],
        )?;
        let removed = tx.execute(
            "DELETE FROM documents WHERE doc_id = ?1",
            params![doc_id.as_str()],
        )?;
        tx.commit()?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bom_catalog::ModelOption;

    fn option(id: &str, group: &str, cost: f64, specs: &[(&str, f64)]) -> BomOption {
        BomOption {
            option_id: OptionId::from(id),
            option_name: id.to_string(),
            system: "Powertrain".to_string(),
            subsystem: "Engine".to_string(),
            component_group: group.to_string(),
            description: String::new(),
            cost_usd: cost,
            weight_lb: 10.0,
            performance_category: PerformanceCategory::Power,
            performance_score: 5.0,
            specs: specs.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }
    }

    fn catalog() -> Catalog {
        Catalog {
            version: 1,
            models: vec![TruckModel {
                model_id: ModelId::from("M1"),
                model_name: "Hauler".to_string(),
                description: String::new(),
                base_msrp: 100_000.0,
                base_weight_lb: 18_000.0,
                max_payload_lb: 0.0,
                max_towing_lb: 0.0,
                sleeper_available: false,
                model_tier: String::new(),
            }],
            options: vec![
                option("B", "Turbocharger", 800.0, &[("boost_psi", 50.0)]),
                option("A", "Turbocharger", 800.0, &[("boost_psi", 55.0)]),
                option("S", "Turbocharger", 0.0, &[("boost_psi", 40.0)]),
            ],
            model_options: ["B", "A", "S"]
                .iter()
                .map(|id| ModelOption {
                    model_id: ModelId::from("M1"),
                    option_id: OptionId::from(*id),
                    is_default: *id == "S",
                })
                .collect(),
            requirements: vec![],
        }
    }

    #[test]
    fn group_scan_orders_by_cost_then_catalog_order() {
        let store = SqliteStore::in_memory().unwrap();
        store.import_catalog(&catalog()).unwrap();
        let ids: Vec<String> = store
            .options_for_group(&ModelId::from("M1"), "Turbocharger")
            .unwrap()
            .into_iter()
            .map(|o| o.option_id.into_inner())
            .collect();
        assert_eq!(ids, vec!["S", "B", "A"]);
    }

    #[test]
    fn malformed_specs_read_as_empty() {
        let store = SqliteStore::in_memory().unwrap();
        store.import_catalog(&catalog()).unwrap();
        {
            let conn = store.conn().unwrap();
            conn.execute("UPDATE options SET specs = 'not json' WHERE option_id = 'B'", [])
                .unwrap();
        }
        let options = store.options_by_ids(&[OptionId::from("B")]).unwrap();
        assert_eq!(options.len(), 1);
        assert!(options[0].specs.is_empty());
        assert_eq!(options[0].spec_value("boost_psi"), 0.0);
    }

    #[test]
    fn reimport_replaces_catalog_rows() {
        let store = SqliteStore::in_memory().unwrap();
        store.import_catalog(&catalog()).unwrap();
        let mut smaller = catalog();
        smaller.options.truncate(1);
        smaller.model_options.truncate(1);
        store.import_catalog(&smaller).unwrap();
        let rows = store.options_for_model(None).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn ping_succeeds() {
        let store = SqliteStore::in_memory().unwrap();
        store.ping().unwrap();
    }
}
