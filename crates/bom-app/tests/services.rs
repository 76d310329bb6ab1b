//! Service-layer tests over the seed catalog held in memory.

use std::path::Path;
use std::sync::{Arc, Mutex};

use bom_ai::{AiError, AiResult, TextGenerator};
use bom_app::{
    AppConfig, AppContext, AppError, DescribeRequest, IngestProgressEvent, IngestRequest,
    IngestStage, OptimizeRequest, SaveConfigRequest, UpdateConfigRequest, catalog_service,
    config_service, describe_config, describe_service, document_service, health,
    optimize_request, report_service, validate_selection,
};
use bom_core::{ConfigId, DocId, ModelId, OptionId};
use bom_report::{ItemStatus, Objective, OptimizationIntent};
use bom_store::MemoryStore;
use bom_validate::ValidateRequest;
use chrono::{TimeZone, Utc};

struct StubGenerator {
    response: AiResult<String>,
    prompts: Mutex<Vec<String>>,
}

impl StubGenerator {
    fn new(response: AiResult<String>) -> Arc<Self> {
        Arc::new(Self {
            response,
            prompts: Mutex::new(Vec::new()),
        })
    }
}

impl TextGenerator for StubGenerator {
    fn complete(&self, prompt: &str) -> AiResult<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.response.clone()
    }
}

fn context(generator: Option<Arc<dyn TextGenerator>>) -> AppContext {
    let seed = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../data/catalog.yaml");
    let catalog = bom_catalog::load_path(&seed).expect("seed catalog should load");
    let store = MemoryStore::new(catalog).expect("seed catalog should be consistent");
    AppContext::new(Arc::new(store), generator, AppConfig::default())
}

fn ids(list: &[&str]) -> Vec<OptionId> {
    list.iter().map(|s| OptionId::from(*s)).collect()
}

fn regional() -> ModelId {
    ModelId::from("MDL-REGIONAL")
}

fn save_request(name: &str) -> SaveConfigRequest {
    SaveConfigRequest {
        config_name: name.to_string(),
        model_id: regional(),
        selected_options: ids(&["102", "112"]),
        total_cost: 148_600.0,
        total_weight: 17_900.0,
        performance_summary: serde_json::json!({"Power": 8}),
        notes: String::new(),
        is_validated: true,
    }
}

#[test]
fn models_list_in_msrp_order() {
    let ctx = context(None);
    let models = catalog_service::list_models(&ctx).unwrap();
    let names: Vec<&str> = models.iter().map(|m| m.model_id.as_str()).collect();
    assert_eq!(names, vec!["MDL-REGIONAL", "MDL-LONGHAUL"]);
}

#[test]
fn options_for_model_respect_availability() {
    let ctx = context(None);
    let rows = catalog_service::list_options(&ctx, Some(&regional())).unwrap();
    assert!(rows.iter().all(|r| r.model_id == regional()));
    assert!(!rows.iter().any(|r| r.option.option_id.as_str() == "103"));
    assert!(rows.iter().any(|r| r.option.option_id.as_str() == "101" && r.is_default));
}

#[test]
fn unknown_model_is_not_found() {
    let ctx = context(None);
    let err = catalog_service::get_model(&ctx, &ModelId::from("MDL-NOPE")).unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[test]
fn validation_service_runs_engine() {
    let ctx = context(None);
    let report = validate_selection(
        &ctx,
        &ValidateRequest {
            selected_option_ids: ids(&["103", "111"]),
            model_id: ModelId::from("MDL-LONGHAUL"),
        },
    )
    .unwrap();
    assert!(!report.is_valid);
    let plan = report.fix_plan.expect("a compliant turbo exists");
    assert_eq!(plan.remove, ids(&["111"]));
    assert_eq!(plan.add, ids(&["112"]));
}

#[test]
fn saved_config_lifecycle() {
    let ctx = context(None);
    let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
    let id = config_service::save_config_at(&ctx, &save_request("Fleet spec"), now).unwrap();
    assert_eq!(id, ConfigId::new(format!("CFG-{}", now.timestamp_millis())));

    // Same instant again gets the next free id.
    let second = config_service::save_config_at(&ctx, &save_request("Fleet spec 2"), now).unwrap();
    assert_eq!(
        second,
        ConfigId::new(format!("CFG-{}", now.timestamp_millis() + 1))
    );

    let stored = config_service::get_config(&ctx, &id).unwrap();
    assert_eq!(stored.config_options, ids(&["102", "112"]));
    assert!(stored.updated_at.is_none());

    config_service::update_config(
        &ctx,
        &UpdateConfigRequest {
            config_id: id.clone(),
            config_name: "Fleet spec (rev B)".to_string(),
            notes: "customer asked for more boost".to_string(),
        },
    )
    .unwrap();
    let updated = config_service::get_config(&ctx, &id).unwrap();
    assert_eq!(updated.config_name, "Fleet spec (rev B)");
    assert!(updated.updated_at.is_some());

    assert_eq!(config_service::list_configs(&ctx).unwrap().len(), 2);
    config_service::delete_config(&ctx, &id).unwrap();
    assert!(matches!(
        config_service::get_config(&ctx, &id),
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        config_service::delete_config(&ctx, &id),
        Err(AppError::NotFound(_))
    ));
}

#[test]
fn saving_rejects_blank_name_and_unknown_model() {
    let ctx = context(None);
    let blank = SaveConfigRequest {
        config_name: "  ".to_string(),
        ..save_request("x")
    };
    assert!(matches!(
        config_service::save_config(&ctx, &blank),
        Err(AppError::InvalidInput(_))
    ));

    let unknown = SaveConfigRequest {
        model_id: ModelId::from("MDL-NOPE"),
        ..save_request("x")
    };
    assert!(matches!(
        config_service::save_config(&ctx, &unknown),
        Err(AppError::NotFound(_))
    ));
}

#[test]
fn updating_missing_config_is_not_found() {
    let ctx = context(None);
    let err = config_service::update_config(
        &ctx,
        &UpdateConfigRequest {
            config_id: ConfigId::from("CFG-0"),
            config_name: "x".to_string(),
            notes: String::new(),
        },
    )
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[test]
fn report_for_saved_config_uses_its_selection() {
    let ctx = context(None);
    let id = config_service::save_config(&ctx, &save_request("Report me")).unwrap();
    let report = report_service::report_for_config(&ctx, &id).unwrap();
    assert_eq!(report.model.model_id, regional());
    assert_eq!(report.selected_option_ids, ids(&["102", "112"]));

    let engine_item = report
        .bom_hierarchy
        .iter()
        .flat_map(|s| &s.subsystems)
        .flat_map(|s| &s.component_groups)
        .flat_map(|g| &g.items)
        .find(|item| item.option_id.as_str() == "102")
        .expect("engine option is listed");
    assert_eq!(engine_item.status, ItemStatus::Upgraded);
}

fn extraction_response() -> String {
    r#"```json
[
  {"componentGroup": "Turbocharger", "specName": "boost_psi", "minValue": 45, "unit": "PSI",
   "rawRequirement": "At least 45 PSI of boost"}
]
```"#
        .to_string()
}

fn ingest_request() -> IngestRequest {
    IngestRequest {
        title: "X15 565HP Notes".to_string(),
        text: "The 565HP rating requires a turbocharger delivering 45 PSI or more.".to_string(),
        linked_option_ids: ids(&["102", "101"]),
    }
}

#[test]
fn ingested_requirements_feed_validation() {
    let generator = StubGenerator::new(Ok(extraction_response()));
    let ctx = context(Some(generator.clone()));

    let mut events: Vec<IngestProgressEvent> = Vec::new();
    let result = document_service::ingest_document_with_progress(
        &ctx,
        &ingest_request(),
        Some(&mut |event| events.push(event)),
    )
    .unwrap();

    assert_eq!(result.rules_created, 1);
    assert_eq!(result.chunk_count, 1);
    assert!(result.doc_id.as_str().starts_with("DOC-"));
    assert!(result.extraction_warning.is_none());

    let stages: Vec<IngestStage> = events.iter().map(|e| e.stage).collect();
    assert_eq!(
        stages,
        vec![
            IngestStage::Storing,
            IngestStage::Chunking,
            IngestStage::Extracting,
            IngestStage::SavingRules,
            IngestStage::Completed,
        ]
    );

    let prompts = generator.prompts.lock().unwrap();
    assert!(prompts[0].contains("DOCUMENT: X15 565HP Notes"));
    assert!(prompts[0].contains("- Turbocharger: boost_psi"));
    drop(prompts);

    let requirements = document_service::document_requirements(&ctx, &result.doc_id).unwrap();
    assert_eq!(requirements.len(), 1);
    assert_eq!(requirements[0].linked_option_id, Some(OptionId::from("102")));

    let report = validate_selection(
        &ctx,
        &ValidateRequest {
            selected_option_ids: ids(&["102", "111"]),
            model_id: regional(),
        },
    )
    .unwrap();
    assert!(!report.is_valid);
    assert_eq!(report.issues[0].source_doc, "X15 565HP Notes");
    let plan = report.fix_plan.unwrap();
    assert_eq!(plan.add, ids(&["112"]));
}

#[test]
fn reingesting_replaces_previous_rules() {
    let ctx = context(Some(StubGenerator::new(Ok(extraction_response()))));
    let first = document_service::ingest_document(&ctx, &ingest_request()).unwrap();
    let second = document_service::ingest_document(&ctx, &ingest_request()).unwrap();
    assert_eq!(first.doc_id, second.doc_id);
    let requirements = document_service::document_requirements(&ctx, &first.doc_id).unwrap();
    assert_eq!(requirements.len(), 1);
    assert_eq!(document_service::list_documents(&ctx).unwrap().len(), 1);
}

#[test]
fn extraction_failure_still_stores_document() {
    let ctx = context(Some(StubGenerator::new(Err(AiError::Http { status: 503 }))));
    let result = document_service::ingest_document(&ctx, &ingest_request()).unwrap();
    assert_eq!(result.rules_created, 0);
    assert!(result.extraction_warning.unwrap().contains("503"));

    let (doc, text) = document_service::get_document_text(&ctx, &result.doc_id).unwrap();
    assert_eq!(doc.chunk_count, 1);
    assert_eq!(text, ingest_request().text);
}

#[test]
fn ingest_without_generator_skips_extraction() {
    let ctx = context(None);
    let result = document_service::ingest_document(&ctx, &ingest_request()).unwrap();
    assert_eq!(result.rules_created, 0);
    assert!(result.extraction_warning.is_some());
}

#[test]
fn long_documents_are_chunked() {
    let ctx = context(None);
    let request = IngestRequest {
        title: "Long".to_string(),
        text: "x".repeat(4000),
        linked_option_ids: vec![],
    };
    let result = document_service::ingest_document(&ctx, &request).unwrap();
    // Windows start at 0, 1300, 2600: the last one reaches the end.
    assert_eq!(result.chunk_count, 3);
}

#[test]
fn empty_document_is_rejected() {
    let ctx = context(None);
    let request = IngestRequest {
        text: "   ".to_string(),
        ..ingest_request()
    };
    assert!(matches!(
        document_service::ingest_document(&ctx, &request),
        Err(AppError::InvalidInput(_))
    ));
}

#[test]
fn deleting_document_drops_its_rules() {
    let ctx = context(Some(StubGenerator::new(Ok(extraction_response()))));
    let result = document_service::ingest_document(&ctx, &ingest_request()).unwrap();
    document_service::delete_document(&ctx, &result.doc_id).unwrap();
    assert!(document_service::document_requirements(&ctx, &result.doc_id)
        .unwrap()
        .is_empty());
    assert!(matches!(
        document_service::get_document_text(&ctx, &result.doc_id),
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        document_service::delete_document(&ctx, &DocId::from("DOC-missing")),
        Err(AppError::NotFound(_))
    ));
}

#[test]
fn optimize_with_keywords_when_no_generator() {
    let ctx = context(None);
    let result = optimize_request(
        &ctx,
        &OptimizeRequest {
            model_id: regional(),
            request: "Maximize comfort but keep it on a budget".to_string(),
            intent: None,
        },
    )
    .unwrap();
    assert_eq!(result.intent.minimize, Some(Objective::Cost));
    assert!(result.option_ids.contains(&OptionId::from("302")));
    assert!(result.option_ids.contains(&OptionId::from("222")));
    // Groups without a comfort option take their cheapest choice.
    assert!(result.option_ids.contains(&OptionId::from("101")));
}

#[test]
fn optimize_uses_generator_intent() {
    let generator =
        StubGenerator::new(Ok(r#"{"maximize": ["Safety"], "minimize": null}"#.to_string()));
    let ctx = context(Some(generator));
    let result = optimize_request(
        &ctx,
        &OptimizeRequest {
            model_id: regional(),
            request: "safest truck possible".to_string(),
            intent: None,
        },
    )
    .unwrap();
    // Only groups offering a Safety option are touched.
    assert_eq!(result.option_ids.len(), 2);
    assert!(result.option_ids.contains(&OptionId::from("312")));
    assert!(result.option_ids.contains(&OptionId::from("142")));
}

#[test]
fn optimize_validates_input() {
    let ctx = context(None);
    let missing_text = OptimizeRequest {
        model_id: regional(),
        request: String::new(),
        intent: None,
    };
    assert!(matches!(
        optimize_request(&ctx, &missing_text),
        Err(AppError::InvalidInput(_))
    ));

    let unknown_model = OptimizeRequest {
        model_id: ModelId::from("MDL-NOPE"),
        request: String::new(),
        intent: Some(OptimizationIntent::default()),
    };
    assert!(matches!(
        optimize_request(&ctx, &unknown_model),
        Err(AppError::NotFound(_))
    ));
}

#[test]
fn health_reports_ok() {
    let status = health(&context(None));
    assert!(status.is_ok());
    assert_eq!(status.database.as_deref(), Some("connected"));
}

fn describe_request(history: &[&str], cost_delta: f64) -> DescribeRequest {
    DescribeRequest {
        model_name: "Regional Hauler".to_string(),
        model_id: None,
        selected_options: ids(&["102", "112"]),
        total_cost: 148_600.0,
        total_weight: 17_900.0,
        performance_summary: serde_json::json!({"Power": 8}),
        optimization_history: history.iter().map(|s| s.to_string()).collect(),
        manual_changes: vec!["Big Turbo".to_string()],
        cost_delta: Some(cost_delta),
        weight_delta: Some(110.0),
    }
}

#[test]
fn describe_returns_generated_text() {
    let generator = StubGenerator::new(Ok(
        "  A regional tractor tuned for power. Built to pull.\n".to_string(),
    ));
    let ctx = context(Some(generator.clone()));
    let result = describe_config(&ctx, &describe_request(&["maximize power"], 10_600.0)).unwrap();
    assert_eq!(
        result.description,
        "A regional tractor tuned for power. Built to pull."
    );
    assert!(result.generation_warning.is_none());

    let prompts = generator.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    // Found by name, since the request carries no model id.
    assert!(prompts[0].contains("Base description: Day cab for regional distribution\n"));
    assert!(prompts[0].contains("- Added $10,600 in upgrades\n- Added 110 lbs\n"));
    assert!(prompts[0].contains("- Manual additions: Big Turbo\n"));
}

#[test]
fn describe_falls_back_when_generator_fails() {
    let ctx = context(Some(StubGenerator::new(Err(AiError::Http { status: 503 }))));
    let result = describe_config(&ctx, &describe_request(&["maximize power"], -501.0)).unwrap();
    assert_eq!(
        result.description,
        "This Regional Hauler has been optimized for maximize power. Saved $501 from default."
    );
    assert!(result.generation_warning.is_some());
}

#[test]
fn describe_falls_back_on_empty_generation() {
    let ctx = context(Some(StubGenerator::new(Ok("   ".to_string()))));
    let result = describe_config(&ctx, &describe_request(&["minimize cost"], 500.0)).unwrap();
    assert_eq!(
        result.description,
        "This Regional Hauler has been optimized for minimize cost. Near-default cost."
    );
    assert!(result.generation_warning.is_some());
}

#[test]
fn describe_without_generator_states_total() {
    let ctx = context(None);
    let result = describe_config(&ctx, &describe_request(&[], 501.0)).unwrap();
    assert_eq!(
        result.description,
        "Custom Regional Hauler configuration. Total investment: $148,600."
    );
    assert_eq!(
        result.generation_warning.as_deref(),
        Some("text generation is not configured")
    );
}

#[test]
fn describe_requires_model_name() {
    let mut request = describe_request(&[], 0.0);
    request.model_name = "  ".to_string();
    assert!(matches!(
        describe_config(&context(None), &request),
        Err(AppError::InvalidInput(_))
    ));
}

#[test]
fn describe_selection_measures_against_defaults() {
    let ctx = context(None);
    let selected = ids(&["101", "112", "121", "131", "141", "201", "211", "221", "301", "311"]);
    let result = describe_service::describe_selection(
        &ctx,
        &regional(),
        selected,
        vec!["maximize power".to_string()],
    )
    .unwrap();
    assert_eq!(
        result.description,
        "This Regional Hauler has been optimized for maximize power. Added $800 in upgrades."
    );
}
