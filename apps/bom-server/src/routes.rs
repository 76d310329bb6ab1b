//! HTTP routes over the service layer. Every service call runs on the
//! blocking pool because the store and the text-generation client block.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use bom_app::{
    AppContext, AppError, AppResult, DescribeRequest, DescribeResult, HealthStatus, IngestRequest,
    IngestResult, OptimizeRequest, SaveConfigRequest, UpdateConfigRequest, catalog_service,
    config_service, describe_config, document_service, health, optimize_request,
    parse_option_list, report_service, validate_selection,
};
use bom_catalog::{EngineeringDoc, ModelOptionRow, SavedConfig, TruckModel};
use bom_core::{ConfigId, DocId, ModelId};
use bom_report::{ConfigurationReport, OptimizationResult};
use bom_validate::{ValidateRequest, ValidationReport};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::warn;

pub type SharedContext = Arc<AppContext>;

/// Service error rendered as `{"error": message}`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

pub fn status_for(err: &AppError) -> StatusCode {
    match err {
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        AppError::DataUnavailable(_) | AppError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            warn!(status = status.as_u16(), error = %self.0, "request failed");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

async fn blocking<T, F>(ctx: SharedContext, f: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&AppContext) -> AppResult<T> + Send + 'static,
{
    let result = tokio::task::spawn_blocking(move || f(ctx.as_ref()))
        .await
        .map_err(|e| ApiError(AppError::Io(std::io::Error::other(e))))?;
    Ok(Json(result?))
}

pub fn router(ctx: SharedContext) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/models", get(list_models))
        .route("/api/options", get(list_options))
        .route(
            "/api/configs",
            get(list_configs)
                .post(save_config)
                .put(update_config)
                .delete(delete_config_by_query),
        )
        .route(
            "/api/configs/:config_id",
            get(get_config).delete(delete_config_by_path),
        )
        .route("/api/validate", post(validate))
        .route("/api/report", get(report))
        .route(
            "/api/engineering-docs",
            get(list_documents)
                .post(upload_document)
                .delete(delete_document),
        )
        .route("/api/engineering-docs/view", get(view_document))
        .route("/api/optimize", post(optimize))
        .route("/api/describe", post(describe))
        .with_state(ctx)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelQuery {
    model_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigQuery {
    config_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    model_id: Option<String>,
    options: Option<String>,
    config_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocQuery {
    doc_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Saved {
    success: bool,
    config_id: ConfigId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Uploaded {
    success: bool,
    #[serde(flatten)]
    result: IngestResult,
}

fn required(value: Option<String>, name: &str) -> AppResult<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::InvalidInput(format!("{name} is required")))
}

pub async fn health_check(State(ctx): State<SharedContext>) -> (StatusCode, Json<HealthStatus>) {
    let status = match tokio::task::spawn_blocking(move || health(&ctx)).await {
        Ok(status) => status,
        Err(err) => HealthStatus {
            status: "error".to_string(),
            database: None,
            error: Some(err.to_string()),
        },
    };
    let code = if status.is_ok() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status))
}

pub async fn list_models(State(ctx): State<SharedContext>) -> ApiResult<Vec<TruckModel>> {
    blocking(ctx, catalog_service::list_models).await
}

pub async fn list_options(
    State(ctx): State<SharedContext>,
    Query(query): Query<ModelQuery>,
) -> ApiResult<Vec<ModelOptionRow>> {
    let model_id = query.model_id.filter(|m| !m.trim().is_empty()).map(ModelId::from);
    blocking(ctx, move |ctx| catalog_service::list_options(ctx, model_id.as_ref())).await
}

pub async fn list_configs(State(ctx): State<SharedContext>) -> ApiResult<Vec<SavedConfig>> {
    blocking(ctx, config_service::list_configs).await
}

pub async fn get_config(
    State(ctx): State<SharedContext>,
    Path(config_id): Path<String>,
) -> ApiResult<SavedConfig> {
    blocking(ctx, move |ctx| config_service::get_config(ctx, &ConfigId::from(config_id))).await
}

pub async fn save_config(
    State(ctx): State<SharedContext>,
    Json(request): Json<SaveConfigRequest>,
) -> ApiResult<Saved> {
    blocking(ctx, move |ctx| {
        let config_id = config_service::save_config(ctx, &request)?;
        Ok(Saved {
            success: true,
            config_id,
        })
    })
    .await
}

pub async fn update_config(
    State(ctx): State<SharedContext>,
    Json(request): Json<UpdateConfigRequest>,
) -> ApiResult<Value> {
    blocking(ctx, move |ctx| {
        config_service::update_config(ctx, &request)?;
        Ok(json!({ "success": true }))
    })
    .await
}

pub async fn delete_config_by_query(
    State(ctx): State<SharedContext>,
    Query(query): Query<ConfigQuery>,
) -> ApiResult<Value> {
    blocking(ctx, move |ctx| {
        let config_id = ConfigId::from(required(query.config_id, "configId")?);
        config_service::delete_config(ctx, &config_id)?;
        Ok(json!({ "success": true }))
    })
    .await
}

pub async fn delete_config_by_path(
    State(ctx): State<SharedContext>,
    Path(config_id): Path<String>,
) -> ApiResult<Value> {
    blocking(ctx, move |ctx| {
        config_service::delete_config(ctx, &ConfigId::from(config_id))?;
        Ok(json!({ "success": true }))
    })
    .await
}

pub async fn validate(
    State(ctx): State<SharedContext>,
    Json(request): Json<ValidateRequest>,
) -> ApiResult<ValidationReport> {
    blocking(ctx, move |ctx| validate_selection(ctx, &request)).await
}

pub async fn report(
    State(ctx): State<SharedContext>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<ConfigurationReport> {
    blocking(ctx, move |ctx| {
        if let Some(config_id) = query.config_id.filter(|c| !c.trim().is_empty()) {
            return report_service::report_for_config(ctx, &ConfigId::from(config_id));
        }
        let model_id = ModelId::from(required(query.model_id, "modelId")?);
        let selected = parse_option_list(query.options.as_deref().unwrap_or_default())?;
        report_service::report(ctx, &model_id, selected)
    })
    .await
}

pub async fn list_documents(State(ctx): State<SharedContext>) -> ApiResult<Vec<EngineeringDoc>> {
    blocking(ctx, document_service::list_documents).await
}

pub async fn upload_document(
    State(ctx): State<SharedContext>,
    Json(request): Json<IngestRequest>,
) -> ApiResult<Uploaded> {
    blocking(ctx, move |ctx| {
        let result = document_service::ingest_document(ctx, &request)?;
        Ok(Uploaded {
            success: true,
            result,
        })
    })
    .await
}

pub async fn delete_document(
    State(ctx): State<SharedContext>,
    Query(query): Query<DocQuery>,
) -> ApiResult<Value> {
    blocking(ctx, move |ctx| {
        let doc_id = DocId::from(required(query.doc_id, "docId")?);
        document_service::delete_document(ctx, &doc_id)?;
        Ok(json!({ "success": true }))
    })
    .await
}

pub async fn view_document(
    State(ctx): State<SharedContext>,
    Query(query): Query<DocQuery>,
) -> ApiResult<Value> {
    blocking(ctx, move |ctx| {
        let doc_id = DocId::from(required(query.doc_id, "docId")?);
        let (document, text) = document_service::get_document_text(ctx, &doc_id)?;
        let requirements = document_service::document_requirements(ctx, &doc_id)?;
        Ok(json!({
            "document": document,
            "text": text,
            "requirements": requirements,
        }))
    })
    .await
}

pub async fn optimize(
    State(ctx): State<SharedContext>,
    Json(request): Json<OptimizeRequest>,
) -> ApiResult<OptimizationResult> {
    blocking(ctx, move |ctx| optimize_request(ctx, &request)).await
}

pub async fn describe(
    State(ctx): State<SharedContext>,
    Json(request): Json<DescribeRequest>,
) -> ApiResult<DescribeResult> {
    blocking(ctx, move |ctx| describe_config(ctx, &request)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use bom_app::AppConfig;
    use bom_core::OptionId;
    use bom_store::MemoryStore;

    fn ctx() -> SharedContext {
        let seed =
            std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../data/catalog.yaml");
        let catalog = bom_catalog::load_path(&seed).unwrap();
        let store = MemoryStore::new(catalog).unwrap();
        Arc::new(AppContext::new(Arc::new(store), None, AppConfig::default()))
    }

    #[test]
    fn error_categories_map_to_statuses() {
        assert_eq!(status_for(&AppError::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status_for(&AppError::InvalidInput("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(&AppError::DataUnavailable("x".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(status_for(&AppError::Store("x".into())), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            status_for(&AppError::Ai("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn health_is_ok_over_memory_store() {
        let (code, Json(status)) = health_check(State(ctx())).await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(status.status, "ok");
    }

    #[tokio::test]
    async fn validate_returns_fix_plan() {
        let request = ValidateRequest {
            selected_option_ids: vec![OptionId::from("103"), OptionId::from("111")],
            model_id: ModelId::from("MDL-LONGHAUL"),
        };
        let Json(report) = validate(State(ctx()), Json(request)).await.unwrap();
        assert!(!report.is_valid);
        assert_eq!(report.fix_plan.unwrap().add, vec![OptionId::from("112")]);
    }

    #[tokio::test]
    async fn report_accepts_comma_separated_options() {
        let query = ReportQuery {
            model_id: Some("MDL-REGIONAL".to_string()),
            options: Some("102,112".to_string()),
            config_id: None,
        };
        let Json(report) = report(State(ctx()), Query(query)).await.unwrap();
        assert_eq!(report.selected_option_ids.len(), 2);
    }

    #[tokio::test]
    async fn report_without_model_is_bad_request() {
        let err = report(State(ctx()), Query(ReportQuery::default()))
            .await
            .unwrap_err();
        assert_eq!(status_for(&err.0), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn deleting_unknown_config_is_not_found() {
        let err = delete_config_by_path(State(ctx()), Path("CFG-404".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn saved_config_round_trips_through_routes() {
        let ctx = ctx();
        let request: SaveConfigRequest = serde_json::from_value(json!({
            "configName": "Route test",
            "modelId": "MDL-REGIONAL",
            "selectedOptions": ["102"],
            "totalCost": 147800.0,
            "totalWeight": 17950.0
        }))
        .unwrap();
        let Json(saved) = save_config(State(ctx.clone()), Json(request)).await.unwrap();
        assert!(saved.success);

        let Json(configs) = list_configs(State(ctx.clone())).await.unwrap();
        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0].config_id, saved.config_id);
    }

    #[tokio::test]
    async fn describe_without_generator_uses_fallback() {
        let request: DescribeRequest = serde_json::from_value(json!({
            "modelName": "Long Haul Sleeper",
            "selectedOptions": ["103"],
            "totalCost": 190000.0,
            "totalWeight": 19500.0,
            "optimizationHistory": ["maximize power"],
            "costDelta": 18000.0
        }))
        .unwrap();
        let Json(result) = describe(State(ctx()), Json(request)).await.unwrap();
        assert_eq!(
            result.description,
            "This Long Haul Sleeper has been optimized for maximize power. \
             Added $18,000 in upgrades."
        );
        assert!(result.generation_warning.is_some());
    }

    #[tokio::test]
    async fn describe_without_model_name_is_bad_request() {
        let request: DescribeRequest = serde_json::from_value(json!({
            "modelName": "",
            "totalCost": 0.0,
            "totalWeight": 0.0
        }))
        .unwrap();
        let err = describe(State(ctx()), Json(request)).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
