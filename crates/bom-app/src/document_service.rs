//! Engineering document ingest and management.

use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use crate::progress::{IngestProgressEvent, IngestStage};
use bom_ai::{build_extraction_prompt, chunk_text, extraction_text, parse_requirements};
use bom_catalog::{EngineeringDoc, Requirement, RequirementDef};
use bom_core::{DocId, OptionId};
use bom_store::document_id;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestRequest {
    pub title: String,
    pub text: String,
    #[serde(default)]
    pub linked_option_ids: Vec<OptionId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResult {
    pub doc_id: DocId,
    pub doc_title: String,
    pub chunk_count: usize,
    pub linked_option_ids: Vec<OptionId>,
    pub rules_created: usize,
    /// Why extraction produced nothing, when it failed or was skipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extraction_warning: Option<String>,
}

fn emit_progress(
    progress_cb: &mut Option<&mut dyn FnMut(IngestProgressEvent)>,
    stage: IngestStage,
    started: Instant,
    message: Option<String>,
) {
    if let Some(cb) = progress_cb.as_deref_mut() {
        cb(IngestProgressEvent::stage(
            stage,
            started.elapsed().as_secs_f64(),
            message,
        ));
    }
}

pub fn ingest_document(ctx: &AppContext, request: &IngestRequest) -> AppResult<IngestResult> {
    ingest_document_with_progress(ctx, request, None)
}

/// Stores a document as chunks and extracts requirements from its leading
/// chunks. Extraction problems are reported in the result, never as an error.
pub fn ingest_document_with_progress(
    ctx: &AppContext,
    request: &IngestRequest,
    mut progress_cb: Option<&mut dyn FnMut(IngestProgressEvent)>,
) -> AppResult<IngestResult> {
    let started = Instant::now();
    let title = request.title.trim();
    if title.is_empty() {
        return Err(AppError::InvalidInput("document title is required".to_string()));
    }
    if request.text.trim().is_empty() {
        return Err(AppError::InvalidInput("document text is empty".to_string()));
    }

    let store = ctx.store();
    let settings = &ctx.config().documents;
    let doc_id = document_id(title, &request.text);

    emit_progress(
        &mut progress_cb,
        IngestStage::Storing,
        started,
        Some(format!("'{title}' as {doc_id}")),
    );

    let chunks = chunk_text(&request.text, settings.chunk_size, settings.chunk_overlap);
    emit_progress(
        &mut progress_cb,
        IngestStage::Chunking,
        started,
        Some(format!("{} chunks", chunks.len())),
    );

    emit_progress(&mut progress_cb, IngestStage::Extracting, started, None);
    let (extracted, extraction_warning) = match ctx.generator() {
        None => (
            Vec::new(),
            Some("text generation is not configured".to_string()),
        ),
        Some(generator) => {
            let groups = store.group_spec_names()?;
            let text = extraction_text(&chunks, settings.extract_chunks, settings.extract_chars);
            let prompt = build_extraction_prompt(title, &text, &groups);
            match generator.complete(&prompt) {
                Ok(response) => (parse_requirements(&response), None),
                Err(err) => {
                    warn!(doc_id = %doc_id, error = %err, "requirement extraction failed");
                    (Vec::new(), Some(err.to_string()))
                }
            }
        }
    };

    emit_progress(
        &mut progress_cb,
        IngestStage::SavingRules,
        started,
        Some(format!(
            "{} chunks and {} requirements",
            chunks.len(),
            extracted.len()
        )),
    );
    let linked = request.linked_option_ids.first();
    let requirements: Vec<RequirementDef> = extracted
        .into_iter()
        .map(|requirement| requirement.into_def(&doc_id, title, linked))
        .collect();
    let doc = EngineeringDoc {
        doc_id: doc_id.clone(),
        doc_title: title.to_string(),
        linked_option_ids: request.linked_option_ids.clone(),
        created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        chunk_count: chunks.len(),
        rule_count: requirements.len(),
    };
    // Document, chunks and rules land together or not at all.
    if store.save_document(&doc, &chunks, &requirements)? {
        info!(doc_id = %doc_id, "replaced previously ingested document");
    }
    let rules_created = requirements.len();

    info!(
        doc_id = %doc_id,
        chunks = chunks.len(),
        rules = rules_created,
        "ingested engineering document"
    );
    emit_progress(&mut progress_cb, IngestStage::Completed, started, None);

    Ok(IngestResult {
        doc_id,
        doc_title: title.to_string(),
        chunk_count: chunks.len(),
        linked_option_ids: request.linked_option_ids.clone(),
        rules_created,
        extraction_warning,
    })
}

/// Headers with chunk and rule counts, newest first.
pub fn list_documents(ctx: &AppContext) -> AppResult<Vec<EngineeringDoc>> {
    Ok(ctx.store().list_documents()?)
}

/// Full text reassembled from chunks, joined by newlines.
pub fn get_document_text(ctx: &AppContext, doc_id: &DocId) -> AppResult<(EngineeringDoc, String)> {
    let store = ctx.store();
    let doc = store
        .get_document(doc_id)?
        .ok_or_else(|| AppError::NotFound(format!("Document not found: {doc_id}")))?;
    let text = store.document_chunks(doc_id)?.join("\n");
    Ok((doc, text))
}

pub fn document_requirements(ctx: &AppContext, doc_id: &DocId) -> AppResult<Vec<Requirement>> {
    Ok(ctx.store().requirements_for_document(doc_id)?)
}

/// Removes the document, its chunks and its requirements.
pub fn delete_document(ctx: &AppContext, doc_id: &DocId) -> AppResult<()> {
    if !ctx.store().delete_document(doc_id)? {
        return Err(AppError::NotFound(format!("Document not found: {doc_id}")));
    }
    info!(doc_id = %doc_id, "deleted engineering document");
    Ok(())
}
