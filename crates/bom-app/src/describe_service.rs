//! Marketing descriptions of a finished configuration.
//!
//! The text generator writes the description when one is configured. Without
//! it, or when it fails, a fixed sentence built from the cost delta and the
//! latest optimization stands in and the result carries a warning.

use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use crate::report_service;
use bom_core::{ModelId, OptionId, to_lb};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

/// Cost delta, in dollars, beyond which a configuration counts as upgraded
/// or stripped down.
pub const COST_DELTA_THRESHOLD: f64 = 500.0;
/// Weight delta, in pounds, worth mentioning.
pub const WEIGHT_DELTA_THRESHOLD: f64 = 100.0;

const BASE_DESCRIPTION_CHARS: usize = 150;
const RECENT_MANUAL_CHANGES: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribeRequest {
    pub model_name: String,
    /// Looked up before the name when given.
    #[serde(default)]
    pub model_id: Option<ModelId>,
    #[serde(default)]
    pub selected_options: Vec<OptionId>,
    pub total_cost: f64,
    pub total_weight: f64,
    #[serde(default)]
    pub performance_summary: Value,
    /// Optimization requests applied so far, oldest first.
    #[serde(default)]
    pub optimization_history: Vec<String>,
    /// Options the user picked by hand, oldest first.
    #[serde(default)]
    pub manual_changes: Vec<String>,
    /// Against the model's default configuration.
    #[serde(default)]
    pub cost_delta: Option<f64>,
    #[serde(default)]
    pub weight_delta: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribeResult {
    pub description: String,
    /// Why the fixed fallback sentence was used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_warning: Option<String>,
}

/// Whole dollars or pounds with thousands separators.
fn grouped(value: f64) -> String {
    let whole = format!("{:.0}", value.abs());
    let mut out = String::with_capacity(whole.len() + whole.len() / 3 + 1);
    if value.round() < 0.0 {
        out.push('-');
    }
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(digit);
    }
    out
}

pub fn cost_summary(delta: f64) -> String {
    if delta > COST_DELTA_THRESHOLD {
        format!("Added ${} in upgrades", grouped(delta))
    } else if delta < -COST_DELTA_THRESHOLD {
        format!("Saved ${} from default", grouped(delta.abs()))
    } else {
        "Near-default cost".to_string()
    }
}

/// `None` while the weight stays within the threshold of the default.
pub fn weight_summary(delta: f64) -> Option<String> {
    if delta > WEIGHT_DELTA_THRESHOLD {
        Some(format!("Added {} lbs", grouped(delta)))
    } else if delta < -WEIGHT_DELTA_THRESHOLD {
        Some(format!("Saved {} lbs", grouped(delta.abs())))
    } else {
        None
    }
}

/// Description used when the text generator is absent or gives nothing.
pub fn fallback_description(request: &DescribeRequest) -> String {
    match request.optimization_history.last() {
        Some(last) => format!(
            "This {} has been optimized for {last}. {}.",
            request.model_name,
            cost_summary(request.cost_delta.unwrap_or_default())
        ),
        None => format!(
            "Custom {} configuration. Total investment: ${}.",
            request.model_name,
            grouped(request.total_cost)
        ),
    }
}

/// First part of the catalog description of the requested model. Lookup
/// failures only cost the prompt some context.
fn base_description(ctx: &AppContext, request: &DescribeRequest) -> String {
    let store = ctx.store();
    let found = match &request.model_id {
        Some(model_id) => store.get_model(model_id),
        None => {
            let wanted = request.model_name.trim().to_lowercase();
            store.list_models().map(|models| {
                models
                    .into_iter()
                    .find(|m| m.model_name.to_lowercase().contains(&wanted))
            })
        }
    };
    match found {
        Ok(Some(model)) => model.description.chars().take(BASE_DESCRIPTION_CHARS).collect(),
        Ok(None) => String::new(),
        Err(err) => {
            warn!(model = %request.model_name, error = %err, "model lookup failed");
            String::new()
        }
    }
}

pub fn build_describe_prompt(request: &DescribeRequest, base_description: &str) -> String {
    let mut prompt = format!(
        "Write a 2-sentence marketing description for this custom truck configuration.\n\n\
         BASE MODEL: {}\n",
        request.model_name
    );
    if !base_description.is_empty() {
        prompt.push_str(&format!("Base description: {base_description}\n"));
    }

    prompt.push_str("\nCONFIGURATION STRATEGY:\n");
    if request.optimization_history.is_empty() {
        prompt.push_str("- No AI optimizations applied\n");
    } else {
        prompt.push_str(&format!(
            "- AI optimizations applied: {}\n",
            request.optimization_history.join(", ")
        ));
    }
    if request.manual_changes.is_empty() {
        prompt.push_str("- No manual changes\n");
    } else {
        let skip = request
            .manual_changes
            .len()
            .saturating_sub(RECENT_MANUAL_CHANGES);
        prompt.push_str(&format!(
            "- Manual additions: {}\n",
            request.manual_changes[skip..].join(", ")
        ));
    }

    let weight = weight_summary(request.weight_delta.unwrap_or_default())
        .unwrap_or_else(|| "Standard weight".to_string());
    prompt.push_str(&format!(
        "\nKEY METRICS:\n- {}\n- {weight}\n- Total: ${} | {} lbs\n",
        cost_summary(request.cost_delta.unwrap_or_default()),
        grouped(request.total_cost),
        grouped(request.total_weight)
    ));

    prompt.push_str(
        "\nWRITING RULES:\n\
         1. First sentence: a short model intro and the main configuration strategy.\n\
         2. Second sentence: the key benefit or value for the buyer.\n\
         3. Plain prose, no bullet points or lists.\n\
         4. An optimization that also minimized cost reads as budget-friendly.\n\
         5. An optimization that maximized a category reads as an upgrade of it.\n\
         6. A weight minimization mentions the weight saved.\n\
         7. Mention notable manual additions briefly.\n\n\
         Write exactly 2 sentences.",
    );
    prompt
}

pub fn describe_config(ctx: &AppContext, request: &DescribeRequest) -> AppResult<DescribeResult> {
    let model_name = request.model_name.trim();
    if model_name.is_empty() {
        return Err(AppError::InvalidInput("modelName is required".to_string()));
    }

    let generated = match ctx.generator() {
        None => Err("text generation is not configured".to_string()),
        Some(generator) => {
            let prompt = build_describe_prompt(request, &base_description(ctx, request));
            match generator.complete(&prompt) {
                Ok(text) if text.trim().is_empty() => {
                    Err("text generation returned an empty description".to_string())
                }
                Ok(text) => Ok(text.trim().to_string()),
                Err(err) => {
                    warn!(model = model_name, error = %err, "description generation failed");
                    Err(err.to_string())
                }
            }
        }
    };

    let result = match generated {
        Ok(description) => DescribeResult {
            description,
            generation_warning: None,
        },
        Err(warning) => DescribeResult {
            description: fallback_description(request),
            generation_warning: Some(warning),
        },
    };
    info!(
        model = model_name,
        optimizations = request.optimization_history.len(),
        generated = result.generation_warning.is_none(),
        "described configuration"
    );
    Ok(result)
}

/// Describes `selected` on `model_id`, taking totals and deltas from the
/// configuration report against the model's defaults.
pub fn describe_selection(
    ctx: &AppContext,
    model_id: &ModelId,
    selected: Vec<OptionId>,
    optimization_history: Vec<String>,
) -> AppResult<DescribeResult> {
    let report = report_service::report(ctx, model_id, selected)?;
    let baseline = report_service::report(ctx, model_id, report.default_option_ids.clone())?;
    let totals = &report.totals;

    let request = DescribeRequest {
        model_name: report.model.model_name.clone(),
        model_id: Some(model_id.clone()),
        selected_options: report.selected_option_ids.clone(),
        total_cost: totals.total_cost,
        total_weight: to_lb(totals.total_weight),
        performance_summary: Value::Null,
        optimization_history,
        manual_changes: Vec::new(),
        cost_delta: Some(totals.total_cost - baseline.totals.total_cost),
        weight_delta: Some(to_lb(totals.total_weight) - to_lb(baseline.totals.total_weight)),
    };
    describe_config(ctx, &request)
}
