use bom_app::{
    AppConfig, AppContext, AppError, AppResult, IngestProgressEvent, IngestRequest, IngestStage,
    OptimizeRequest, SaveConfigRequest, UpdateConfigRequest, catalog_service, config_service,
    describe_service, document_service, health, init_database, open_store, optimize_request,
    report_service, validate_selection,
};
use bom_core::{ConfigId, DocId, ModelId, OptionId, to_lb};
use bom_report::{ConfigurationReport, ItemStatus};
use bom_validate::{ValidateRequest, ValidationReport};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bom-cli")]
#[command(
    about = "Truck configurator CLI for BOM validation, reports and engineering documents",
    long_about = None
)]
struct Cli {
    /// YAML config file (environment variables still override it)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or refresh the database from a catalog seed file
    Init {
        /// Seed file (defaults to the configured seed_path)
        seed: Option<PathBuf>,
    },
    /// List truck models
    Models,
    /// List options available to a model (all models when omitted)
    Options {
        model_id: Option<String>,
    },
    /// Validate a selection against stored requirements
    Validate {
        model_id: String,
        /// Selected option ids
        option_ids: Vec<String>,
    },
    /// Build the BOM report for a model selection or a saved configuration
    Report {
        /// Model id (ignored with --config-id)
        model_id: Option<String>,
        /// Selected option ids
        option_ids: Vec<String>,
        #[arg(long)]
        config_id: Option<String>,
    },
    /// Manage saved configurations
    #[command(subcommand)]
    Configs(ConfigCommands),
    /// Manage engineering documents
    #[command(subcommand)]
    Docs(DocCommands),
    /// Pick one option per component group from a natural-language request
    Optimize {
        model_id: String,
        /// e.g. "maximize safety while minimizing cost"
        request: String,
    },
    /// Write a short marketing description of a selection
    Describe {
        model_id: String,
        /// Selected option ids (model defaults when omitted)
        option_ids: Vec<String>,
        /// Optimization requests already applied, oldest first
        #[arg(long = "optimized-for")]
        history: Vec<String>,
    },
    /// Check database connectivity
    Health,
}

#[derive(Subcommand)]
enum ConfigCommands {
    List,
    Show {
        config_id: String,
    },
    /// Save a selection; totals come from the model report
    Save {
        name: String,
        model_id: String,
        option_ids: Vec<String>,
        #[arg(long, default_value = "")]
        notes: String,
    },
    Rename {
        config_id: String,
        name: String,
        #[arg(long, default_value = "")]
        notes: String,
    },
    Delete {
        config_id: String,
    },
}

#[derive(Subcommand)]
enum DocCommands {
    /// Store a text document and extract its requirements
    Ingest {
        /// Plain-text document body
        file: PathBuf,
        /// Title (defaults to the file name)
        #[arg(long)]
        title: Option<String>,
        /// Option ids the document's requirements apply to
        #[arg(long = "link")]
        links: Vec<String>,
    },
    List,
    Show {
        doc_id: String,
    },
    Delete {
        doc_id: String,
    },
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;
    let json = cli.json;

    let ctx = AppContext::open(config)?;
    run(&ctx, cli.command, json)
}

fn run(ctx: &AppContext, command: Commands, json: bool) -> AppResult<()> {
    match command {
        Commands::Init { seed } => {
            let config = ctx.config();
            cmd_init(config, seed.as_deref().unwrap_or(config.seed_path.as_path()))
        }
        Commands::Models => cmd_models(ctx, json),
        Commands::Options { model_id } => cmd_options(ctx, model_id.map(ModelId::from), json),
        Commands::Validate {
            model_id,
            option_ids,
        } => cmd_validate(ctx, ModelId::from(model_id), to_ids(option_ids), json),
        Commands::Report {
            model_id,
            option_ids,
            config_id,
        } => cmd_report(ctx, model_id, option_ids, config_id, json),
        Commands::Configs(sub) => cmd_configs(ctx, sub, json),
        Commands::Docs(sub) => cmd_docs(ctx, sub, json),
        Commands::Optimize { model_id, request } => cmd_optimize(ctx, model_id, request, json),
        Commands::Describe {
            model_id,
            option_ids,
            history,
        } => cmd_describe(ctx, ModelId::from(model_id), to_ids(option_ids), history, json),
        Commands::Health => cmd_health(ctx, json),
    }
}

fn to_ids(raw: Vec<String>) -> Vec<OptionId> {
    raw.into_iter().map(OptionId::from).collect()
}

fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    let text = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
    println!("{text}");
    Ok(())
}

fn cmd_init(config: &AppConfig, seed: &Path) -> AppResult<()> {
    println!("Importing catalog: {}", seed.display());
    let store = open_store(config)?;
    let summary = init_database(&store, seed)?;
    println!(
        "✓ {} models, {} options, {} availability rows, {} requirements",
        summary.models, summary.options, summary.model_options, summary.requirements
    );
    Ok(())
}

fn cmd_models(ctx: &AppContext, json: bool) -> AppResult<()> {
    let models = catalog_service::list_models(ctx)?;
    if json {
        return print_json(&models);
    }
    if models.is_empty() {
        println!("No models found (run `bom-cli init` first)");
    }
    for model in models {
        println!(
            "  {} - {} (${:.0}, {:.0} lb, {})",
            model.model_id,
            model.model_name,
            model.base_msrp,
            model.base_weight_lb,
            model.model_tier
        );
    }
    Ok(())
}

fn cmd_options(ctx: &AppContext, model_id: Option<ModelId>, json: bool) -> AppResult<()> {
    let rows = catalog_service::list_options(ctx, model_id.as_ref())?;
    if json {
        return print_json(&rows);
    }
    let mut current_group = String::new();
    for row in rows {
        let option = &row.option;
        let heading = format!(
            "{} / {} / {}",
            option.system, option.subsystem, option.component_group
        );
        if heading != current_group {
            println!("{heading}");
            current_group = heading;
        }
        println!(
            "  {}{} {} ${:.0} {:.0} lb [{} {}]",
            if row.is_default { "*" } else { " " },
            option.option_id,
            option.option_name,
            option.cost_usd,
            option.weight_lb,
            option.performance_category,
            option.performance_score
        );
    }
    Ok(())
}

fn cmd_validate(
    ctx: &AppContext,
    model_id: ModelId,
    selected_option_ids: Vec<OptionId>,
    json: bool,
) -> AppResult<()> {
    let report = validate_selection(
        ctx,
        &ValidateRequest {
            selected_option_ids,
            model_id,
        },
    )?;
    if json {
        return print_json(&report);
    }
    print_validation(&report);
    Ok(())
}

fn print_validation(report: &ValidationReport) {
    if report.is_valid {
        println!("✓ Configuration is valid");
        return;
    }
    println!("✗ {} issue(s)", report.issues.len());
    for issue in &report.issues {
        println!(
            "  {} [{}] ({})",
            issue.option_name, issue.component_group, issue.source_doc
        );
        for mismatch in &issue.spec_mismatches {
            println!("    - {}: {}", mismatch.spec_name, mismatch.reason);
        }
    }
    match &report.fix_plan {
        Some(plan) => {
            println!("Fix plan:");
            for (remove, add) in plan.remove.iter().zip(&plan.add) {
                println!("  replace {remove} with {add}");
            }
        }
        None => println!("No compliant replacement found"),
    }
}

fn cmd_report(
    ctx: &AppContext,
    model_id: Option<String>,
    option_ids: Vec<String>,
    config_id: Option<String>,
    json: bool,
) -> AppResult<()> {
    let report = match (config_id, model_id) {
        (Some(config_id), _) => report_service::report_for_config(ctx, &ConfigId::from(config_id))?,
        (None, Some(model_id)) => {
            report_service::report(ctx, &ModelId::from(model_id), to_ids(option_ids))?
        }
        (None, None) => {
            return Err(AppError::InvalidInput(
                "a model id or --config-id is required".to_string(),
            ));
        }
    };
    if json {
        return print_json(&report);
    }
    print_report(&report);
    Ok(())
}

fn print_report(report: &ConfigurationReport) {
    println!("{} ({})", report.model.model_name, report.model.model_id);
    for system in &report.bom_hierarchy {
        println!(
            "{}  ${:.0}  {:.0} lb",
            system.name,
            system.total_cost,
            to_lb(system.total_weight)
        );
        for subsystem in &system.subsystems {
            println!("  {}", subsystem.name);
            for group in &subsystem.component_groups {
                let Some(item) = &group.selected_item else {
                    continue;
                };
                let marker = match item.status {
                    ItemStatus::Upgraded => "↑",
                    ItemStatus::Downgraded => "↓",
                    ItemStatus::Default | ItemStatus::Base => " ",
                };
                println!(
                    "    {marker} {}: {} (${:.0})",
                    group.name, item.option_name, item.cost
                );
            }
        }
    }
    let totals = &report.totals;
    println!(
        "Total: ${:.0} (options ${:.0}), {:.0} lb",
        totals.total_cost,
        totals.options_cost,
        to_lb(totals.total_weight)
    );
}

fn cmd_configs(ctx: &AppContext, command: ConfigCommands, json: bool) -> AppResult<()> {
    match command {
        ConfigCommands::List => {
            let configs = config_service::list_configs(ctx)?;
            if json {
                return print_json(&configs);
            }
            for config in configs {
                println!(
                    "  {} - {} ({}, {} options, ${:.0}){}",
                    config.config_id,
                    config.config_name,
                    config.model_id,
                    config.config_options.len(),
                    config.total_cost_usd,
                    if config.is_validated { " ✓" } else { "" }
                );
            }
        }
        ConfigCommands::Show { config_id } => {
            let config = config_service::get_config(ctx, &ConfigId::from(config_id))?;
            print_json(&config)?;
        }
        ConfigCommands::Save {
            name,
            model_id,
            option_ids,
            notes,
        } => {
            let model_id = ModelId::from(model_id);
            let selected = to_ids(option_ids);
            let report = report_service::report(ctx, &model_id, selected.clone())?;
            let validation = validate_selection(
                ctx,
                &ValidateRequest {
                    selected_option_ids: selected.clone(),
                    model_id: model_id.clone(),
                },
            )?;
            let config_id = config_service::save_config(
                ctx,
                &SaveConfigRequest {
                    config_name: name,
                    model_id,
                    selected_options: selected,
                    total_cost: report.totals.total_cost,
                    total_weight: to_lb(report.totals.total_weight),
                    performance_summary: serde_json::Value::Null,
                    notes,
                    is_validated: validation.is_valid,
                },
            )?;
            if json {
                return print_json(&serde_json::json!({ "success": true, "configId": config_id }));
            }
            println!("✓ Saved {config_id}");
        }
        ConfigCommands::Rename {
            config_id,
            name,
            notes,
        } => {
            config_service::update_config(
                ctx,
                &UpdateConfigRequest {
                    config_id: ConfigId::from(config_id),
                    config_name: name,
                    notes,
                },
            )?;
            println!("✓ Updated");
        }
        ConfigCommands::Delete { config_id } => {
            config_service::delete_config(ctx, &ConfigId::from(config_id))?;
            println!("✓ Deleted");
        }
    }
    Ok(())
}

fn cmd_docs(ctx: &AppContext, command: DocCommands, json: bool) -> AppResult<()> {
    match command {
        DocCommands::Ingest { file, title, links } => {
            let text = std::fs::read_to_string(&file)?;
            let title = title.unwrap_or_else(|| {
                file.file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| file.display().to_string())
            });
            let request = IngestRequest {
                title,
                text,
                linked_option_ids: to_ids(links),
            };
            let result = document_service::ingest_document_with_progress(
                ctx,
                &request,
                Some(&mut |event: IngestProgressEvent| render_progress(&event)),
            )?;
            if json {
                return print_json(&result);
            }
            println!(
                "✓ {} - {} chunks, {} requirements",
                result.doc_id, result.chunk_count, result.rules_created
            );
            if let Some(warning) = &result.extraction_warning {
                println!("  extraction: {warning}");
            }
        }
        DocCommands::List => {
            let docs = document_service::list_documents(ctx)?;
            if json {
                return print_json(&docs);
            }
            for doc in docs {
                println!(
                    "  {} - {} ({} chunks, {} rules)",
                    doc.doc_id, doc.doc_title, doc.chunk_count, doc.rule_count
                );
            }
        }
        DocCommands::Show { doc_id } => {
            let doc_id = DocId::from(doc_id);
            let (doc, text) = document_service::get_document_text(ctx, &doc_id)?;
            let requirements = document_service::document_requirements(ctx, &doc_id)?;
            if json {
                return print_json(&serde_json::json!({
                    "document": doc,
                    "text": text,
                    "requirements": requirements,
                }));
            }
            println!("{} ({})", doc.doc_title, doc.doc_id);
            for req in &requirements {
                let min = req.min_value.map(|v| format!(">= {v}")).unwrap_or_default();
                let max = req.max_value.map(|v| format!("<= {v}")).unwrap_or_default();
                println!(
                    "  #{} {}.{} {} {} {}",
                    req.rule_id, req.component_group, req.spec_name, min, max, req.unit
                );
            }
            println!();
            println!("{text}");
        }
        DocCommands::Delete { doc_id } => {
            document_service::delete_document(ctx, &DocId::from(doc_id))?;
            println!("✓ Deleted");
        }
    }
    Ok(())
}

fn render_progress(event: &IngestProgressEvent) {
    let label = match event.stage {
        IngestStage::Storing => "storing",
        IngestStage::Chunking => "chunking",
        IngestStage::Extracting => "extracting",
        IngestStage::SavingRules => "saving rules",
        IngestStage::Completed => "done",
    };
    let mut err = io::stderr();
    let _ = writeln!(
        err,
        "[{:>6.2}s] {label}{}",
        event.elapsed_wall_s,
        event
            .message
            .as_deref()
            .map(|m| format!(": {m}"))
            .unwrap_or_default()
    );
}

fn cmd_optimize(ctx: &AppContext, model_id: String, request: String, json: bool) -> AppResult<()> {
    let result = optimize_request(
        ctx,
        &OptimizeRequest {
            model_id: ModelId::from(model_id),
            request,
            intent: None,
        },
    )?;
    if json {
        return print_json(&result);
    }
    println!("{}", result.summary);
    for rec in &result.recommendations {
        println!(
            "  {}: {} ({}) - {}",
            rec.component_group, rec.option_name, rec.option_id, rec.reason
        );
    }
    println!(
        "Total: ${:.0}, {:.0} lb",
        result.total_cost,
        to_lb(result.total_weight)
    );
    Ok(())
}

fn cmd_describe(
    ctx: &AppContext,
    model_id: ModelId,
    mut selected: Vec<OptionId>,
    history: Vec<String>,
    json: bool,
) -> AppResult<()> {
    if selected.is_empty() {
        selected = report_service::report(ctx, &model_id, Vec::new())?.default_option_ids;
    }
    let result = describe_service::describe_selection(ctx, &model_id, selected, history)?;
    if json {
        return print_json(&result);
    }
    println!("{}", result.description);
    if let Some(warning) = &result.generation_warning {
        eprintln!("(fallback description: {warning})");
    }
    Ok(())
}

fn cmd_health(ctx: &AppContext, json: bool) -> AppResult<()> {
    let status = health(ctx);
    if json {
        return print_json(&status);
    }
    match &status.error {
        None => println!("✓ ok (database {})", status.database.as_deref().unwrap_or("connected")),
        Some(err) => println!("✗ {err}"),
    }
    Ok(())
}
