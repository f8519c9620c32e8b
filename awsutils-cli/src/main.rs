mod manifest;
mod state;

use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use awsutils_core::differ::create_plan;
use awsutils_core::effect::Effect;
use awsutils_core::interpreter::{ApplyResult, EffectOutcome, Interpreter, InterpreterConfig};
use awsutils_core::plan::Plan;
use awsutils_core::provider::{Provider, ResourceKind};
use awsutils_core::resource::{Resource, State, Value, attributes_to_json};
use awsutils_core::schema::{AttributeSchema, ResourceSchema};
use awsutils_provider::config::provider_schema;
use awsutils_provider::{AwsUtilsProvider, ProcessEnvironment, ProviderConfig};
use clap::{Parser, Subcommand};
use colored::Colorize;

use crate::manifest::Manifest;
use crate::state::StateFile;

const DEFAULT_MANIFEST: &str = "awsutils.json";

#[derive(Parser)]
#[command(name = "awsutils")]
#[command(about = "AWS utility resources: plan and apply awsutils manifests", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging (also enabled when TF_LOG is set)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the provider schema, or the schema of one resource or data source
    Schema {
        /// Resource or data source type (e.g., awsutils_default_vpc_deletion)
        type_name: Option<String>,
    },

    /// Print the effective service endpoint overrides
    Endpoints {
        #[arg(default_value = DEFAULT_MANIFEST)]
        manifest: PathBuf,
    },

    /// Validate the provider configuration and every block in a manifest
    Validate {
        #[arg(default_value = DEFAULT_MANIFEST)]
        manifest: PathBuf,
    },

    /// Show the changes needed to converge
    Plan {
        #[arg(default_value = DEFAULT_MANIFEST)]
        manifest: PathBuf,
    },

    /// Apply the changes and record the result in the state file
    Apply {
        #[arg(default_value = DEFAULT_MANIFEST)]
        manifest: PathBuf,

        /// Skip interactive approval
        #[arg(long)]
        auto_approve: bool,
    },

    /// Delete every resource recorded in the state file
    Destroy {
        #[arg(default_value = DEFAULT_MANIFEST)]
        manifest: PathBuf,

        /// Skip interactive approval
        #[arg(long)]
        auto_approve: bool,
    },

    /// Read every data source and print its attributes as JSON
    Data {
        #[arg(default_value = DEFAULT_MANIFEST)]
        manifest: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let result = match cli.command {
        Commands::Schema { type_name } => run_schema(type_name.as_deref()),
        Commands::Endpoints { manifest } => run_endpoints(&manifest),
        Commands::Validate { manifest } => run_validate(&manifest),
        Commands::Plan { manifest } => run_plan(&manifest).await,
        Commands::Apply {
            manifest,
            auto_approve,
        } => run_apply(&manifest, auto_approve).await,
        Commands::Destroy {
            manifest,
            auto_approve,
        } => run_destroy(&manifest, auto_approve).await,
        Commands::Data { manifest } => run_data(&manifest).await,
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(debug: bool) {
    let debug = debug || std::env::var_os("TF_LOG").is_some_and(|v| !v.is_empty());
    let default_filter = if debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn load_manifest(path: &Path) -> Result<Manifest, String> {
    Manifest::load(path).map_err(|e| e.to_string())
}

async fn connect(manifest: &Manifest) -> Result<AwsUtilsProvider, String> {
    awsutils_provider::configure(&manifest.provider_attributes(), &ProcessEnvironment)
        .await
        .map_err(|e| format!("Invalid provider configuration:\n{}", e))
}

fn schemas(provider: &impl Provider) -> HashMap<String, ResourceSchema> {
    provider
        .resource_types()
        .iter()
        .map(|t| (t.name().to_string(), t.schema()))
        .collect()
}

fn run_schema(type_name: Option<&str>) -> Result<(), String> {
    let schema = match type_name {
        None => provider_schema(),
        Some(name) => AwsUtilsProvider::unconfigured()
            .schema_for(name)
            .ok_or_else(|| format!("Unknown resource or data source type: {}", name))?,
    };
    print_schema(&schema);
    Ok(())
}

fn print_schema(schema: &ResourceSchema) {
    println!("{}", schema.resource_type.bold());
    if let Some(description) = &schema.description {
        println!("{}", description);
    }
    println!();

    for attr in schema.sorted_attributes() {
        println!(
            "  {} ({}){}",
            attr.name.cyan(),
            attr.attr_type,
            attribute_flags(attr).dimmed()
        );
        if let Some(description) = &attr.description {
            println!("      {}", description);
        }
        if let Some(message) = &attr.deprecated {
            println!("      {} {}", "Deprecated:".yellow(), message);
        }
    }
}

fn attribute_flags(attr: &AttributeSchema) -> String {
    let mut flags = Vec::new();
    if attr.required {
        flags.push("required".to_string());
    }
    if attr.computed {
        flags.push("computed".to_string());
    }
    if attr.force_new {
        flags.push("forces replacement".to_string());
    }
    if attr.sensitive {
        flags.push("sensitive".to_string());
    }
    if let Some(default) = &attr.default {
        flags.push(format!("default {}", default.to_json()));
    }
    if !attr.conflicts_with.is_empty() {
        flags.push(format!("conflicts with {}", attr.conflicts_with.join(", ")));
    }

    if flags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", flags.join(", "))
    }
}

fn run_endpoints(path: &Path) -> Result<(), String> {
    let manifest = load_manifest(path)?;
    let config =
        ProviderConfig::from_attributes(&manifest.provider_attributes(), &ProcessEnvironment)
            .map_err(|e| format!("Invalid provider configuration:\n{}", e))?;

    if config.endpoints.is_empty() {
        println!("No endpoint overrides.");
        return Ok(());
    }
    for (service, url) in &config.endpoints {
        println!("  {} = {}", service.cyan(), url);
    }
    Ok(())
}

fn run_validate(path: &Path) -> Result<(), String> {
    println!("{}", "Validating...".cyan());
    let manifest = load_manifest(path)?;

    let mut errors = Vec::new();
    let provider_attributes = manifest.provider_attributes();
    if let Err(e) = ProviderConfig::from_attributes(&provider_attributes, &ProcessEnvironment) {
        errors.extend(e.errors().iter().map(|e| format!("provider: {}", e)));
    }

    let provider = AwsUtilsProvider::unconfigured();
    let blocks: Vec<Resource> = manifest
        .resources()
        .into_iter()
        .chain(manifest.data_sources())
        .collect();
    for resource in &blocks {
        errors.extend(validate_block(&provider, resource));
    }

    if !errors.is_empty() {
        for error in &errors {
            eprintln!("  {} {}", "✗".red(), error);
        }
        return Err(format!("{} validation error(s)", errors.len()));
    }

    println!(
        "{}",
        format!("✓ {} blocks validated successfully.", blocks.len())
            .green()
            .bold()
    );
    Ok(())
}

fn validate_block(provider: &impl Provider, resource: &Resource) -> Vec<String> {
    let expected = if resource.is_data_source() {
        ResourceKind::DataSource
    } else {
        ResourceKind::Resource
    };

    let types = provider.resource_types();
    let Some(resource_type) = types.iter().find(|t| t.name() == resource.id.resource_type) else {
        return vec![format!("{}: unknown type", resource.id)];
    };
    if resource_type.kind() != expected {
        let listed = match expected {
            ResourceKind::Resource => "resources",
            ResourceKind::DataSource => "data",
        };
        return vec![format!("{}: not allowed in \"{}\"", resource.id, listed)];
    }

    match resource_type.schema().validate(&resource.attributes) {
        Ok(()) => Vec::new(),
        Err(errors) => errors
            .iter()
            .map(|e| format!("{}: {}", resource.id, e))
            .collect(),
    }
}

/// Re-read every recorded resource; those gone remotely are dropped from `state`
async fn refresh(provider: &impl Provider, state: &mut StateFile) -> Result<Vec<State>, String> {
    let mut current = Vec::new();
    for recorded in state.states() {
        let refreshed = provider.read(&recorded).await.map_err(|e| e.to_string())?;
        if !refreshed.exists {
            log::info!("{} no longer exists, removing from state", recorded.id);
        }
        state.record(&refreshed);
        if refreshed.exists {
            current.push(refreshed);
        }
    }
    Ok(current)
}

fn build_plan(provider: &impl Provider, manifest: &Manifest, current: &[State]) -> Plan {
    let desired: Vec<Resource> = manifest
        .resources()
        .into_iter()
        .chain(manifest.data_sources())
        .collect();
    create_plan(&desired, current, &schemas(provider))
}

fn print_plan(plan: &Plan, schemas: &HashMap<String, ResourceSchema>) {
    if plan.mutation_count() == 0 {
        println!("{}", "No changes. Infrastructure is up-to-date.".green());
        return;
    }

    println!("Execution plan:");
    println!();
    for effect in plan.effects().iter().filter(|e| e.is_mutating()) {
        println!("{}", format_effect(effect));
        let schema = schemas.get(&effect.resource_id().resource_type);
        for line in effect_details(effect, schema) {
            println!("      {}", line);
        }
    }
    println!();
    println!("{}", plan.summary().to_string().bold());
}

fn format_effect(effect: &Effect) -> String {
    let id = effect.resource_id();
    match effect {
        Effect::Read { .. } => format!("  {} {}", "<=".cyan(), id),
        Effect::Create(_) => format!("  {} {}", "+".green().bold(), id),
        Effect::Update { .. } => format!("  {} {}", "~".yellow().bold(), id),
        Effect::Replace { .. } => format!("  {} {}", "-/+".magenta().bold(), id),
        Effect::Delete(_) => format!("  {} {}", "-".red().bold(), id),
    }
}

fn display_value(schema: Option<&ResourceSchema>, name: &str, value: &Value) -> String {
    let sensitive = schema
        .and_then(|s| s.attributes.get(name))
        .is_some_and(|a| a.sensitive);
    if sensitive {
        "(sensitive)".to_string()
    } else {
        value.to_json().to_string()
    }
}

fn effect_details(effect: &Effect, schema: Option<&ResourceSchema>) -> Vec<String> {
    match effect {
        Effect::Create(resource) => {
            let mut names: Vec<&String> = resource.attributes.keys().collect();
            names.sort();
            names
                .into_iter()
                .map(|name| {
                    format!(
                        "{} = {}",
                        name,
                        display_value(schema, name, &resource.attributes[name])
                    )
                })
                .collect()
        }
        Effect::Update {
            from,
            to,
            changed_attributes,
        }
        | Effect::Replace {
            from,
            to,
            changed_attributes,
        } => changed_attributes
            .iter()
            .map(|name| {
                let show = |v: Option<&Value>| {
                    v.map(|v| display_value(schema, name, v))
                        .unwrap_or_else(|| "null".to_string())
                };
                let forces = schema
                    .and_then(|s| s.attributes.get(name))
                    .is_some_and(|a| a.force_new)
                    && matches!(effect, Effect::Replace { .. });
                format!(
                    "{}: {} -> {}{}",
                    name,
                    show(from.get(name)),
                    show(to.attributes.get(name)),
                    if forces { " (forces replacement)" } else { "" }
                )
            })
            .collect(),
        Effect::Read { .. } | Effect::Delete(_) => Vec::new(),
    }
}

async fn run_plan(path: &Path) -> Result<(), String> {
    let manifest = load_manifest(path)?;
    let provider = connect(&manifest).await?;
    let mut state = StateFile::load(&manifest::state_path(path)).map_err(|e| e.to_string())?;

    let current = refresh(&provider, &mut state).await?;
    let plan = build_plan(&provider, &manifest, &current);
    print_plan(&plan, &schemas(&provider));
    Ok(())
}

/// Fold apply outcomes into the state file
fn record_outcomes(state: &mut StateFile, result: &ApplyResult) {
    for outcome in result.outcomes.iter().flatten() {
        match outcome {
            EffectOutcome::Created { state: s }
            | EffectOutcome::Updated { state: s }
            | EffectOutcome::Replaced { state: s } => state.record(s),
            EffectOutcome::Deleted { id } => {
                state.remove(id);
            }
            EffectOutcome::Read { .. } | EffectOutcome::Skipped { .. } => {}
        }
    }
}

fn print_outcomes(plan: &Plan, result: &ApplyResult) {
    for (effect, outcome) in plan.effects().iter().zip(&result.outcomes) {
        match outcome {
            Ok(EffectOutcome::Skipped { reason }) => {
                println!("  {} {} ({})", "-".dimmed(), format_effect(effect).trim(), reason);
            }
            Ok(_) => println!("  {} {}", "✓".green(), format_effect(effect).trim()),
            Err(e) => println!("  {} {} - {}", "✗".red(), format_effect(effect).trim(), e),
        }
    }
}

fn confirm(question: &str) -> Result<bool, String> {
    println!();
    println!("{}", question.bold());
    println!("  Only 'yes' will be accepted to approve.");
    print!("\n  Enter a value: ");
    io::stdout().flush().map_err(|e| e.to_string())?;

    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .map_err(|e| format!("Failed to read input: {}", e))?;
    println!();
    Ok(answer.trim() == "yes")
}

async fn run_apply(path: &Path, auto_approve: bool) -> Result<(), String> {
    let manifest = load_manifest(path)?;
    let provider = connect(&manifest).await?;
    let state_path = manifest::state_path(path);
    let mut state = StateFile::load(&state_path).map_err(|e| e.to_string())?;

    let current = refresh(&provider, &mut state).await?;
    let plan = build_plan(&provider, &manifest, &current);
    print_plan(&plan, &schemas(&provider));
    if plan.mutation_count() == 0 {
        return Ok(());
    }

    if !auto_approve && !confirm("Do you want to perform these actions?")? {
        println!("Apply cancelled.");
        return Ok(());
    }

    println!("{}", "Applying changes...".cyan().bold());
    let result = Interpreter::new(provider).apply(&plan).await;
    print_outcomes(&plan, &result);

    record_outcomes(&mut state, &result);
    state.save(&state_path).map_err(|e| e.to_string())?;

    println!();
    if result.is_success() {
        println!(
            "{}",
            format!("Apply complete! {} changes applied.", plan.mutation_count())
                .green()
                .bold()
        );
        Ok(())
    } else {
        Err(format!(
            "Apply failed. {} succeeded, {} failed.",
            result.success_count, result.failure_count
        ))
    }
}

/// Deletes in reverse order of creation
fn destroy_plan(current: &[State]) -> Plan {
    let mut plan = Plan::new();
    for state in current.iter().rev() {
        plan.add(Effect::Delete(state.clone()));
    }
    plan
}

async fn run_destroy(path: &Path, auto_approve: bool) -> Result<(), String> {
    let manifest = load_manifest(path)?;
    let provider = connect(&manifest).await?;
    let state_path = manifest::state_path(path);
    let mut state = StateFile::load(&state_path).map_err(|e| e.to_string())?;

    let current = refresh(&provider, &mut state).await?;
    let plan = destroy_plan(&current);
    if plan.is_empty() {
        state.save(&state_path).map_err(|e| e.to_string())?;
        println!("{}", "No resources to destroy.".green());
        return Ok(());
    }

    println!("The following resources will be destroyed:");
    println!();
    for effect in plan.effects() {
        println!("{}", format_effect(effect));
    }

    if !auto_approve && !confirm("Do you really want to destroy all resources?")? {
        println!("Destroy cancelled.");
        return Ok(());
    }

    let result = Interpreter::new(provider)
        .with_config(InterpreterConfig {
            dry_run: false,
            continue_on_error: true,
        })
        .apply(&plan)
        .await;
    print_outcomes(&plan, &result);

    record_outcomes(&mut state, &result);
    state.save(&state_path).map_err(|e| e.to_string())?;

    println!();
    if result.is_success() {
        println!(
            "{}",
            format!("Destroy complete! {} resources destroyed.", result.success_count)
                .green()
                .bold()
        );
        Ok(())
    } else {
        Err(format!(
            "Destroy failed. {} succeeded, {} failed.",
            result.success_count, result.failure_count
        ))
    }
}

async fn read_data_sources(
    provider: &impl Provider,
    manifest: &Manifest,
) -> Result<serde_json::Map<String, serde_json::Value>, String> {
    let mut output = serde_json::Map::new();
    for resource in manifest.data_sources() {
        let state = provider
            .read_data(&resource)
            .await
            .map_err(|e| e.to_string())?;
        output.insert(
            resource.id.to_string(),
            serde_json::Value::Object(attributes_to_json(&state.attributes)),
        );
    }
    Ok(output)
}

async fn run_data(path: &Path) -> Result<(), String> {
    let manifest = load_manifest(path)?;
    let provider = connect(&manifest).await?;

    let output = read_data_sources(&provider, &manifest).await?;
    let json = serde_json::to_string_pretty(&output).map_err(|e| e.to_string())?;
    println!("{}", json);
    Ok(())
}
