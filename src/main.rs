use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use promptstudio::prompt::{self, DirectorySource, PromptRegistry, TemplateRecord, Variables};
use promptstudio::{Evaluation, PromptError, PromptExecutor, Provider, ProviderRouter};

mod cli;
mod config;

use cli::Cli;
use cli::commands::Commands;
use config::Config;

fn setup_logging(level: Option<&str>) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("promptstudio")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("promptstudio.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    // RUST_LOG still wins over the configured level
    let env = env_logger::Env::default().default_filter_or(level.unwrap_or("info"));
    env_logger::Builder::from_env(env)
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

/// Load every prompt file; a missing directory yields an empty registry
fn load_registry(dir: &Path, verbose: bool) -> PromptRegistry {
    let source = DirectorySource::new(dir);
    match PromptRegistry::load(&source) {
        Ok((registry, report)) => {
            for failure in &report.failures {
                eprintln!("{} {}: {}", "Skipped".yellow(), failure.id, failure.reason);
            }
            if verbose {
                println!("Loaded {} prompts from {}", report.count(), source.dir().display());
            }
            registry
        }
        Err(e) => {
            log::warn!("{}", e);
            eprintln!("{} {}", "Warning:".yellow(), e);
            PromptRegistry::new()
        }
    }
}

fn build_executor(registry: PromptRegistry, config: &Config) -> Result<PromptExecutor> {
    let router = ProviderRouter::from_configs(
        config.backend_config(Provider::OpenAi),
        config.backend_config(Provider::Anthropic),
        config.backend_config(Provider::Google),
    )
    .context("Failed to create provider clients")?;
    Ok(PromptExecutor::from_registry(registry, router))
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    let prompts_dir = cli.prompts_dir.clone().unwrap_or_else(|| config.prompts_dir.clone());
    let registry = load_registry(&prompts_dir, cli.is_verbose());

    match &cli.command {
        Commands::List => handle_list_command(&registry),
        Commands::Show { id } => handle_show_command(&registry, id),
        Commands::Compile { id, vars, test_case } => {
            handle_compile_command(&registry, id, vars, test_case.as_deref())
        }
        Commands::Run {
            id,
            vars,
            provider,
            timeout_ms,
        } => {
            let provider = provider.as_deref().unwrap_or(&config.default_provider);
            let executor = build_executor(registry, config)?;
            handle_run_command(&executor, id, vars, provider, *timeout_ms).await
        }
        Commands::Eval {
            id,
            test_case,
            providers,
        } => {
            let executor = build_executor(registry, config)?;
            handle_eval_command(&executor, id, test_case, providers).await
        }
    }
}

fn handle_list_command(registry: &PromptRegistry) -> Result<()> {
    info!("Listing {} prompts", registry.count());
    if registry.is_empty() {
        println!("{}", "No prompts loaded".yellow());
        return Ok(());
    }

    for summary in registry.list() {
        let title = summary.title.as_deref().unwrap_or("(untitled)");
        println!("{} - {}", summary.id.green().bold(), title);
        if let Some(description) = &summary.description {
            println!("  {}", description);
        }
        if !summary.variables.is_empty() {
            let names: Vec<String> = summary
                .variables
                .iter()
                .map(|v| if v.required { format!("{}*", v.name) } else { v.name.clone() })
                .collect();
            println!("  variables: {}", names.join(", "));
        }
    }
    Ok(())
}

fn lookup(registry: &PromptRegistry, id: &str) -> Result<Arc<TemplateRecord>> {
    registry
        .get(id)
        .ok_or_else(|| PromptError::PromptNotFound(id.to_string()).into())
}

fn handle_show_command(registry: &PromptRegistry, id: &str) -> Result<()> {
    info!("Showing prompt: {}", id);
    let record = lookup(registry, id)?;

    println!("{} {}", "Prompt:".green(), record.id);
    if let Some(title) = &record.title {
        println!("Title: {}", title);
    }
    if let Some(description) = &record.description {
        println!("Description: {}", description);
    }
    if let Some(template) = &record.user_input_template {
        println!("Template: {}", template);
    }

    if !record.variables.is_empty() {
        println!("{}", "Variables:".cyan());
        for var in &record.variables {
            let var_type = var.var_type.as_deref().unwrap_or("any");
            let required = if var.required { " (required)" } else { "" };
            println!("  {}: {}{}", var.name, var_type, required);
            if let Some(description) = &var.description {
                println!("    {}", description);
            }
            if let Some(default) = &var.default_value {
                println!("    default: {}", prompt::value_to_string(default));
            }
        }
    }

    if !record.test_cases.is_empty() {
        println!("{}", "Test cases:".cyan());
        for tc in &record.test_cases {
            println!("  {}", tc.name);
        }
    }
    Ok(())
}

fn collect_vars(pairs: &[(String, serde_json::Value)]) -> Variables {
    pairs.iter().cloned().collect()
}

fn warn_missing(record: &TemplateRecord, variables: &Variables) {
    let missing = prompt::missing_required(record, variables);
    if !missing.is_empty() {
        eprintln!("{} missing required variables: {}", "Warning:".yellow(), missing.join(", "));
    }
}

fn handle_compile_command(
    registry: &PromptRegistry,
    id: &str,
    vars: &[(String, serde_json::Value)],
    test_case: Option<&str>,
) -> Result<()> {
    info!("Compiling prompt: {} (test case: {:?})", id, test_case);
    let record = lookup(registry, id)?;

    let mut variables = match test_case {
        Some(name) => record
            .test_case(name)
            .map(|tc| tc.inputs.clone())
            .ok_or_else(|| PromptError::TestCaseNotFound {
                prompt_id: id.to_string(),
                name: name.to_string(),
            })?,
        None => Variables::new(),
    };
    variables.extend(collect_vars(vars));

    warn_missing(&record, &variables);
    println!("{}", prompt::compile(&record, &variables));
    Ok(())
}

async fn handle_run_command(
    executor: &PromptExecutor,
    id: &str,
    vars: &[(String, serde_json::Value)],
    provider: &str,
    timeout_ms: Option<u64>,
) -> Result<()> {
    info!("Running prompt: {} via {}", id, provider);
    let variables = collect_vars(vars);
    if let Some(record) = executor.registry().get(id) {
        warn_missing(&record, &variables);
    }

    let cancel = interrupt_token();
    let deadline = timeout_ms.map(Duration::from_millis);
    let result = executor
        .execute_bounded(id, &variables, provider, Some(&cancel), deadline)
        .await;

    match result {
        Ok(text) => {
            println!("{}", text);
            Ok(())
        }
        Err(e) if e.is_client_error() => Err(eyre::Report::new(e).wrap_err("Invalid request")),
        Err(e) => Err(eyre::Report::new(e).wrap_err("Provider call failed")),
    }
}

/// Token that fires on Ctrl-C
fn interrupt_token() -> CancellationToken {
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });
    cancel
}

async fn handle_eval_command(
    executor: &PromptExecutor,
    id: &str,
    test_case: &str,
    providers: &[String],
) -> Result<()> {
    let selected: Vec<&str> = if providers.is_empty() {
        Provider::ALL.iter().map(|p| p.as_str()).collect()
    } else {
        providers.iter().map(String::as_str).collect()
    };
    info!("Evaluating prompt: {} test case: {} providers: {:?}", id, test_case, selected);

    let evaluations = executor
        .evaluate(id, test_case, &selected, interrupt_token())
        .await
        .map_err(|e| eyre::Report::new(e).wrap_err("Invalid request"))?;

    println!("{} {} / {}", "Evaluation:".green().bold(), id, test_case);
    for evaluation in &evaluations {
        print_evaluation(evaluation);
    }
    if evaluations.len() < selected.len() {
        println!("{}", "Interrupted, remaining providers skipped".yellow());
    }
    Ok(())
}

fn print_evaluation(evaluation: &Evaluation) {
    println!();
    println!("{} ({} ms)", evaluation.provider.cyan().bold(), evaluation.latency.as_millis());
    match &evaluation.result {
        Ok(text) => println!("{}", text),
        Err(e) => println!("{} {}", "Error:".red(), e),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    // Logging level comes from the config
    setup_logging(config.log_level.as_deref()).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}
