//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - list: list all loaded prompts
//! - show: display one prompt definition
//! - compile: print the compiled text without calling a provider
//! - run: compile and send to a provider
//! - eval: run a shipped test case against several providers

use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;

/// Prompt Studio - compile structured prompts and send them to an LLM provider
#[derive(Parser, Debug)]
#[command(name = "promptstudio")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory of *.prompt.json / *.prompt.yaml files (overrides config)
    #[arg(short, long, global = true)]
    pub prompts_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List all loaded prompts
    List,

    /// Show a prompt definition
    Show {
        /// Prompt identifier
        id: String,
    },

    /// Print the compiled prompt text
    Compile {
        /// Prompt identifier
        id: String,

        /// Variable as name=value (value parsed as JSON when possible)
        #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_var)]
        vars: Vec<(String, Value)>,

        /// Start from the inputs of a shipped test case
        #[arg(short, long)]
        test_case: Option<String>,
    },

    /// Compile a prompt and send it to a provider
    Run {
        /// Prompt identifier
        id: String,

        /// Variable as name=value (value parsed as JSON when possible)
        #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_var)]
        vars: Vec<(String, Value)>,

        /// Provider name (openai, anthropic, google)
        #[arg(short = 'P', long)]
        provider: Option<String>,

        /// Give up after this many milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
    },

    /// Run a shipped test case against each provider and compare the replies
    Eval {
        /// Prompt identifier
        id: String,

        /// Test case name
        #[arg(short, long)]
        test_case: String,

        /// Provider to evaluate (repeatable; defaults to every provider)
        #[arg(short = 'P', long = "provider")]
        providers: Vec<String>,
    },
}

/// Parse `name=value`; the value is JSON if it parses as JSON, else a plain string
pub fn parse_var(s: &str) -> Result<(String, Value), String> {
    let (name, raw) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", s))?;
    if name.is_empty() {
        return Err(format!("missing variable name in '{}'", s));
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((name.to_string(), value))
}
