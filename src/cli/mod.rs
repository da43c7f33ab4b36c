//! CLI module for llm-router
//!
//! # Commands
//!
//! - `serve` - Start the router
//! - `config init` - Write an example configuration file
//! - `categories` - Show categories, their models and keywords
//! - `status` - Query a running router for health and statistics
//! - `reset` - Reset circuit breakers on a running router
//! - `completions` - Generate shell completions
//!
//! # Example
//!
//! ```bash
//! # Start with a config file and hybrid classification
//! llm-router serve -c llm-router.toml --mode hybrid
//!
//! # Show what a running router has been doing
//! llm-router status --json
//! ```

pub mod categories;
pub mod completions;
pub mod config;
pub mod output;
pub mod serve;
pub mod status;

pub use completions::handle_completions;
pub use config::handle_config_init;

use crate::config::RoutingMode;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Address of a locally running router.
pub const DEFAULT_ROUTER_URL: &str = "http://localhost:3456";

/// llm-router - Category-routing LLM gateway
#[derive(Parser, Debug)]
#[command(
    name = "llm-router",
    version,
    about = "Routes chat requests to LLM backends by task category, with fallback and circuit breaking"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the router
    Serve(ServeArgs),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Show configured categories
    Categories(CategoriesArgs),
    /// Show health and statistics of a running router
    Status(StatusArgs),
    /// Reset circuit breakers on a running router
    Reset(ResetArgs),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "llm-router.toml")]
    pub config: PathBuf,

    /// Override server port
    #[arg(short, long, env = "LLM_ROUTER_PORT")]
    pub port: Option<u16>,

    /// Override server host
    #[arg(short = 'H', long, env = "LLM_ROUTER_HOST")]
    pub host: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "LLM_ROUTER_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Override routing mode (keywords, local_model, remote_model, hybrid)
    #[arg(short, long)]
    pub mode: Option<RoutingMode>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Initialize a new configuration file
    Init(ConfigInitArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = "llm-router.toml")]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CategoriesArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Path to configuration file
    #[arg(short, long, default_value = "llm-router.toml")]
    pub config: PathBuf,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Base URL of the running router
    #[arg(short, long, env = "LLM_ROUTER_URL", default_value = DEFAULT_ROUTER_URL)]
    pub url: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ResetArgs {
    /// Base URL of the running router
    #[arg(short, long, env = "LLM_ROUTER_URL", default_value = DEFAULT_ROUTER_URL)]
    pub url: String,

    /// Reset only this model id (e.g. openrouter:z-ai/glm-5); all circuits otherwise
    pub model: Option<String>,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
