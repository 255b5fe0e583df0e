//! Patchloom CLI — the main entry point.
//!
//! Runs one agent against the current working tree, either with a single
//! message (`-m`) or interactively on stdin.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use patchloom_agent::{run_agent, RuntimeContext};
use patchloom_config::Config;
use patchloom_core::input::{InputSource, NoInput};
use patchloom_core::output::OutputSink;
use patchloom_core::provider::CompletionProvider;
use patchloom_filters::FilterSet;
use patchloom_provider::OpenAiResponsesProvider;
use patchloom_tools::builtin_registry;

mod input;
mod terminal;

use input::StdinSource;
use terminal::TerminalSink;

#[derive(Parser)]
#[command(
    name = "patchloom",
    about = "Patchloom — a recursive coding agent runtime",
    version,
    author
)]
struct Cli {
    /// Config files, deep-merged over the built-in defaults in order
    #[arg(short, long = "config")]
    config: Vec<PathBuf>,

    /// Agent to run (defaults to the configured default_agent)
    #[arg(short, long)]
    agent: Option<String>,

    /// Send a single message instead of entering interactive mode
    #[arg(short, long)]
    message: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = Arc::new(Config::load(&cli.config)?);

    let agent_name = cli.agent.as_deref().unwrap_or(&config.default_agent);
    let definition = config
        .agents
        .get(agent_name)
        .ok_or_else(|| format!("Agent not found in config: {agent_name}"))?
        .clone();

    let api_key = std::env::var("OPENAI_API_KEY")
        .map_err(|_| "OPENAI_API_KEY is not set (environment or .env)")?;
    let provider: Arc<dyn CompletionProvider> =
        Arc::new(OpenAiResponsesProvider::openai(api_key)?);

    let tools = Arc::new(builtin_registry(&config.tools.builtin, Arc::clone(&provider)));
    let filters = Arc::new(FilterSet::builtin(&config.filters));
    config.validate(&tools.names(), &filters.names());

    let ctx = RuntimeContext {
        config: Arc::clone(&config),
        provider,
        tools,
        filters,
    };

    // no unwinding of in-flight requests; file writes already on disk stay
    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(130);
        }
    });

    let sink: Arc<dyn OutputSink> = Arc::new(TerminalSink::new());
    let (first_input, source): (Option<String>, Arc<dyn InputSource>) = match cli.message {
        Some(message) => (Some(message), Arc::new(NoInput)),
        None => (None, Arc::new(StdinSource::start())),
    };

    run_agent(&ctx, &definition, first_input, true, sink, source).await?;
    Ok(())
}
