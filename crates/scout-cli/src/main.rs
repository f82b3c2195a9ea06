use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use std::sync::Arc;

use scout::agent::Agent;
use scout::explorer::ExplorerSystem;
use scout::models::message::Message;
use scout::providers::base::Provider;
use scout::providers::configs::OpenAiProviderConfig;
use scout::providers::openai::OpenAiProvider;

mod config;
mod session;

/// Read-only codebase exploration agent
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Chat-completions endpoint URL
    #[arg(long)]
    url: Option<String>,

    /// Model to use (e.g., gpt-4.1-mini)
    #[arg(short, long)]
    model: Option<String>,

    /// Mission to complete before dropping into the interactive prompt
    #[arg(long)]
    mission: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(config::log_filter())
        .init();

    let cli = Cli::parse();

    let api_key = config::api_key();
    let defaults = config::defaults(!api_key.is_empty(), cfg!(target_os = "macos"));
    let endpoint = cli.url.unwrap_or_else(|| defaults.endpoint.to_string());
    let model = cli.model.unwrap_or_else(|| defaults.model.to_string());

    let provider: Arc<dyn Provider> = Arc::new(OpenAiProvider::new(OpenAiProviderConfig::new(
        endpoint, api_key, model,
    ))?);

    // One cheap round trip before entering the loop; a backend that cannot
    // answer this cannot run a mission either
    println!("{}", style("=== Warming up...").dim());
    let warmup = vec![Message::user().with_text("Be concise, are you ready to work?")];
    let completion = provider
        .complete("", &warmup, &[])
        .await
        .context("warm-up request failed")?;
    println!(
        "{} {}",
        style("LLM says:").dim(),
        style(completion.message.text().trim()).blue()
    );

    let root = std::env::current_dir().context("cannot determine working directory")?;
    let mut agent = Agent::new(provider.clone());
    agent.add_system(Box::new(ExplorerSystem::new(root, provider)));

    let mut session = session::Session::new(agent, cli.mission);
    session.start().await
}
