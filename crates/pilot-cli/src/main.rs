use anyhow::{Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use tokio::sync::watch;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use pilot::agent::{Agent, LoopOutcome};
use pilot::providers::openai::OpenAiProvider;
use pilot::tools::{ToolExecutor, ToolRegistry};

mod configuration;
mod error;

use configuration::{timeout_from_secs, Settings};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Prompt to send to the model
    #[arg(short, long)]
    prompt: String,

    /// Model to use (can also be set via OPENROUTER_MODEL environment variable)
    #[arg(short, long)]
    model: Option<String>,

    /// Maximum number of model calls before giving up (can also be set via PILOT_MAX_TURNS)
    #[arg(long)]
    max_turns: Option<usize>,

    /// Seconds a single tool call may run, 0 for no limit (can also be set via PILOT_TOOL_TIMEOUT_SECS)
    #[arg(long)]
    tool_timeout: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let settings = Settings::new()?;

    let mut provider_config = settings.provider.into_config();
    if let Some(model) = cli.model {
        provider_config.model = model;
    }
    let tool_timeout = match cli.tool_timeout {
        Some(secs) => timeout_from_secs(secs),
        None => settings.agent.tool_timeout(),
    };
    let max_turns = cli.max_turns.unwrap_or(settings.agent.max_turns);

    let provider = OpenAiProvider::new(provider_config).context("Failed to create HTTP client")?;
    let executor =
        ToolExecutor::new(ToolRegistry::with_builtin_tools()).with_timeout(tool_timeout);
    let agent = Agent::new(Box::new(provider), executor).with_max_turns(max_turns);

    // First Ctrl-C stops the loop at the next checkpoint, a second one exits right away
    let (cancel_tx, cancel_rx) = watch::channel(false);
    ctrlc::set_handler(move || {
        if cancel_tx.send_replace(true) {
            std::process::exit(130);
        }
    })
    .context("Failed to install Ctrl-C handler")?;

    let outcome = agent.reply(cli.prompt, cancel_rx).await?;
    if let LoopOutcome::Cancelled { .. } = outcome {
        warn!("Interrupted, printing the last reply");
    }

    // stdout carries nothing but the answer
    let text = outcome.text();
    if !text.is_empty() {
        println!("{}", text);
    }
    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_prompt_is_required() {
        assert!(Cli::try_parse_from(["pilot"]).is_err());

        let cli = Cli::try_parse_from(["pilot", "-p", "list the files"]).unwrap();
        assert_eq!(cli.prompt, "list the files");
        assert!(cli.model.is_none());
        assert!(cli.max_turns.is_none());
        assert!(cli.tool_timeout.is_none());
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::try_parse_from([
            "pilot",
            "--prompt",
            "hi",
            "--model",
            "openai/gpt-4o",
            "--max-turns",
            "3",
            "--tool-timeout",
            "0",
        ])
        .unwrap();
        assert_eq!(cli.model.as_deref(), Some("openai/gpt-4o"));
        assert_eq!(cli.max_turns, Some(3));
        assert_eq!(cli.tool_timeout, Some(0));
    }
}
