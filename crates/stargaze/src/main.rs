use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use stargaze::chart::Archetype;
use stargaze::cli::commands;
use stargaze::config::{Config, SERVER_URL_ENV, TIMEOUT_SECS_ENV};

#[derive(Parser)]
#[command(name = "stargaze")]
#[command(
  about = "Stargaze - Star Ratings Analytics Chat\nAsk about plan quality ratings and get answers as prose or charts"
)]
#[command(version)]
struct Cli {
  #[command(flatten)]
  global: GlobalArgs,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Args)]
struct GlobalArgs {
  /// Base URL of the reasoning service
  #[arg(long, global = true, env = SERVER_URL_ENV)]
  server_url: Option<String>,

  /// Request timeout in seconds
  #[arg(long, global = true, env = TIMEOUT_SECS_ENV)]
  timeout_secs: Option<u64>,

  /// Configuration file path
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Enable verbose logging
  #[arg(short, long, global = true)]
  verbose: bool,
}

#[derive(Subcommand)]
enum Command {
  /// Start an interactive chat (default)
  Chat,
  /// Ask a single question and print the answer
  Ask {
    /// Question text (space-separated)
    #[arg(required = true)]
    question: Vec<String>,
  },
  /// Turn a JSON file of records into a chart for the renderer
  Chart {
    /// JSON array of records
    #[arg(short, long)]
    file: PathBuf,
    /// Chart type; inferred from the records when omitted
    #[arg(short = 't', long = "type", value_enum)]
    archetype: Option<Archetype>,
    /// Use the expanded presentation height
    #[arg(short, long)]
    expanded: bool,
  },
}

fn load_config(global: &GlobalArgs) -> Result<Config> {
  let mut config = Config::load(global.config.as_deref())?;
  if let Some(url) = &global.server_url {
    config.server_url = url.clone();
  }
  if let Some(secs) = global.timeout_secs {
    config.timeout_secs = secs;
  }
  config.validate()?;
  Ok(config)
}

async fn handle(global: GlobalArgs, command: Command) -> Result<()> {
  match command {
    Command::Chart { file, archetype, expanded } => commands::chart(&file, archetype, expanded),
    Command::Chat => commands::chat(&load_config(&global)?).await,
    Command::Ask { question } => commands::ask(&load_config(&global)?, &question.join(" ")).await,
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();
  stargaze::log::init_tracing(cli.global.verbose);

  handle(cli.global, cli.command.unwrap_or(Command::Chat)).await
}
