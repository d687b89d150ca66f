mod cli_logger;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use std::path::PathBuf;
use std::process::ExitCode;

use cli_logger::CliLogger;
use pprofiler::{
    CacheCommand, Config, DEFAULT_CONFIG_FILE, InspectCommand, ProfileRun, cache_command,
    inspect_command,
};

#[derive(Debug, Parser)]
#[command(name = "pprofiler", version, about = "Inspect cached line-level execution profiles")]
struct Cli {
    /// Config file (defaults to ./pprofiler.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Persisted run artifact to inspect.
    #[arg(long, global = true, value_name = "PATH")]
    profile: Option<PathBuf>,

    /// Emit JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    /// Disable terminal colors.
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(flatten)]
    Inspect(InspectCommand),
    /// Manage cached profile artifacts.
    Cache {
        #[command(subcommand)]
        command: CacheCommand,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("PPROFILER_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let logger = CliLogger::new(cli.json, cli.no_color);
    match run(&cli, &logger) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            logger.print_error(&format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, logger: &CliLogger) -> Result<()> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let config = Config::load_optional(&config_path);

    match &cli.command {
        Command::Inspect(command) => {
            let path = cli
                .profile
                .as_ref()
                .context("--profile <PATH> is required for this command")?;
            let run = ProfileRun::read_json(path)
                .with_context(|| format!("loading profile {}", path.display()))?;
            tracing::debug!(
                "loaded {} files / {} lines from {}",
                run.file_count(),
                run.line_count(),
                path.display()
            );
            let highlighter = config.highlighter(cli.no_color || cli.json);
            let output = inspect_command(&config, &run, highlighter.as_ref(), command)?;
            logger.print_inspect(&output)
        }
        Command::Cache { command } => {
            let value = cache_command(&config, command)?;
            logger.print_serialized(&value)
        }
    }
}
