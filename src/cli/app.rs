//! Main CLI application structure

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};

use super::compile_cmd::{self, CheckArgs, CompileArgs, ResolveFileArgs};
use super::output::{Output, OutputFormat};
use crate::compile::Config;

#[derive(Parser)]
#[command(name = "yamlc")]
#[command(author, version, about = "Compile YAML with !include directives into JSON")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only print errors
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Project configuration file (defaults to the nearest yamlc.toml)
    #[arg(long, global = true, env = "YAMLC_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile YAML sources into JSON files
    Compile(CompileArgs),

    /// Resolve sources and report problems without writing anything
    Check(CheckArgs),

    /// Print the resolved JSON of a single file
    Resolve(ResolveFileArgs),
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let output = Output::new(cli.format, cli.quiet);
    let config = match &cli.config {
        Some(path) => Config::with_project_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => Config::load()?,
    };

    if let Some(path) = &config.project_file {
        tracing::debug!(config = %path.display(), "Loaded project configuration");
    }

    match cli.command {
        Commands::Compile(args) => compile_cmd::compile(&output, &config, args)?,
        Commands::Check(args) => compile_cmd::check(&output, &config, args)?,
        Commands::Resolve(args) => compile_cmd::resolve(&output, &config, args)?,
    }

    Ok(())
}

/// Installs the stderr log subscriber; `RUST_LOG` overrides the flags
fn init_tracing(cli: &Cli) {
    use std::io::IsTerminal;
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let default_level = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal())
                .with_target(cli.verbose >= 2),
        )
        .try_init();
}
