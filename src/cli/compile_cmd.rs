//! `compile`, `check` and `resolve` commands

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use regex::Regex;
use tracing::debug;

use super::output::Output;
use crate::compile::{collect_pairs, BatchReport, CompileOptions, Compiler, Config, FilePair};

/// Flags shared by every command that resolves sources
#[derive(Args, Debug, Clone)]
pub struct ResolveArgs {
    /// Substitute null for missing anchors instead of failing
    #[arg(long)]
    pub lenient_anchors: bool,

    /// Directory that `!include /...` references are relative to
    #[arg(long)]
    pub root_dir: Option<PathBuf>,
}

/// Arguments for `yamlc compile`
#[derive(Args, Debug, Clone)]
pub struct CompileArgs {
    /// Source files or directories (directories are searched for .yml/.yaml)
    #[arg(required = true)]
    pub sources: Vec<PathBuf>,

    /// Write outputs below this directory instead of next to each source
    #[arg(long, short = 'o')]
    pub out_dir: Option<PathBuf>,

    /// JSON indent width
    #[arg(long, short = 's')]
    pub space: Option<usize>,

    /// Skip sources whose file name matches this regex
    #[arg(long)]
    pub ignored: Option<String>,

    /// Resolve and serialize without writing anything
    #[arg(long)]
    pub no_write: bool,

    #[command(flatten)]
    pub resolve: ResolveArgs,
}

/// Arguments for `yamlc check`
#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// Source files or directories
    #[arg(required = true)]
    pub sources: Vec<PathBuf>,

    /// Skip sources whose file name matches this regex
    #[arg(long)]
    pub ignored: Option<String>,

    #[command(flatten)]
    pub resolve: ResolveArgs,
}

/// Arguments for `yamlc resolve`
#[derive(Args, Debug, Clone)]
pub struct ResolveFileArgs {
    /// Source file
    pub file: PathBuf,

    /// JSON indent width
    #[arg(long, short = 's')]
    pub space: Option<usize>,

    #[command(flatten)]
    pub resolve: ResolveArgs,
}

/// Compiles sources to JSON files
pub fn compile(output: &Output, config: &Config, args: CompileArgs) -> Result<()> {
    let mut options = base_options(config, &args.resolve, args.ignored.as_deref())?;
    if let Some(space) = args.space {
        options.space = space;
    }
    if args.no_write {
        options.disable_dest = true;
    }

    let out_dir = args.out_dir.as_deref().or_else(|| config.out_dir());
    let pairs = collect_pairs(&args.sources, out_dir)?;
    debug!(count = pairs.len(), "Collected sources");

    let report = Compiler::new(options).compile_all(&pairs)?;
    print_report(output, &report, "Compiled");
    Ok(())
}

/// Resolves sources without writing outputs
pub fn check(output: &Output, config: &Config, args: CheckArgs) -> Result<()> {
    let mut options = base_options(config, &args.resolve, args.ignored.as_deref())?;
    options.disable_dest = true;

    let pairs = collect_pairs(&args.sources, None)?;
    let report = Compiler::new(options).compile_all(&pairs)?;
    print_report(output, &report, "Checked");
    Ok(())
}

/// Prints the resolved JSON of one file to stdout
pub fn resolve(output: &Output, config: &Config, args: ResolveFileArgs) -> Result<()> {
    let mut options = base_options(config, &args.resolve, None)?;
    options.disable_dest = true;
    if let Some(space) = args.space {
        options.space = space;
    }

    let pair = FilePair::for_source(&args.file, None);
    let compiled = Compiler::new(options)
        .compile_file(&pair)?
        .with_context(|| format!("Source was skipped: {}", args.file.display()))?;

    output.raw(&compiled.json);
    Ok(())
}

fn base_options(config: &Config, resolve: &ResolveArgs, ignored: Option<&str>) -> Result<CompileOptions> {
    let mut options = config.compile_options().context("Invalid configuration")?;

    if resolve.lenient_anchors {
        options.strict_anchors = false;
    }
    if let Some(root_dir) = &resolve.root_dir {
        options.root_dir = Some(root_dir.clone());
    }
    if let Some(pattern) = ignored {
        options.ignored =
            Some(Regex::new(pattern).with_context(|| format!("Invalid --ignored pattern: {}", pattern))?);
    }

    Ok(options)
}

fn print_report(output: &Output, report: &BatchReport, verb: &str) {
    if output.is_json() {
        output.data(report);
        return;
    }

    for entry in &report.compiled {
        if entry.written {
            output.success(&format!("{} {} -> {}", verb, entry.source.display(), entry.dest.display()));
        } else {
            output.success(&format!("{} {}", verb, entry.source.display()));
        }
    }

    output.success(&format!(
        "{} file(s) {}, {} skipped",
        report.compiled.len(),
        verb.to_lowercase(),
        report.skipped.len()
    ));
}
