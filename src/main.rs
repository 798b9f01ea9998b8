//! df-column-lint CLI
//!
//! Entry point for the command-line tool.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use df_column_lint::{output, run, OutputFormat, ProjectConfig};

#[derive(Parser, Debug)]
#[command(name = "df-column-lint")]
#[command(about = "Static column-level analyzer for tabular-data manipulation code", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file
    #[arg(short, long, default_value = "df-column-lint.toml", global = true)]
    config: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze one or more files or directories.
    Check {
        /// Files or directories to analyze.
        paths: Vec<PathBuf>,

        /// Enable W001 (bare load) and W002 (drop-unknown) warnings.
        #[arg(long)]
        strict_ingest: bool,

        /// Disable the cross-file project index.
        #[arg(long)]
        no_index: bool,

        /// Suppress severity "warning".
        #[arg(long)]
        no_warnings: bool,

        /// Renderer choice.
        #[arg(long, value_enum, default_value = "text")]
        output_format: CliOutputFormat,

        /// Exit non-zero on any warning (otherwise only on errors).
        #[arg(long)]
        strict: bool,
    },
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputFormat {
    Text,
    Json,
    Github,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(value: CliOutputFormat) -> Self {
        match value {
            CliOutputFormat::Text => OutputFormat::Text,
            CliOutputFormat::Json => OutputFormat::Json,
            CliOutputFormat::Github => OutputFormat::Github,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run_command(args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn run_command(args: Args) -> Result<ExitCode> {
    let mut config = if args.config.exists() {
        ProjectConfig::load(&args.config).with_context(|| format!("failed to load configuration from {}", args.config.display()))?
    } else {
        ProjectConfig::default()
    };

    let Command::Check {
        paths,
        strict_ingest,
        no_index,
        no_warnings,
        output_format,
        strict,
    } = args.command;

    if paths.is_empty() {
        anyhow::bail!("check requires at least one path");
    }

    config.engine.strict_ingest |= strict_ingest;
    config.engine.no_index |= no_index;
    if no_warnings {
        config.engine.warnings = false;
    }
    config.strict |= strict;
    config.output_format = output_format.into();

    let outcome = run(&paths, &config);

    let color = config.color && std::io::stdout().is_terminal();
    let rendered = output::render(config.output_format, &outcome.diagnostics, color);
    if !rendered.is_empty() {
        println!("{rendered}");
    }

    let exit = if outcome.has_errors() || (config.strict && outcome.has_warnings()) {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    };
    Ok(exit)
}
