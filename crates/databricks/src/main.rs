//! Databricks CLI - bundle commands

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "databricks")]
#[command(version = bundle_util::cli_version())]
#[command(about = "Databricks CLI", long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error); overrides RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Databricks Asset Bundles
    Bundle {
        #[command(subcommand)]
        command: BundleCommands,
    },
}

#[derive(Subcommand)]
enum BundleCommands {
    /// Validate the bundle configuration
    Validate {
        /// Bundle target to use
        #[arg(short = 't', long)]
        target: Option<String>,

        /// Set a bundle variable (NAME=VALUE)
        #[arg(long = "var")]
        variables: Vec<String>,

        /// Output format
        #[arg(short = 'o', long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,

        /// Stop at the first error
        #[arg(long)]
        fail_fast: bool,

        /// Bundle root directory (defaults to the current directory)
        #[arg(short = 'C', long)]
        directory: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    match cli.command {
        Commands::Bundle { command } => match command {
            BundleCommands::Validate {
                target,
                variables,
                output,
                fail_fast,
                directory,
            } => commands::validate::execute(commands::validate::ValidateArgs {
                target,
                variables,
                output,
                fail_fast,
                directory,
            }),
        },
    }
}
