//! # iso20022 CLI entry point
//!
//! Parses command-line arguments, loads the optional configuration file, and
//! dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use iso20022_cli::config::CliConfig;
use iso20022_cli::convert::{run_convert, ConvertArgs};
use iso20022_cli::inspect::{run_inspect, InspectArgs};
use iso20022_cli::validate::{run_validate, ValidateArgs};

/// ISO 20022 document toolkit.
///
/// Validates markup documents against XSD schema definitions, converts
/// documents between markup (XML) and object notation (JSON), and
/// summarizes pacs.008 / pacs.002 messages.
#[derive(Parser, Debug)]
#[command(name = "iso20022", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate markup documents against the loaded schemas.
    Validate(ValidateArgs),

    /// Convert a document between markup and object notation.
    Convert(ConvertArgs),

    /// Summarize a document, or list message kinds and schemas.
    Inspect(InspectArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = CliConfig::load(cli.config.as_deref()).and_then(|config| match &cli.command {
        Commands::Validate(args) => run_validate(args, &config),
        Commands::Convert(args) => run_convert(args, &config),
        Commands::Inspect(args) => run_inspect(args, &config),
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}
