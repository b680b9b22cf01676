//! # Validate Subcommand
//!
//! Validates markup documents against the schema aggregate built from the
//! configuration and flags, printing one line per document followed by its
//! validation events.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;

use crate::config::{CliConfig, SchemaArgs};

/// Arguments for the `iso20022 validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Markup documents to validate (`-` for standard input).
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,

    #[command(flatten)]
    pub schemas: SchemaArgs,
}

/// Execute the validate subcommand.
///
/// Returns exit code: 0 when every document is accepted, 1 when any is
/// rejected.
pub fn run_validate(args: &ValidateArgs, config: &CliConfig) -> Result<u8> {
    let mut config = config.clone();
    args.schemas.apply(&mut config);

    let (mut aggregator, all_loaded) = config.aggregator();
    if aggregator.is_empty() {
        bail!("no schema definitions loaded");
    }
    if !all_loaded {
        println!("WARN: some schema definitions failed to load; run with -v for details");
    }
    println!("Schemas: {} definition(s) loaded", aggregator.definitions().len());

    let total = args.paths.len();
    let mut passed = 0usize;
    for path in &args.paths {
        let text = crate::read_input(path)?;
        aggregator.clear_events();
        match aggregator.try_validate(&text) {
            Ok(_) => {
                passed += 1;
                match aggregator.warnings().count() {
                    0 => println!("PASS: {}", path.display()),
                    n => println!("PASS: {} ({n} warning(s))", path.display()),
                }
            }
            Err(error) => println!("FAIL: {}: {error}", path.display()),
        }
        crate::print_events(&aggregator);
    }

    println!("Documents: {passed}/{total} passed");
    if passed == total {
        Ok(0)
    } else {
        Ok(1)
    }
}
