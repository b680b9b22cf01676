//! # iso20022-cli — Command-Line Interface
//!
//! Provides the `iso20022` binary over the workspace libraries.
//!
//! ## Subcommands
//!
//! - `iso20022 validate` — validate markup documents against the schema
//!   aggregate.
//! - `iso20022 convert` — re-encode a document between markup and object
//!   notation, detecting its message type.
//! - `iso20022 inspect` — summarize a document, or list the known message
//!   kinds and loaded schemas.
//!
//! ```bash
//! iso20022 validate payment.xml --schema-dir schemas/iso20022
//! iso20022 convert payment.xml --to json -o payment.json
//! iso20022 --config iso20022.yaml inspect status.json
//! ```
//!
//! Every handler returns an exit code: 0 on success, 1 when a document
//! fails validation or is not recognised, and errors (unreadable files,
//! bad configuration) surface as exit code 2.

pub mod config;
pub mod convert;
pub mod inspect;
pub mod validate;

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use iso20022_core::Encoding;
use iso20022_schema::SchemaAggregator;

/// Resolve `path` against `base` unless it is absolute.
pub fn resolve_path(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() || base.as_os_str().is_empty() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Read a document, from standard input when `path` is `-`.
pub fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read standard input")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// The encoding of `path`: `explicit` if given, otherwise from the file
/// extension.
pub fn input_encoding(path: &Path, explicit: Option<Encoding>) -> Result<Encoding> {
    if let Some(encoding) = explicit {
        return Ok(encoding);
    }
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    match Encoding::from_extension(extension) {
        Some(encoding) => Ok(encoding),
        None => bail!(
            "cannot tell the encoding of {} from its name; pass the encoding explicitly",
            path.display()
        ),
    }
}

/// Print the events of the last validation, indented under a report line.
pub(crate) fn print_events(aggregator: &SchemaAggregator) {
    for event in aggregator.events() {
        println!("  {event}");
    }
}
