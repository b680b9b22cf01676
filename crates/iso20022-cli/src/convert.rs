//! # Convert Subcommand
//!
//! Re-encodes a document between markup and object notation. The message
//! type is detected through the bundled registry unless named with
//! `--message`; the markup side can be checked against the schema aggregate
//! on the way.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use iso20022_codec::qualify_markup;
use iso20022_core::Encoding;
use iso20022_message::{DecodedMessage, MessageKind, MessageRegistry};

use crate::config::{CliConfig, SchemaArgs};

/// Arguments for the `iso20022 convert` subcommand.
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Document to convert (`-` for standard input).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Encoding of the input (`xml` or `json`); taken from the file
    /// extension when omitted.
    #[arg(long, value_name = "ENCODING")]
    pub from: Option<Encoding>,

    /// Encoding to write; the other one when omitted.
    #[arg(long, value_name = "ENCODING")]
    pub to: Option<Encoding>,

    /// Output file; standard output when omitted.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Message identifier to decode as, e.g. `pacs.008.001.10`.
    #[arg(long, value_name = "ID")]
    pub message: Option<String>,

    /// Validate the markup side of the conversion.
    #[arg(long)]
    pub validate: bool,

    /// Write markup without the message namespace.
    #[arg(long)]
    pub bare: bool,

    #[command(flatten)]
    pub schemas: SchemaArgs,
}

/// Execute the convert subcommand.
///
/// Returns exit code: 0 on success, 1 when the input is not a known
/// message or fails validation.
pub fn run_convert(args: &ConvertArgs, config: &CliConfig) -> Result<u8> {
    let mut config = config.clone();
    args.schemas.apply(&mut config);

    let from = crate::input_encoding(&args.input, args.from)?;
    let to = args.to.unwrap_or(match from {
        Encoding::Markup => Encoding::ObjectNotation,
        Encoding::ObjectNotation => Encoding::Markup,
    });
    let text = crate::read_input(&args.input)?;

    let mut options = config.codec.clone();
    options.markup.include_namespace = !args.bare;
    let mut registry = MessageRegistry::bundled();
    registry.set_options(options);

    let decoded = match &args.message {
        Some(id) => {
            let kind = registry
                .find(id)
                .with_context(|| format!("unknown message identifier '{id}'"))?;
            match kind.decode(registry.options(), &text, from) {
                Ok(value) => DecodedMessage {
                    message_id: kind.message_id,
                    value,
                },
                Err(error) => {
                    println!("FAIL: {} is not a {id} document: {error}", args.input.display());
                    return Ok(1);
                }
            }
        }
        None => match registry.decode(&text, from) {
            Some(decoded) => decoded,
            None => {
                println!("FAIL: {} matched no known message", args.input.display());
                return Ok(1);
            }
        },
    };
    tracing::info!(message_id = decoded.message_id, %from, %to, "converting");

    let Some(output) = registry.encode(&decoded.value, to) else {
        println!("FAIL: {} could not be written as {to}", decoded.message_id);
        return Ok(1);
    };

    if args.validate {
        let markup = if from == Encoding::Markup { &text } else { &output };
        let Some(kind) = registry.find(decoded.message_id) else {
            return Ok(1);
        };
        if !markup_is_valid(&config, kind, markup)? {
            return Ok(1);
        }
    }

    match &args.output {
        Some(path) => {
            std::fs::write(path, &output).with_context(|| format!("failed to write {}", path.display()))?;
            println!("{} -> {} ({})", args.input.display(), path.display(), decoded.message_id);
        }
        None => println!("{output}"),
    }
    Ok(0)
}

fn markup_is_valid(config: &CliConfig, kind: &MessageKind, markup: &str) -> Result<bool> {
    let (mut aggregator, _) = config.aggregator();
    let qualified = qualify_markup(markup, kind.namespace).context("markup could not be prepared for validation")?;
    match aggregator.try_validate(&qualified) {
        Ok(_) => Ok(true),
        Err(error) => {
            println!("FAIL: {} markup rejected: {error}", kind.message_id);
            crate::print_events(&aggregator);
            Ok(false)
        }
    }
}
