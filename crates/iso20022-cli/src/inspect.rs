//! # Inspect Subcommand
//!
//! Summarizes a document of a known message kind. Without a document,
//! lists the registered message kinds and the loaded schema definitions.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use iso20022_core::{resolve_concrete_type, Encoding, OpaqueValue};
use iso20022_message::{pacs002, pacs008, MessageRegistry};

use crate::config::{CliConfig, SchemaArgs};

/// Arguments for the `iso20022 inspect` subcommand.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Document to summarize (`-` for standard input).
    #[arg(value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Encoding of the document; taken from the file extension when omitted.
    #[arg(long, value_name = "ENCODING")]
    pub encoding: Option<Encoding>,

    #[command(flatten)]
    pub schemas: SchemaArgs,
}

/// Execute the inspect subcommand.
///
/// Returns exit code: 0 on success, 1 when the document is not a known
/// message.
pub fn run_inspect(args: &InspectArgs, config: &CliConfig) -> Result<u8> {
    let mut config = config.clone();
    args.schemas.apply(&mut config);
    let mut registry = MessageRegistry::bundled();
    registry.set_options(config.codec.clone());

    let Some(input) = &args.input else {
        list_catalog(&registry, &config);
        return Ok(0);
    };

    let encoding = crate::input_encoding(input, args.encoding)?;
    let text = crate::read_input(input)?;
    let Some(decoded) = registry.decode(&text, encoding) else {
        println!("FAIL: {} matched no known message", input.display());
        return Ok(1);
    };

    println!("Message: {}", decoded.message_id);
    if let Some(kind) = registry.find(decoded.message_id) {
        println!("Namespace: {}", kind.namespace);
    }
    if let Some(token) = resolve_concrete_type(Some(&decoded.value)) {
        println!("Root type: {}", token.short_name());
    }
    for line in describe(&decoded.value) {
        println!("{line}");
    }
    Ok(0)
}

fn list_catalog(registry: &MessageRegistry, config: &CliConfig) {
    println!("Message kinds:");
    for kind in registry.kinds() {
        println!("  {}  {}", kind.message_id, kind.namespace);
    }

    let (aggregator, _) = config.aggregator();
    println!("Schemas: {} definition(s)", aggregator.definitions().len());
    for definition in aggregator.definitions() {
        println!(
            "  {}  {}",
            definition.source_name,
            definition.target_namespace.as_deref().unwrap_or("(no namespace)")
        );
    }
}

/// Human-readable summary lines for the bundled root types.
pub fn describe(value: &OpaqueValue) -> Vec<String> {
    if let Some(doc) = value.downcast_ref::<pacs008::Document>() {
        return describe_transfer(doc);
    }
    if let Some(doc) = value.downcast_ref::<pacs002::Document>() {
        return describe_status(doc);
    }
    Vec::new()
}

fn describe_transfer(doc: &pacs008::Document) -> Vec<String> {
    let header = &doc.credit_transfer.group_header;
    let mut lines = vec![
        format!("Message ID: {}", header.message_id),
        format!("Created: {}", header.created),
        format!("Settlement method: {}", header.settlement.method),
        format!("Transactions: {}", doc.credit_transfer.transactions.len()),
    ];
    for (i, tx) in doc.credit_transfer.transactions.iter().enumerate() {
        lines.push(format!(
            "  [{i}] {} {} {} -> {}",
            tx.payment_id.end_to_end_id,
            tx.amount,
            tx.debtor_agent.bic().unwrap_or("?"),
            tx.creditor_agent.bic().unwrap_or("?"),
        ));
    }
    lines
}

fn describe_status(doc: &pacs002::Document) -> Vec<String> {
    let report = &doc.status_report;
    let mut lines = vec![
        format!("Message ID: {}", report.group_header.message_id),
        format!("Created: {}", report.group_header.created),
    ];
    for group in &report.original_groups {
        lines.push(format!(
            "Original: {} ({})",
            group.original_message_id, group.original_message_name
        ));
    }
    lines.push(format!("Transactions: {}", report.transactions.len()));
    for (i, tx) in report.transactions.iter().enumerate() {
        let status = tx.status.map(|s| s.as_str()).unwrap_or("----");
        let reasons: Vec<&str> = tx
            .reasons
            .iter()
            .filter_map(|r| r.reason.as_ref())
            .filter_map(|r| r.code.as_deref().or(r.proprietary.as_deref()))
            .collect();
        let mut line = format!(
            "  [{i}] {} {status}",
            tx.original_end_to_end_id.as_deref().unwrap_or("?")
        );
        if !reasons.is_empty() {
            line.push_str(&format!(" ({})", reasons.join(", ")));
        }
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use iso20022_message::pacs002::TransactionStatus;

    #[test]
    fn transfer_summary_lists_each_transaction() {
        let mut doc = pacs008::Document::default();
        doc.credit_transfer.group_header.message_id = "MSG-1".into();
        doc.credit_transfer.transactions.push(pacs008::CreditTransferTransaction {
            payment_id: pacs008::PaymentIdentification {
                end_to_end_id: "E2E-1".into(),
                ..Default::default()
            },
            amount: iso20022_message::CurrencyAmount::from_minor_units("USD", 2550),
            debtor_agent: iso20022_message::Agent::from_bic("HABORAEK"),
            ..Default::default()
        });

        let lines = describe(&OpaqueValue::new(doc));
        assert_eq!(lines[0], "Message ID: MSG-1");
        assert!(lines.contains(&"Settlement method: INDA".to_string()));
        assert_eq!(lines.last().map(String::as_str), Some("  [0] E2E-1 25.50 USD HABORAEK -> ?"));
    }

    #[test]
    fn status_summary_shows_codes_and_reasons() {
        let original = pacs008::Document::default();
        let mut report = pacs002::Document::respond_to(
            &original,
            "STS-1",
            Default::default(),
            TransactionStatus::Rejected,
            Some("AC04"),
        );
        report.status_report.transactions.push(pacs002::TransactionStatusInformation {
            original_end_to_end_id: Some("E2E-9".into()),
            status: Some(TransactionStatus::Rejected),
            reasons: vec![pacs002::StatusReasonInformation::coded("AC04")],
            ..Default::default()
        });

        let lines = describe(&OpaqueValue::new(report));
        assert_eq!(lines[2], "Original:  (pacs.008.001.10)");
        assert_eq!(lines[3], "Transactions: 1");
        assert_eq!(lines.last().map(String::as_str), Some("  [0] E2E-9 RJCT (AC04)"));
    }

    #[test]
    fn unknown_values_have_no_summary() {
        assert!(describe(&OpaqueValue::new(42u32)).is_empty());
    }
}
