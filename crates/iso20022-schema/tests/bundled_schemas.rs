//! Integration test: the pacs message schemas shipped under `schemas/iso20022`
//! load cleanly and validate the sample instances next to them.

use std::path::PathBuf;

use iso20022_schema::{SchemaAggregator, Severity, ValidationPolicy, DEFAULT_PATTERN};
use proptest::prelude::*;

/// Find the repository root.
fn repo_root() -> PathBuf {
    let mut dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    dir.pop(); // crates/
    dir.pop(); // repo root
    dir
}

fn schema_dir() -> PathBuf {
    repo_root().join("schemas").join("iso20022")
}

fn sample(name: &str) -> String {
    let path = schema_dir().join("samples").join(name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()))
}

fn bundled(policy: ValidationPolicy) -> SchemaAggregator {
    let mut aggregator = SchemaAggregator::with_policy(policy);
    assert!(
        aggregator.add_directory(schema_dir(), DEFAULT_PATTERN, false),
        "bundled schemas failed to load from {}",
        schema_dir().display()
    );
    aggregator
}

#[test]
fn bundled_schemas_load() {
    let aggregator = bundled(ValidationPolicy::default());
    assert_eq!(aggregator.definitions().len(), 2);
    let namespaces = aggregator.target_namespaces();
    assert!(namespaces.contains(&Some("urn:iso:std:iso:20022:tech:xsd:pacs.008.001.10")));
    assert!(namespaces.contains(&Some("urn:iso:std:iso:20022:tech:xsd:pacs.002.001.12")));
}

#[test]
fn samples_validate() {
    let mut aggregator = bundled(ValidationPolicy::strict());
    for name in ["pacs.008.xml", "pacs.002.xml"] {
        assert!(
            aggregator.validate(&sample(name)).is_some(),
            "{name}: {:?}",
            aggregator.events()
        );
    }
    assert!(aggregator.events().is_empty());
}

#[test]
fn invalid_sample_reports_each_fault() {
    let mut aggregator = bundled(ValidationPolicy::default());
    assert!(aggregator.validate(&sample("pacs.008.invalid.xml")).is_none());

    let messages: Vec<_> = aggregator.errors().map(|e| e.message().to_string()).collect();
    assert_eq!(messages.len(), 3, "{messages:?}");
    assert!(messages[0].contains("NbOfTxs"));
    assert!(messages[1].contains("'Ccy'"));
    assert!(messages[2].contains("invalid child element"));
    assert!(messages[2].contains("CdtrAgt"));
    assert_eq!(aggregator.warnings().count(), 0);
}

#[test]
fn supplementary_data_is_checked_laxly() {
    let mut aggregator = bundled(ValidationPolicy::default());
    let with_extension = sample("pacs.008.xml").replace(
        "</CdtTrfTxInf>\n  </FIToFICstmrCdtTrf>",
        "</CdtTrfTxInf>\n    <SplmtryData><Envlp><Corridor xmlns=\"urn:example:corridor\">PK-AE</Corridor></Envlp></SplmtryData>\n  </FIToFICstmrCdtTrf>",
    );
    assert!(aggregator.validate(&with_extension).is_some());
    assert_eq!(aggregator.errors().count(), 0);
    assert_eq!(aggregator.warnings().count(), 1);
}

fn severity_counts(aggregator: &SchemaAggregator) -> (usize, usize) {
    let errors = aggregator
        .events()
        .iter()
        .filter(|e| e.severity() == Severity::Error)
        .count();
    (errors, aggregator.events().len() - errors)
}

proptest! {
    #[test]
    fn revalidating_canonical_output_is_stable(
        msg_id in "[A-Za-z0-9]{0,40}",
        count in "[0-9a-z]{1,16}",
        amount in "[0-9]{1,6}\\.[0-9]{0,7}",
    ) {
        let document = sample("pacs.008.xml")
            .replace("<MsgId>MSEZ-2026-001</MsgId>", &format!("<MsgId>{msg_id}</MsgId>"))
            .replace("<NbOfTxs>1</NbOfTxs>", &format!("<NbOfTxs>{count}</NbOfTxs>"))
            .replace(">1000.00<", &format!(">{amount}<"));

        let mut first = bundled(ValidationPolicy::permissive());
        let canonical = first.validate(&document);
        prop_assert!(canonical.is_some());

        let mut second = bundled(ValidationPolicy::permissive());
        let again = second.validate(canonical.as_deref().unwrap_or_default());
        prop_assert_eq!(again.as_deref(), canonical.as_deref());
        prop_assert_eq!(severity_counts(&first), severity_counts(&second));
    }
}
