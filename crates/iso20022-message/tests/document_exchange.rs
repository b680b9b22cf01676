//! # Document Exchange Test
//!
//! Drives the bundled pacs bindings end to end: wrappers decoding and
//! re-encoding the shipped samples under schema validation, speculative
//! decoding through the registry, and type-checked root assignment.

use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};
use iso20022_core::{resolve_concrete_type, Encoding};
use iso20022_message::pacs002::{self, TransactionStatus};
use iso20022_message::pacs008;
use iso20022_message::{
    bundled_aggregator, DocumentWrapper, MessageRegistry, Pacs002, Pacs008, TransferInstruction,
};
use iso20022_schema::ValidationPolicy;

fn repo_root() -> PathBuf {
    let mut dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    dir.pop(); // crates/
    dir.pop(); // repo root
    dir
}

fn sample(name: &str) -> String {
    let path = repo_root().join("schemas").join("iso20022").join("samples").join(name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()))
}

fn sample_instruction() -> TransferInstruction {
    TransferInstruction {
        message_id: "MSEZ-2026-001".to_string(),
        debtor_bic: "HABORAEK".to_string(),
        debtor_account: "PK36HABB0000001123456702".to_string(),
        debtor_name: "Momentum SEZ Operator PKR".to_string(),
        creditor_bic: "EMIRAEAA".to_string(),
        creditor_account: "AE070331234567890123456".to_string(),
        creditor_name: "Momentum SEZ Operator AED".to_string(),
        amount: 100000,
        currency: "USD".to_string(),
        remittance_info: Some("Corridor settlement PK-RSEZ/AE-DIFC".to_string()),
    }
}

fn created() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 3, 14)
        .and_then(|d| d.and_hms_opt(9, 30, 0))
        .unwrap()
}

fn validated<D: iso20022_message::MessageDefinition>() -> DocumentWrapper<D> {
    let mut wrapper = DocumentWrapper::<D>::new().unwrap();
    wrapper.attach_schemas(bundled_aggregator(ValidationPolicy::strict()));
    wrapper
}

// ---------------------------------------------------------------------------
// 1. Validated round trip of the shipped sample
// ---------------------------------------------------------------------------

#[test]
fn sample_credit_transfer_round_trips_under_validation() {
    let mut wrapper = validated::<Pacs008>();
    assert!(wrapper.uses_validation());
    assert!(wrapper.deserialize(&sample("pacs.008.xml"), Encoding::Markup));

    let expected = pacs008::Document::from_instruction(&sample_instruction(), "MSEZSEXX", created()).unwrap();
    assert_eq!(wrapper.root(), Some(&expected));
    assert_eq!(
        wrapper.message().map(|m| m.group_header.message_id.as_str()),
        Some("MSEZ-2026-001")
    );

    let markup = wrapper.serialize(Encoding::Markup).expect("validated markup");
    assert!(markup.starts_with("<Document><FIToFICstmrCdtTrf>"));
    let json = wrapper.serialize(Encoding::ObjectNotation).unwrap();

    let mut from_json = DocumentWrapper::<Pacs008>::new().unwrap();
    assert!(from_json.deserialize(&json, Encoding::ObjectNotation));
    assert_eq!(from_json.root(), wrapper.root());

    let schemas = wrapper.schemas().unwrap();
    assert!(schemas.events().is_empty(), "{:?}", schemas.events());
}

#[test]
fn status_report_sample_validates() {
    let mut wrapper = validated::<Pacs002>();
    assert!(wrapper.deserialize(&sample("pacs.002.xml"), Encoding::Markup));
    let report = wrapper.message().unwrap();
    let tx = &report.transactions[0];
    assert_eq!(tx.status, Some(TransactionStatus::Rejected));
    assert_eq!(tx.reasons[0].additional_information, ["Creditor account closed"]);
    assert!(wrapper.serialize(Encoding::Markup).is_some());
}

// ---------------------------------------------------------------------------
// 2. Validation rejects and leaves the root alone
// ---------------------------------------------------------------------------

#[test]
fn invalid_markup_is_rejected_and_root_kept() {
    let mut wrapper = validated::<Pacs008>();
    assert!(wrapper.deserialize(&sample("pacs.008.xml"), Encoding::Markup));
    let before = wrapper.root().cloned();

    assert!(wrapper
        .try_deserialize(&sample("pacs.008.invalid.xml"), Encoding::Markup)
        .is_err());
    assert!(!wrapper.deserialize(&sample("pacs.008.invalid.xml"), Encoding::Markup));
    assert_eq!(wrapper.root().cloned(), before);
}

#[test]
fn validation_can_be_switched_off() {
    let mut wrapper = validated::<Pacs008>();
    let overlong = sample("pacs.008.xml").replace("MSEZ-2026-001</MsgId>", &format!("{}</MsgId>", "X".repeat(40)));
    assert!(!wrapper.deserialize(&overlong, Encoding::Markup));
    assert!(wrapper.schemas().unwrap().has_errors());

    wrapper.set_use_validation(false);
    assert!(!wrapper.uses_validation());
    assert!(wrapper.deserialize(&overlong, Encoding::Markup));
    assert!(wrapper.serialize(Encoding::Markup).is_some());

    wrapper.set_use_validation(true);
    assert_eq!(wrapper.serialize(Encoding::Markup), None);
    assert!(wrapper.serialize(Encoding::ObjectNotation).is_some());
}

#[test]
fn status_report_built_from_transfer_validates() {
    let transfer = pacs008::Document::from_instruction(&sample_instruction(), "MSEZSEXX", created()).unwrap();
    let report = pacs002::Document::respond_to(
        &transfer,
        "STS-MSEZ-2026-001",
        created(),
        TransactionStatus::Rejected,
        Some("AC04"),
    );
    let mut wrapper = validated::<Pacs002>();
    wrapper.set_root(report);
    let markup = wrapper.serialize(Encoding::Markup);
    assert!(markup.is_some(), "{:?}", wrapper.schemas().map(|s| s.events()));
}

// ---------------------------------------------------------------------------
// 3. Speculative decode and root assignment
// ---------------------------------------------------------------------------

#[test]
fn registry_routes_each_sample_to_its_binding() {
    let registry = MessageRegistry::bundled();

    let transfer = registry.decode(&sample("pacs.008.xml"), Encoding::Markup).unwrap();
    assert_eq!(transfer.message_id, pacs008::MESSAGE_ID);
    let token = resolve_concrete_type(Some(&transfer.value)).unwrap();
    assert!(token.is::<pacs008::Document>());

    let mut status = DocumentWrapper::<Pacs002>::new().unwrap();
    assert!(!status.assign_root(transfer.value));
    assert!(status.root().is_none());

    let report = registry.decode(&sample("pacs.002.xml"), Encoding::Markup).unwrap();
    assert_eq!(report.message_id, pacs002::MESSAGE_ID);
    assert!(status.assign_root(report.value));
    assert_eq!(
        status.message().map(|m| m.group_header.message_id.as_str()),
        Some("STS-MSEZ-2026-001")
    );
}

#[test]
fn registry_decodes_object_notation_of_either_kind() {
    let registry = MessageRegistry::bundled();
    let mut wrapper = DocumentWrapper::<Pacs008>::new().unwrap();
    assert!(wrapper.deserialize(&sample("pacs.008.xml"), Encoding::Markup));
    let json = wrapper.serialize(Encoding::ObjectNotation).unwrap();

    let decoded = registry.decode(&json, Encoding::ObjectNotation).unwrap();
    assert_eq!(decoded.message_id, pacs008::MESSAGE_ID);
    assert_eq!(decoded.value.downcast_ref::<pacs008::Document>(), wrapper.root());

    assert!(registry.decode(r#"{"Other":{}}"#, Encoding::ObjectNotation).is_none());
    assert!(registry.decode("", Encoding::Markup).is_none());
}
