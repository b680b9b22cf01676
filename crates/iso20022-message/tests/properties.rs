//! Property tests over generated credit transfers: validated round trips
//! through the wrapper in both encodings, and failed decodes never touching
//! the current root.

use chrono::{NaiveDate, NaiveDateTime};
use iso20022_core::Encoding;
use iso20022_message::pacs008::{self, Document};
use iso20022_message::{bundled_aggregator, DocumentWrapper, Pacs008, TransferInstruction};
use iso20022_schema::ValidationPolicy;
use proptest::prelude::*;

fn name() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9 &<>'\"./-]{0,60}[A-Za-z0-9]"
}

fn bic() -> impl Strategy<Value = String> {
    prop_oneof!["[A-Z]{6}[A-Z0-9]{2}", "[A-Z]{6}[A-Z0-9]{5}"]
}

fn account() -> impl Strategy<Value = String> {
    prop_oneof!["[A-Z]{2}[0-9]{2}[A-Z0-9]{10,26}", "ACCT-[0-9]{1,12}"]
}

fn instruction() -> impl Strategy<Value = TransferInstruction> {
    (
        "[A-Za-z0-9][A-Za-z0-9-]{0,34}",
        (bic(), account(), name()),
        (bic(), account(), name()),
        1i64..1_000_000_000_000,
        prop::sample::select(vec!["USD", "EUR", "AED", "PKR", "JPY", "BHD"]),
        proptest::option::of(name()),
    )
        .prop_map(
            |(message_id, (debtor_bic, debtor_account, debtor_name), (creditor_bic, creditor_account, creditor_name), amount, currency, remittance_info)| {
                TransferInstruction {
                    message_id,
                    debtor_bic,
                    debtor_account,
                    debtor_name,
                    creditor_bic,
                    creditor_account,
                    creditor_name,
                    amount,
                    currency: currency.to_string(),
                    remittance_info,
                }
            },
        )
}

fn created() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 3, 14)
        .and_then(|d| d.and_hms_opt(9, 30, 0))
        .unwrap_or_default()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn generated_transfers_round_trip_under_validation(instr in instruction()) {
        let doc = Document::from_instruction(&instr, "MSEZSEXX", created());
        prop_assert!(doc.is_ok(), "{:?}", doc);
        let doc = doc.unwrap_or_default();

        let mut sender = DocumentWrapper::<Pacs008>::new().unwrap();
        sender.attach_schemas(bundled_aggregator(ValidationPolicy::strict()));
        sender.set_root(doc.clone());

        for encoding in Encoding::all() {
            let text = sender.serialize(*encoding);
            prop_assert!(text.is_some(), "{}: {:?}", encoding, sender.schemas().map(|s| s.events()));

            let mut receiver = DocumentWrapper::<Pacs008>::new().unwrap();
            receiver.attach_schemas(bundled_aggregator(ValidationPolicy::strict()));
            prop_assert!(receiver.deserialize(text.as_deref().unwrap_or_default(), *encoding));
            prop_assert_eq!(receiver.root(), Some(&doc));
        }
    }

    #[test]
    fn failed_decode_keeps_the_root(instr in instruction(), junk in "[ \t\r\n]{0,4}|[a-z<>{}\\[\\]]{1,12}") {
        let doc = Document::from_instruction(&instr, "MSEZSEXX", created()).unwrap_or_default();
        let mut wrapper = DocumentWrapper::<Pacs008>::new().unwrap();
        wrapper.set_root(doc.clone());

        for encoding in Encoding::all() {
            prop_assert!(!wrapper.deserialize(&junk, *encoding));
            prop_assert_eq!(wrapper.root(), Some(&doc));
        }
        prop_assert_eq!(
            wrapper.message().map(|m| m.group_header.message_id.as_str()),
            Some(instr.message_id.as_str())
        );
    }
}

#[test]
fn every_bundled_currency_fits_the_amount_facets() {
    for (currency, minor) in [("USD", 1i64), ("JPY", 999_999_999_999), ("BHD", 1_000_001)] {
        let instruction = TransferInstruction {
            message_id: "FACETS-1".into(),
            debtor_bic: "HABORAEK".into(),
            debtor_account: "ACCT-1".into(),
            debtor_name: "Debtor".into(),
            creditor_bic: "EMIRAEAA".into(),
            creditor_account: "ACCT-2".into(),
            creditor_name: "Creditor".into(),
            amount: minor,
            currency: currency.into(),
            remittance_info: None,
        };
        let mut wrapper = DocumentWrapper::<Pacs008>::new().unwrap();
        wrapper.attach_schemas(bundled_aggregator(ValidationPolicy::strict()));
        wrapper.set_root(Document::from_instruction(&instruction, "MSEZSEXX", created()).unwrap());
        assert!(wrapper.serialize(Encoding::Markup).is_some(), "{currency}");
        assert_eq!(
            wrapper.message().unwrap().transactions[0].remittance.as_ref().unwrap().unstructured,
            [pacs008::DEFAULT_REMITTANCE]
        );
    }
}
