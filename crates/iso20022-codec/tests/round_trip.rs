//! Property tests: values survive serialize → deserialize in both
//! encodings, and blank input never reaches a parser.

use iso20022_codec::{Codec, CodecOptions, MarkupOptions};
use iso20022_core::Encoding;
use proptest::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename = "Document")]
struct Document {
    #[serde(rename = "StsRpt")]
    report: StatusReport,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct StatusReport {
    #[serde(rename = "MsgId")]
    message_id: String,
    #[serde(rename = "Agt", skip_serializing_if = "Option::is_none")]
    agent: Option<Agent>,
    #[serde(rename = "Amt", skip_serializing_if = "Option::is_none")]
    amount: Option<Amount>,
    #[serde(rename = "AddtlInf", skip_serializing_if = "Vec::is_empty")]
    notes: Vec<String>,
    #[serde(rename = "Accptd")]
    accepted: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct Agent {
    #[serde(rename = "BICFI")]
    bic: String,
    #[serde(rename = "Nm", skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Amount {
    #[serde(rename = "@Ccy")]
    currency: String,
    #[serde(rename = "$text")]
    value: u64,
}

/// Text without leading or trailing whitespace, with the characters markup
/// has to escape mixed in.
fn text() -> impl Strategy<Value = String> {
    "[A-Za-z0-9][A-Za-z0-9 &<>'\"/.-]{0,24}[A-Za-z0-9]"
}

fn agent() -> impl Strategy<Value = Agent> {
    ("[A-Z]{6}[A-Z0-9]{2}", proptest::option::of(text())).prop_map(|(bic, name)| Agent { bic, name })
}

fn amount() -> impl Strategy<Value = Amount> {
    ("[A-Z]{3}", any::<u64>()).prop_map(|(currency, value)| Amount { currency, value })
}

fn document() -> impl Strategy<Value = Document> {
    (
        text(),
        proptest::option::of(agent()),
        proptest::option::of(amount()),
        proptest::collection::vec(text(), 0..4),
        any::<bool>(),
    )
        .prop_map(|(message_id, agent, amount, notes, accepted)| Document {
            report: StatusReport {
                message_id,
                agent,
                amount,
                notes,
                accepted,
            },
        })
}

fn codecs() -> Vec<Codec> {
    let mut with_namespace = CodecOptions {
        markup: MarkupOptions::with_namespace("urn:iso:std:iso:20022:tech:xsd:pacs.002.001.12"),
        ..CodecOptions::default()
    };
    with_namespace.markup.byte_order_mark = true;
    vec![Codec::default(), Codec::new(with_namespace)]
}

proptest! {
    #[test]
    fn round_trips_in_every_encoding(doc in document()) {
        for codec in codecs() {
            for encoding in Encoding::all() {
                let text = codec.serialize(Some(&doc), *encoding);
                prop_assert!(text.is_some(), "{} failed to serialize", encoding);
                let text = text.unwrap_or_default();
                let back: Option<Document> = codec.deserialize(&text, *encoding);
                prop_assert_eq!(back.as_ref(), Some(&doc), "{} text: {}", encoding, text);

                let bytes: Option<Document> = codec.deserialize_bytes(text.as_bytes(), *encoding);
                prop_assert_eq!(bytes.as_ref(), Some(&doc));
            }
        }
    }

    #[test]
    fn blank_input_returns_nothing(blank in "[ \t\r\n]{0,8}") {
        let codec = Codec::default();
        for encoding in Encoding::all() {
            prop_assert_eq!(codec.deserialize::<Document>(&blank, *encoding), None);
            prop_assert_eq!(codec.deserialize::<StatusReport>(&blank, *encoding), None);
            prop_assert_eq!(codec.deserialize::<String>(&blank, *encoding), None);
            prop_assert_eq!(codec.deserialize_or_default::<Agent>(&blank, *encoding), Agent::default());
        }
    }
}

#[test]
fn markup_output_has_no_declaration_or_indentation() {
    let doc = Document {
        report: StatusReport {
            message_id: "STS-1".into(),
            notes: vec!["a".into(), "b".into()],
            ..StatusReport::default()
        },
    };
    let text = Codec::default().serialize(Some(&doc), Encoding::Markup).unwrap();
    assert_eq!(
        text,
        "<Document><StsRpt><MsgId>STS-1</MsgId><AddtlInf>a</AddtlInf><AddtlInf>b</AddtlInf><Accptd>false</Accptd></StsRpt></Document>"
    );
}

#[test]
fn wrong_type_is_no_result() {
    let codec = Codec::default();
    let agent = Agent {
        bic: "HABORAEK".into(),
        name: None,
    };
    let text = codec.serialize(Some(&agent), Encoding::Markup).unwrap();
    assert_eq!(codec.deserialize::<Document>(&text, Encoding::Markup), None);

    let json = codec.serialize(Some(&agent), Encoding::ObjectNotation).unwrap();
    assert_eq!(codec.deserialize::<Document>(&json, Encoding::ObjectNotation), None);
}

#[test]
fn runaway_nesting_is_no_result() {
    let codec = Codec::default();
    let deep = format!(
        "<Document>{}{}</Document>",
        "<StsRpt>".repeat(20_000),
        "</StsRpt>".repeat(20_000)
    );
    assert_eq!(codec.deserialize::<Document>(&deep, Encoding::Markup), None);
}
