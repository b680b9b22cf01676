//! # pacs.002 — FI to FI Payment Status Report
//!
//! Binding for `pacs.002.001.12`, the status answer an instructed agent
//! sends back for a pacs.008.
//!
//! [`Document::respond_to`] builds the report for every transaction of a
//! credit transfer, echoing the original identifiers.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::common::{iso_code, Agent, Party};
use crate::definition::{default_constructor, MessageDefinition, RootConstructor};
use crate::pacs008;

pub const MESSAGE_ID: &str = "pacs.002.001.12";
pub const NAMESPACE: &str = "urn:iso:std:iso:20022:tech:xsd:pacs.002.001.12";

iso_code! {
    /// `ExternalPaymentTransactionStatus1Code`, the subset in use.
    TransactionStatus ("ExternalPaymentTransactionStatus1Code") {
        /// Accepted technical validation.
        AcceptedTechnicalValidation => "ACTC",
        /// Accepted customer profile.
        AcceptedCustomerProfile => "ACCP",
        /// Accepted settlement in process.
        AcceptedSettlementInProcess => "ACSP",
        /// Accepted settlement completed.
        AcceptedSettlementCompleted => "ACSC",
        /// Accepted with change.
        AcceptedWithChange => "ACWC",
        /// Accepted credit settlement completed.
        AcceptedCreditSettlementCompleted => "ACCC",
        Pending => "PDNG",
        Rejected => "RJCT",
        Blocked => "BLCK",
    }
}

impl TransactionStatus {
    /// No further status report follows this one.
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            Self::AcceptedSettlementCompleted
                | Self::AcceptedCreditSettlementCompleted
                | Self::Rejected
                | Self::Blocked
        )
    }

    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected | Self::Blocked)
    }
}

/// Root of a pacs.002 document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "Document")]
pub struct Document {
    #[serde(rename = "FIToFIPmtStsRpt")]
    pub status_report: PaymentStatusReport,
}

/// `FIToFIPaymentStatusReportV12`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentStatusReport {
    #[serde(rename = "GrpHdr")]
    pub group_header: StatusGroupHeader,
    #[serde(rename = "OrgnlGrpInfAndSts", skip_serializing_if = "Vec::is_empty")]
    pub original_groups: Vec<OriginalGroupInformation>,
    #[serde(rename = "TxInfAndSts", skip_serializing_if = "Vec::is_empty")]
    pub transactions: Vec<TransactionStatusInformation>,
}

/// `GroupHeader101`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusGroupHeader {
    #[serde(rename = "MsgId")]
    pub message_id: String,
    #[serde(rename = "CreDtTm")]
    pub created: NaiveDateTime,
    #[serde(rename = "InstgAgt", skip_serializing_if = "Option::is_none")]
    pub instructing_agent: Option<Agent>,
    #[serde(rename = "InstdAgt", skip_serializing_if = "Option::is_none")]
    pub instructed_agent: Option<Agent>,
}

/// `OriginalGroupHeader17`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OriginalGroupInformation {
    #[serde(rename = "OrgnlMsgId")]
    pub original_message_id: String,
    #[serde(rename = "OrgnlMsgNmId")]
    pub original_message_name: String,
    #[serde(rename = "OrgnlCreDtTm", skip_serializing_if = "Option::is_none")]
    pub original_created: Option<NaiveDateTime>,
    #[serde(rename = "GrpSts", skip_serializing_if = "Option::is_none")]
    pub group_status: Option<TransactionStatus>,
    #[serde(rename = "StsRsnInf", skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<StatusReasonInformation>,
}

/// `PaymentTransaction130`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionStatusInformation {
    #[serde(rename = "StsId", skip_serializing_if = "Option::is_none")]
    pub status_id: Option<String>,
    #[serde(rename = "OrgnlInstrId", skip_serializing_if = "Option::is_none")]
    pub original_instruction_id: Option<String>,
    #[serde(rename = "OrgnlEndToEndId", skip_serializing_if = "Option::is_none")]
    pub original_end_to_end_id: Option<String>,
    #[serde(rename = "OrgnlTxId", skip_serializing_if = "Option::is_none")]
    pub original_transaction_id: Option<String>,
    #[serde(rename = "OrgnlUETR", skip_serializing_if = "Option::is_none")]
    pub original_uetr: Option<String>,
    #[serde(rename = "TxSts", skip_serializing_if = "Option::is_none")]
    pub status: Option<TransactionStatus>,
    #[serde(rename = "StsRsnInf", skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<StatusReasonInformation>,
    #[serde(rename = "AccptncDtTm", skip_serializing_if = "Option::is_none")]
    pub accepted_at: Option<NaiveDateTime>,
}

/// `StatusReasonInformation12`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusReasonInformation {
    #[serde(rename = "Orgtr", skip_serializing_if = "Option::is_none")]
    pub originator: Option<Party>,
    #[serde(rename = "Rsn", skip_serializing_if = "Option::is_none")]
    pub reason: Option<StatusReason>,
    #[serde(rename = "AddtlInf", skip_serializing_if = "Vec::is_empty")]
    pub additional_information: Vec<String>,
}

impl StatusReasonInformation {
    /// A reason given as an external code such as `AC04`.
    pub fn coded(code: impl Into<String>) -> Self {
        Self {
            reason: Some(StatusReason {
                code: Some(code.into()),
                proprietary: None,
            }),
            ..Self::default()
        }
    }
}

/// `StatusReason6Choice`: an external code or a proprietary reason.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusReason {
    #[serde(rename = "Cd", skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(rename = "Prtry", skip_serializing_if = "Option::is_none")]
    pub proprietary: Option<String>,
}

impl Document {
    /// Report `status` for every transaction of `original`.
    ///
    /// The instructing and instructed agents swap sides relative to the
    /// original group header. A `reason` code is attached to the group and
    /// to each transaction.
    pub fn respond_to(
        original: &pacs008::Document,
        status_message_id: impl Into<String>,
        created: NaiveDateTime,
        status: TransactionStatus,
        reason: Option<&str>,
    ) -> Self {
        let header = &original.credit_transfer.group_header;
        let reasons = || reason.map(StatusReasonInformation::coded).into_iter().collect::<Vec<_>>();

        let transactions = original
            .credit_transfer
            .transactions
            .iter()
            .map(|tx| TransactionStatusInformation {
                original_instruction_id: tx.payment_id.instruction_id.clone(),
                original_end_to_end_id: Some(tx.payment_id.end_to_end_id.clone()),
                original_transaction_id: tx.payment_id.transaction_id.clone(),
                original_uetr: tx.payment_id.uetr.clone(),
                status: Some(status),
                reasons: reasons(),
                ..TransactionStatusInformation::default()
            })
            .collect();

        Self {
            status_report: PaymentStatusReport {
                group_header: StatusGroupHeader {
                    message_id: status_message_id.into(),
                    created,
                    instructing_agent: header.instructed_agent.clone(),
                    instructed_agent: header.instructing_agent.clone(),
                },
                original_groups: vec![OriginalGroupInformation {
                    original_message_id: header.message_id.clone(),
                    original_message_name: pacs008::MESSAGE_ID.to_string(),
                    original_created: Some(header.created),
                    group_status: Some(status),
                    reasons: reasons(),
                }],
                transactions,
            },
        }
    }
}

/// Binding of `pacs.002.001.12`.
#[derive(Debug, Clone, Copy)]
pub struct Pacs002;

impl MessageDefinition for Pacs002 {
    type Root = Document;
    type Message = PaymentStatusReport;
    const MESSAGE_ID: &'static str = MESSAGE_ID;
    const NAMESPACE: &'static str = NAMESPACE;

    fn constructor() -> Option<RootConstructor<Document>> {
        default_constructor()
    }

    fn message(root: &Document) -> Option<&PaymentStatusReport> {
        Some(&root.status_report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pacs008::{CreditTransferTransaction, PaymentIdentification};
    use chrono::NaiveDate;
    use iso20022_codec::Codec;
    use iso20022_core::Encoding;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 14)
            .and_then(|d| d.and_hms_opt(hour, 0, 0))
            .unwrap()
    }

    fn original() -> pacs008::Document {
        let mut doc = pacs008::Document::default();
        let header = &mut doc.credit_transfer.group_header;
        header.message_id = "MSEZ-2026-001".into();
        header.created = at(9);
        header.transaction_count = "2".into();
        header.instructing_agent = Some(Agent::from_bic("MSEZSEXX"));
        header.instructed_agent = Some(Agent::from_bic("EMIRAEAA"));
        for id in ["E2E-1", "E2E-2"] {
            doc.credit_transfer.transactions.push(CreditTransferTransaction {
                payment_id: PaymentIdentification {
                    end_to_end_id: id.into(),
                    ..PaymentIdentification::default()
                },
                ..CreditTransferTransaction::default()
            });
        }
        doc
    }

    #[test]
    fn status_classification() {
        assert!(TransactionStatus::Rejected.is_final());
        assert!(TransactionStatus::Rejected.is_rejection());
        assert!(TransactionStatus::AcceptedSettlementCompleted.is_final());
        assert!(!TransactionStatus::AcceptedSettlementCompleted.is_rejection());
        assert!(!TransactionStatus::Pending.is_final());
        assert_eq!(TransactionStatus::all().len(), 9);
        assert_eq!("ACSC".parse::<TransactionStatus>().unwrap(), TransactionStatus::AcceptedSettlementCompleted);
    }

    #[test]
    fn report_echoes_every_transaction() {
        let report = Document::respond_to(&original(), "STS-1", at(10), TransactionStatus::Rejected, Some("AC04"));
        let rpt = &report.status_report;

        assert_eq!(rpt.group_header.message_id, "STS-1");
        assert_eq!(rpt.group_header.instructing_agent.as_ref().and_then(Agent::bic), Some("EMIRAEAA"));
        assert_eq!(rpt.group_header.instructed_agent.as_ref().and_then(Agent::bic), Some("MSEZSEXX"));

        let group = &rpt.original_groups[0];
        assert_eq!(group.original_message_id, "MSEZ-2026-001");
        assert_eq!(group.original_message_name, "pacs.008.001.10");
        assert_eq!(group.group_status, Some(TransactionStatus::Rejected));

        let ends: Vec<_> = rpt
            .transactions
            .iter()
            .filter_map(|t| t.original_end_to_end_id.as_deref())
            .collect();
        assert_eq!(ends, ["E2E-1", "E2E-2"]);
        assert!(rpt.transactions.iter().all(|t| {
            t.reasons[0].reason.as_ref().and_then(|r| r.code.as_deref()) == Some("AC04")
        }));
    }

    #[test]
    fn acceptance_without_reason_has_no_reason_blocks() {
        let report = Document::respond_to(
            &original(),
            "STS-2",
            at(10),
            TransactionStatus::AcceptedSettlementCompleted,
            None,
        );
        let xml = Codec::default().serialize(Some(&report), Encoding::Markup).unwrap();
        assert!(xml.contains("<GrpSts>ACSC</GrpSts>"));
        assert!(xml.contains("<OrgnlEndToEndId>E2E-2</OrgnlEndToEndId>"));
        assert!(!xml.contains("StsRsnInf"));
    }
}
