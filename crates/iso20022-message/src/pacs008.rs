//! # pacs.008 — FI to FI Customer Credit Transfer
//!
//! Binding for `pacs.008.001.10` (FIToFICustomerCreditTransferV10), the
//! interbank leg of a customer payment.
//!
//! ## Structure
//!
//! - **GroupHeader**: message ID, creation timestamp, number of
//!   transactions, settlement method, instructing agent.
//! - **CreditTransferTransaction** (one or more): payment identification,
//!   settlement amount and currency, charge bearer, debtor and creditor
//!   with their agents and accounts, remittance information.
//!
//! [`Document::from_instruction`] builds a single-transaction message from
//! a flat [`TransferInstruction`].

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::common::{iso_code, validate_bic, Agent, CurrencyAmount, Party};
use crate::definition::{default_constructor, MessageDefinition, RootConstructor};
use crate::error::MessageError;

pub const MESSAGE_ID: &str = "pacs.008.001.10";
pub const NAMESPACE: &str = "urn:iso:std:iso:20022:tech:xsd:pacs.008.001.10";

/// Remittance text used when an instruction carries none.
pub const DEFAULT_REMITTANCE: &str = "Corridor settlement";

iso_code! {
    /// `SettlementMethod1Code`.
    SettlementMethod ("SettlementMethod1Code") {
        /// Settlement through the instructed agent's account.
        InstructedAgent => "INDA",
        /// Settlement through the instructing agent's account.
        InstructingAgent => "INGA",
        /// Cover payment.
        Cover => "COVE",
        /// Clearing system.
        Clearing => "CLRG",
    }
}

impl Default for SettlementMethod {
    fn default() -> Self {
        Self::InstructedAgent
    }
}

iso_code! {
    /// `ChargeBearerType1Code`.
    ChargeBearer ("ChargeBearerType1Code") {
        /// Borne by the debtor.
        Debtor => "DEBT",
        /// Borne by the creditor.
        Creditor => "CRED",
        /// Shared.
        Shared => "SHAR",
        /// Following the service level.
        ServiceLevel => "SLEV",
    }
}

impl Default for ChargeBearer {
    fn default() -> Self {
        Self::Shared
    }
}

/// Root of a pacs.008 document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "Document")]
pub struct Document {
    #[serde(rename = "FIToFICstmrCdtTrf")]
    pub credit_transfer: CreditTransfer,
}

/// `FIToFICustomerCreditTransferV10`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreditTransfer {
    #[serde(rename = "GrpHdr")]
    pub group_header: GroupHeader,
    #[serde(rename = "CdtTrfTxInf", skip_serializing_if = "Vec::is_empty")]
    pub transactions: Vec<CreditTransferTransaction>,
}

/// `GroupHeader96`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupHeader {
    #[serde(rename = "MsgId")]
    pub message_id: String,
    #[serde(rename = "CreDtTm")]
    pub created: NaiveDateTime,
    #[serde(rename = "NbOfTxs")]
    pub transaction_count: String,
    #[serde(rename = "TtlIntrBkSttlmAmt", skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<CurrencyAmount>,
    #[serde(rename = "IntrBkSttlmDt", skip_serializing_if = "Option::is_none")]
    pub settlement_date: Option<NaiveDate>,
    #[serde(rename = "SttlmInf")]
    pub settlement: SettlementInformation,
    #[serde(rename = "InstgAgt", skip_serializing_if = "Option::is_none")]
    pub instructing_agent: Option<Agent>,
    #[serde(rename = "InstdAgt", skip_serializing_if = "Option::is_none")]
    pub instructed_agent: Option<Agent>,
}

/// `SettlementInstruction11`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettlementInformation {
    #[serde(rename = "SttlmMtd")]
    pub method: SettlementMethod,
    #[serde(rename = "SttlmAcct", skip_serializing_if = "Option::is_none")]
    pub account: Option<CashAccount>,
}

/// `CreditTransferTransaction50`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreditTransferTransaction {
    #[serde(rename = "PmtId")]
    pub payment_id: PaymentIdentification,
    #[serde(rename = "IntrBkSttlmAmt")]
    pub amount: CurrencyAmount,
    #[serde(rename = "IntrBkSttlmDt", skip_serializing_if = "Option::is_none")]
    pub settlement_date: Option<NaiveDate>,
    #[serde(rename = "ChrgBr")]
    pub charge_bearer: ChargeBearer,
    #[serde(rename = "InstgAgt", skip_serializing_if = "Option::is_none")]
    pub instructing_agent: Option<Agent>,
    #[serde(rename = "InstdAgt", skip_serializing_if = "Option::is_none")]
    pub instructed_agent: Option<Agent>,
    #[serde(rename = "Dbtr")]
    pub debtor: Party,
    #[serde(rename = "DbtrAcct", skip_serializing_if = "Option::is_none")]
    pub debtor_account: Option<CashAccount>,
    #[serde(rename = "DbtrAgt")]
    pub debtor_agent: Agent,
    #[serde(rename = "CdtrAgt")]
    pub creditor_agent: Agent,
    #[serde(rename = "Cdtr")]
    pub creditor: Party,
    #[serde(rename = "CdtrAcct", skip_serializing_if = "Option::is_none")]
    pub creditor_account: Option<CashAccount>,
    #[serde(rename = "RmtInf", skip_serializing_if = "Option::is_none")]
    pub remittance: Option<RemittanceInformation>,
}

/// `PaymentIdentification13`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentIdentification {
    #[serde(rename = "InstrId", skip_serializing_if = "Option::is_none")]
    pub instruction_id: Option<String>,
    #[serde(rename = "EndToEndId")]
    pub end_to_end_id: String,
    #[serde(rename = "TxId", skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(rename = "UETR", skip_serializing_if = "Option::is_none")]
    pub uetr: Option<String>,
}

/// `CashAccount40`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CashAccount {
    #[serde(rename = "Id", skip_serializing_if = "Option::is_none")]
    pub id: Option<AccountIdentification>,
    #[serde(rename = "Ccy", skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(rename = "Nm", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl CashAccount {
    /// An account identified by IBAN when `id` looks like one (two
    /// letters, two digits), otherwise by a proprietary identifier.
    pub fn identified_by(id: impl Into<String>) -> Self {
        let id = id.into();
        let bytes = id.as_bytes();
        let is_iban = bytes.len() > 4
            && bytes[..2].iter().all(u8::is_ascii_uppercase)
            && bytes[2..4].iter().all(u8::is_ascii_digit)
            && bytes.iter().all(u8::is_ascii_alphanumeric);
        let identification = if is_iban {
            AccountIdentification {
                iban: Some(id),
                other: None,
            }
        } else {
            AccountIdentification {
                iban: None,
                other: Some(GenericAccountIdentification { id }),
            }
        };
        Self {
            id: Some(identification),
            ..Self::default()
        }
    }

    /// The IBAN or proprietary identifier, whichever is present.
    pub fn identifier(&self) -> Option<&str> {
        let id = self.id.as_ref()?;
        id.iban
            .as_deref()
            .or_else(|| id.other.as_ref().map(|o| o.id.as_str()))
    }
}

/// `AccountIdentification4Choice`: exactly one member is present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountIdentification {
    #[serde(rename = "IBAN", skip_serializing_if = "Option::is_none")]
    pub iban: Option<String>,
    #[serde(rename = "Othr", skip_serializing_if = "Option::is_none")]
    pub other: Option<GenericAccountIdentification>,
}

/// `GenericAccountIdentification1`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenericAccountIdentification {
    #[serde(rename = "Id")]
    pub id: String,
}

/// `RemittanceInformation21`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemittanceInformation {
    #[serde(rename = "Ustrd", skip_serializing_if = "Vec::is_empty")]
    pub unstructured: Vec<String>,
}

/// A single credit transfer in flat form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferInstruction {
    /// Unique message identifier, reused as instruction and end-to-end ID.
    pub message_id: String,
    /// Debtor (paying) institution BIC.
    pub debtor_bic: String,
    /// Debtor account identifier (IBAN or proprietary).
    pub debtor_account: String,
    pub debtor_name: String,
    /// Creditor (receiving) institution BIC.
    pub creditor_bic: String,
    /// Creditor account identifier (IBAN or proprietary).
    pub creditor_account: String,
    pub creditor_name: String,
    /// Settlement amount in the currency's minor unit.
    pub amount: i64,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Payment reference; [`DEFAULT_REMITTANCE`] when absent.
    pub remittance_info: Option<String>,
}

impl Document {
    /// Build a single-transaction pacs.008 from a flat instruction.
    ///
    /// # Errors
    ///
    /// `MessageError::InvalidBic` for a malformed debtor, creditor or
    /// instructing agent BIC; `InvalidAmount` for a non-positive amount;
    /// `MissingField` for an empty message ID.
    pub fn from_instruction(
        instruction: &TransferInstruction,
        instructing_agent_bic: &str,
        created: NaiveDateTime,
    ) -> Result<Self, MessageError> {
        validate_bic(instructing_agent_bic)?;
        validate_bic(&instruction.debtor_bic)?;
        validate_bic(&instruction.creditor_bic)?;

        if instruction.amount <= 0 {
            return Err(MessageError::InvalidAmount(format!(
                "amount must be positive, got {}",
                instruction.amount
            )));
        }
        if instruction.message_id.is_empty() {
            return Err(MessageError::MissingField("message_id"));
        }

        let remittance = instruction
            .remittance_info
            .clone()
            .unwrap_or_else(|| DEFAULT_REMITTANCE.to_string());

        let transaction = CreditTransferTransaction {
            payment_id: PaymentIdentification {
                instruction_id: Some(instruction.message_id.clone()),
                end_to_end_id: instruction.message_id.clone(),
                ..PaymentIdentification::default()
            },
            amount: CurrencyAmount::from_minor_units(&instruction.currency, instruction.amount),
            charge_bearer: ChargeBearer::Shared,
            debtor: Party::named(&instruction.debtor_name),
            debtor_account: Some(CashAccount::identified_by(&instruction.debtor_account)),
            debtor_agent: Agent::from_bic(instruction.debtor_bic.trim()),
            creditor_agent: Agent::from_bic(instruction.creditor_bic.trim()),
            creditor: Party::named(&instruction.creditor_name),
            creditor_account: Some(CashAccount::identified_by(&instruction.creditor_account)),
            remittance: Some(RemittanceInformation {
                unstructured: vec![remittance],
            }),
            ..CreditTransferTransaction::default()
        };

        Ok(Self {
            credit_transfer: CreditTransfer {
                group_header: GroupHeader {
                    message_id: instruction.message_id.clone(),
                    created,
                    transaction_count: "1".to_string(),
                    settlement: SettlementInformation::default(),
                    instructing_agent: Some(Agent::from_bic(instructing_agent_bic.trim())),
                    ..GroupHeader::default()
                },
                transactions: vec![transaction],
            },
        })
    }
}

/// Binding of `pacs.008.001.10`.
#[derive(Debug, Clone, Copy)]
pub struct Pacs008;

impl MessageDefinition for Pacs008 {
    type Root = Document;
    type Message = CreditTransfer;
    const MESSAGE_ID: &'static str = MESSAGE_ID;
    const NAMESPACE: &'static str = NAMESPACE;

    fn constructor() -> Option<RootConstructor<Document>> {
        default_constructor()
    }

    fn message(root: &Document) -> Option<&CreditTransfer> {
        Some(&root.credit_transfer)
    }
}
