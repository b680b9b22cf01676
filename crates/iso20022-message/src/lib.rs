//! # iso20022-message — Document Wrappers & Message Bindings
//!
//! Ties the codec and the schema aggregate to concrete ISO 20022 messages.
//!
//! ## Definitions & Wrappers
//!
//! A [`MessageDefinition`] names a message's root document type, the
//! message embedded in it, its identifier and its namespace.
//! [`DocumentWrapper`] holds one root of a definition, derives the message
//! view from it, and moves it through the codec, optionally validating
//! markup against an attached [`SchemaAggregator`](iso20022_schema::SchemaAggregator).
//!
//! ## Registry
//!
//! [`MessageRegistry`] decodes input whose message type is unknown by trying
//! each registered definition in turn.
//!
//! ## Bundled Bindings
//!
//! - [`pacs008`]: FI to FI Customer Credit Transfer, version 10.
//! - [`pacs002`]: FI to FI Payment Status Report, version 12.
//!
//! Their schemas are compiled in; see [`bundled_aggregator`].

pub mod bundled;
pub mod common;
pub mod definition;
pub mod error;
pub mod pacs002;
pub mod pacs008;
pub mod registry;
pub mod wrapper;

pub use bundled::{bundled_aggregator, BUNDLED_SCHEMAS};
pub use common::{Agent, CurrencyAmount, FinancialInstitution, Party};
pub use definition::{default_constructor, MessageDefinition, RootConstructor};
pub use error::MessageError;
pub use pacs002::Pacs002;
pub use pacs008::{Pacs008, TransferInstruction};
pub use registry::{DecodedMessage, MessageKind, MessageRegistry};
pub use wrapper::DocumentWrapper;
