//! # iso20022-core — Foundational Types for ISO 20022 Exchange
//!
//! Leaf crate of the workspace. Every other `iso20022-*` crate depends on it;
//! it depends on nothing internal.
//!
//! ## Contents
//!
//! - [`Encoding`] — the two wire encodings a document can be carried in.
//!   Encoded text is never self-describing: callers always state which
//!   encoding a blob is in.
//! - [`markup`] — a small owned element tree over `quick-xml` events, with
//!   namespace resolution and line/column tracking. The codec uses it to
//!   rewrite namespace declarations; the schema engine validates against it.
//! - [`TypeToken`], [`OpaqueValue`], [`resolve_concrete_type`] — runtime type
//!   identity for values that arrive type-erased.
//! - [`ConfigurationError`], [`MarkupError`] — the shared error types.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `iso20022-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod encoding;
pub mod error;
pub mod markup;
pub mod resolve;

pub use encoding::Encoding;
pub use error::{ConfigurationError, MarkupError, UnknownEncoding};
pub use markup::{parse_document, SourceLocation, XmlAttribute, XmlElement, XmlNode, MAX_DEPTH};
pub use resolve::{resolve_concrete_type, OpaqueValue, TypeToken};
