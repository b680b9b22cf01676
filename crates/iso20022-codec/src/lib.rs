//! # iso20022-codec — Dual-Encoding Document Codec
//!
//! One generic engine that turns any serde type into markup (XML) or
//! object-notation (JSON) text and back.
//!
//! ## Contract
//!
//! - [`Codec::serialize`] takes `Option<&T>`; `None` is "nothing to
//!   serialize", logged and answered with `None`.
//! - [`Codec::deserialize`] returns `Option<T>`. Blank input returns `None`
//!   without a parse. Malformed text, a root element that does not match
//!   `T`, or content that does not fit `T` all return `None` too, so
//!   "try decoding as X" is an ordinary call.
//! - Every fault is logged through `tracing`. The `try_*` siblings return
//!   the [`CodecError`] instead.
//!
//! ## Encodings
//!
//! - Markup: no declaration, no indentation, default namespace suppressed
//!   unless [`MarkupOptions::include_namespace`] is set, optional
//!   byte-order mark. Comments, processing instructions and insignificant
//!   whitespace are ignored on read.
//! - Object notation: compact, nulls omitted, unknown members ignored,
//!   absent members left to the type's defaults.

pub mod codec;
pub mod error;
pub mod markup;
mod object_notation;
pub mod options;
pub mod probe;

pub use codec::Codec;
pub use error::CodecError;
pub use markup::qualify_markup;
pub use options::{CodecOptions, MarkupOptions, ObjectNotationOptions};
pub use probe::container_name;
