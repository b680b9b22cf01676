//! # iso20022-schema — Schema Aggregation & Markup Validation
//!
//! Loads XSD schema definitions from many sources into one aggregate and
//! validates markup-encoded documents against it.
//!
//! ## Aggregate (`aggregator`)
//!
//! [`SchemaAggregator`] owns the loaded definitions and the event log.
//! Loading is additive and isolated per definition: a source that fails to
//! read, parse, or fit alongside the others is logged and leaves the
//! aggregate untouched. Bulk loaders keep going after a failure and report
//! overall success only when every source loaded.
//!
//! ## Validation (`validate`)
//!
//! Structural validation of an instance document against the XSD subset
//! ISO 20022 message schemas use: sequences, choices, `xs:all`, wildcards,
//! type derivation, attributes, and the built-in datatypes with their
//! constraining facets. Deviations become [`ValidationEvent`]s classified
//! as errors or warnings. [`ValidationPolicy`] decides which outcomes still
//! yield the canonical document.
//!
//! ## Crate Policy
//!
//! - Depends only on `iso20022-core` internally.
//! - Validation faults are data, never panics: every public entry point
//!   either returns a `Result` or collapses it into `bool`/`Option` after
//!   logging through `tracing`.

pub mod aggregator;
pub mod datatypes;
pub mod error;
pub mod event;
pub mod facets;
pub mod model;
pub mod parse;
pub mod validate;

pub use aggregator::{
    LoadOutcome, ResourceProvider, SchemaAggregator, SchemaSource, ValidationPolicy,
    DEFAULT_PATTERN,
};
pub use error::{SchemaError, ValidationFailure};
pub use event::{Severity, ValidationEvent};
pub use model::{QualifiedName, SchemaDefinition, XSD_NAMESPACE};
pub use parse::parse_definition;
pub use validate::validate_document;
