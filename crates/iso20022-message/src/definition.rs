//! # Message Definitions
//!
//! A [`MessageDefinition`] ties one ISO 20022 message to its Rust binding:
//! the root document type the codec reads and writes, the narrower message
//! the root carries, and the protocol metadata (message identifier and
//! markup namespace).
//!
//! ## Construction
//!
//! The root is built through an explicit [`RootConstructor`] the definition
//! hands out, rather than by runtime introspection. A definition whose root
//! has no zero-argument construction path returns `None` from
//! [`MessageDefinition::constructor`], and wrapper construction fails with
//! `ConfigurationError::NoConstructor` naming the root type.

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Builds an empty root document. `None` means the constructor ran but
/// produced nothing usable.
pub type RootConstructor<R> = fn() -> Option<R>;

/// Binding of one ISO 20022 message to its root and message types.
pub trait MessageDefinition: 'static {
    /// Top-level document the codec serializes.
    type Root: Serialize + DeserializeOwned + Send + 'static;

    /// Message carried inside the root.
    type Message;

    /// Message identifier, e.g. `pacs.008.001.10`.
    const MESSAGE_ID: &'static str;

    /// Default namespace of the markup root.
    const NAMESPACE: &'static str;

    /// Zero-argument construction path of the root, if it has one.
    fn constructor() -> Option<RootConstructor<Self::Root>>;

    /// Extract the message from a root. Called on every access, never
    /// cached.
    fn message(root: &Self::Root) -> Option<&Self::Message>;
}

/// Constructor for any root that implements `Default`.
pub fn default_constructor<R: Default>() -> Option<RootConstructor<R>> {
    Some(build_default::<R>)
}

fn build_default<R: Default>() -> Option<R> {
    Some(R::default())
}
