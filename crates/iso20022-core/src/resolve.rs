//! # Runtime Type Resolution
//!
//! Generic consumers sometimes hold a value behind a type-erased slot and
//! need its precise runtime identity to route further processing, for
//! example to pick which concrete deserializer applies.
//!
//! ## Design
//!
//! An [`OpaqueValue`] carries a [`TypeToken`] next to the boxed value, so
//! the concrete type travels with the data and never has to be
//! re-derived. [`resolve_concrete_type`] remains for values that arrive
//! truly erased (built from a bare `Box<dyn Any>`): their token is the
//! placeholder, and the resolver asks the boxed value itself.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Name reported for a type whose identity was recovered from a bare
/// `dyn Any` and whose Rust name is therefore unknown.
pub const ERASED_TYPE_NAME: &str = "<type-erased>";

/// Runtime identity of a type, with its name for diagnostics.
///
/// Equality and hashing use the `TypeId` only.
#[derive(Debug, Clone, Copy)]
pub struct TypeToken {
    id: TypeId,
    name: &'static str,
}

impl TypeToken {
    /// Token for `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Token for the "any value" placeholder a type-erased slot reports.
    pub fn placeholder() -> Self {
        Self::of::<dyn Any + Send>()
    }

    fn erased(id: TypeId) -> Self {
        Self {
            id,
            name: ERASED_TYPE_NAME,
        }
    }

    /// The underlying `TypeId`.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name, or [`ERASED_TYPE_NAME`].
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Last path segment of the type name, generics stripped.
    ///
    /// `iso20022_message::pacs008::Document` becomes `Document`.
    pub fn short_name(&self) -> &'static str {
        let base = self.name.split('<').next().unwrap_or(self.name);
        base.rsplit("::").next().unwrap_or(base)
    }

    /// True if this token identifies `T`.
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }

    /// True if this is the placeholder token of an erased slot.
    pub fn is_placeholder(&self) -> bool {
        self.is::<dyn Any + Send>()
    }
}

impl PartialEq for TypeToken {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeToken {}

impl Hash for TypeToken {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for TypeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A value held behind a loosely-typed slot, tagged with its type token.
pub struct OpaqueValue {
    declared: TypeToken,
    value: Box<dyn Any + Send>,
}

impl OpaqueValue {
    /// Wrap a concrete value; the token is `T`'s.
    pub fn new<T: Any + Send>(value: T) -> Self {
        Self {
            declared: TypeToken::of::<T>(),
            value: Box::new(value),
        }
    }

    /// Wrap an already-erased box. The slot reports the placeholder token
    /// until resolved.
    pub fn from_boxed(value: Box<dyn Any + Send>) -> Self {
        Self {
            declared: TypeToken::placeholder(),
            value,
        }
    }

    /// The token the slot reports, which may be the placeholder.
    pub fn declared_type(&self) -> TypeToken {
        self.declared
    }

    /// True if the held value is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        resolve_concrete_type(Some(self)).is_some_and(|t| t.is::<T>())
    }

    /// Borrow the held value as `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self.value.downcast_ref::<T>() {
            Some(v) => Some(v),
            None => self
                .value
                .downcast_ref::<OpaqueValue>()
                .and_then(|inner| inner.downcast_ref::<T>()),
        }
    }

    /// Take the held value as `T`, or get `self` back unchanged.
    pub fn downcast<T: Any>(self) -> Result<T, Self> {
        let declared = self.declared;
        match self.value.downcast::<T>() {
            Ok(v) => Ok(*v),
            Err(value) => match value.downcast::<OpaqueValue>() {
                Ok(inner) => (*inner).downcast::<T>().map_err(|inner| Self {
                    declared,
                    value: Box::new(inner),
                }),
                Err(value) => Err(Self { declared, value }),
            },
        }
    }
}

impl From<Box<dyn Any + Send>> for OpaqueValue {
    fn from(value: Box<dyn Any + Send>) -> Self {
        Self::from_boxed(value)
    }
}

impl fmt::Debug for OpaqueValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpaqueValue")
            .field("declared", &self.declared.name())
            .finish_non_exhaustive()
    }
}

/// Resolve the concrete runtime type of a value held in an opaque slot.
///
/// Returns `None` for an absent value. When the slot reports the
/// placeholder token the type is re-derived from the held value itself,
/// looking through nested opaque slots.
pub fn resolve_concrete_type(value: Option<&OpaqueValue>) -> Option<TypeToken> {
    let value = value?;
    if !value.declared.is_placeholder() {
        return Some(value.declared);
    }
    if let Some(inner) = value.value.downcast_ref::<OpaqueValue>() {
        return resolve_concrete_type(Some(inner));
    }
    Some(TypeToken::erased((*value.value).type_id()))
}
