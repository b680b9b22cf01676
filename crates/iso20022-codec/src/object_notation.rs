//! Object-notation (JSON) back end.
//!
//! Output is compact. Unknown members are ignored on read, and with
//! `omit_null` a null member reads the same as an absent one, so the
//! target type's `#[serde(default)]` fills it in.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::CodecError;
use crate::options::ObjectNotationOptions;

pub(crate) fn to_text<T: Serialize + ?Sized>(
    value: &T,
    options: &ObjectNotationOptions,
) -> Result<String, CodecError> {
    let failed = |error| CodecError::ObjectNotation {
        type_name: std::any::type_name::<T>(),
        direction: "serialization",
        error,
    };
    let mut tree = serde_json::to_value(value).map_err(failed)?;
    if options.omit_null {
        prune_nulls(&mut tree);
    }
    serde_json::to_string(&tree).map_err(failed)
}

pub(crate) fn from_text<T: DeserializeOwned>(
    text: &str,
    options: &ObjectNotationOptions,
) -> Result<T, CodecError> {
    let failed = |error| CodecError::ObjectNotation {
        type_name: std::any::type_name::<T>(),
        direction: "deserialization",
        error,
    };
    let mut tree: Value = serde_json::from_str(text).map_err(failed)?;
    if options.omit_null {
        prune_nulls(&mut tree);
    }
    serde_json::from_value(tree).map_err(failed)
}

/// Remove null-valued object members at every depth. Array elements keep
/// their positions, so nulls inside arrays stay.
fn prune_nulls(value: &mut Value) {
    match value {
        Value::Object(members) => {
            members.retain(|_, member| !member.is_null());
            members.values_mut().for_each(prune_nulls);
        }
        Value::Array(items) => items.iter_mut().for_each(prune_nulls),
        _ => {}
    }
}
