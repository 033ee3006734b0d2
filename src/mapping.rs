//! Wire-to-model mapping.
//!
//! Records returned by SystemLink services are decoded in two steps: the raw
//! JSON object is checked against the record's field table for the fields
//! the calling context needs, then decoded into the typed record. Optional
//! fields decode into a [`Field`], which keeps "not sent" apart from "sent as
//! null".

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, SystemLinkError};

/// A response field that may be absent, explicitly null, or set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field<T> {
    /// The server did not send the field.
    Unset,
    /// The server sent `null`.
    Null,
    /// The server sent a value.
    Value(T),
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Field::Unset
    }
}

impl<T> Field<T> {
    /// True when the field was not sent.
    pub fn is_unset(&self) -> bool {
        matches!(self, Field::Unset)
    }

    /// True when the field was sent as `null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Field::Null)
    }

    /// True when the field carries a value.
    pub fn is_value(&self) -> bool {
        matches!(self, Field::Value(_))
    }

    /// Borrow the value, if any.
    pub fn value(&self) -> Option<&T> {
        match self {
            Field::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Take the value, collapsing `Unset` and `Null` to `None`.
    pub fn into_option(self) -> Option<T> {
        match self {
            Field::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Borrow as `Field<&T>`.
    pub fn as_ref(&self) -> Field<&T> {
        match self {
            Field::Unset => Field::Unset,
            Field::Null => Field::Null,
            Field::Value(v) => Field::Value(v),
        }
    }

    /// Transform the value, keeping `Unset`/`Null` as they are.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Field<U> {
        match self {
            Field::Unset => Field::Unset,
            Field::Null => Field::Null,
            Field::Value(v) => Field::Value(f(v)),
        }
    }
}

impl<T: std::ops::Deref> Field<T> {
    /// Borrow the dereferenced value, e.g. `&str` for `Field<String>`.
    pub fn as_deref(&self) -> Option<&T::Target> {
        self.value().map(|v| &**v)
    }
}

impl<T> From<T> for Field<T> {
    fn from(value: T) -> Self {
        Field::Value(value)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Field<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> core::result::Result<Self, D::Error> {
        // Only reached when the key is present; `#[serde(default)]` covers absence.
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(v) => Field::Value(v),
            None => Field::Null,
        })
    }
}

impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        match self {
            Field::Value(v) => serializer.serialize_some(v),
            Field::Unset | Field::Null => serializer.serialize_none(),
        }
    }
}

/// One row of a record's wire/logical name table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// JSON key on the wire (camelCase).
    pub wire: &'static str,
    /// Attribute name in Rust (snake_case).
    pub logical: &'static str,
}

impl FieldSpec {
    /// Table row constructor.
    pub const fn new(wire: &'static str, logical: &'static str) -> Self {
        Self { wire, logical }
    }
}

/// A record decoded from a SystemLink JSON object.
///
/// `FIELDS` must list every key the serde representation uses.
pub trait WireRecord: DeserializeOwned {
    /// Record name used in error messages.
    const RECORD: &'static str;

    /// Wire/logical name table.
    const FIELDS: &'static [FieldSpec];

    /// Logical attribute name for a wire key.
    fn wire_to_logical(wire: &str) -> Option<&'static str> {
        Self::FIELDS.iter().find(|f| f.wire == wire).map(|f| f.logical)
    }

    /// Wire key for a logical attribute name.
    fn logical_to_wire(logical: &str) -> Option<&'static str> {
        Self::FIELDS.iter().find(|f| f.logical == logical).map(|f| f.wire)
    }
}

/// Decode one record, requiring the given wire keys to hold values.
///
/// # Errors
///
/// Returns [`SystemLinkError::Schema`] when the value is not an object or a
/// required key is absent or null, and [`SystemLinkError::ParseError`] when a
/// present field has the wrong shape.
pub fn map_record<T: WireRecord>(value: serde_json::Value, required: &[&str]) -> Result<T> {
    let Some(object) = value.as_object() else {
        return Err(SystemLinkError::Schema {
            record: T::RECORD,
            field: "<object>",
        });
    };

    for wire in required {
        let present = object.get(*wire).is_some_and(|v| !v.is_null());
        if !present {
            let field = T::FIELDS
                .iter()
                .find(|f| f.wire == *wire)
                .map_or("<unknown>", |f| f.logical);
            return Err(SystemLinkError::Schema {
                record: T::RECORD,
                field,
            });
        }
    }

    Ok(serde_json::from_value(value)?)
}

/// Decode a list of records with the same requirements.
pub fn map_records<T: WireRecord>(
    values: Vec<serde_json::Value>,
    required: &[&str],
) -> Result<Vec<T>> {
    values
        .into_iter()
        .map(|v| map_record(v, required))
        .collect()
}

/// Rename the keys of a wire object to logical names.
///
/// Keys missing from the table are kept as they are.
pub fn to_logical_keys<T: WireRecord>(
    object: serde_json::Map<String, serde_json::Value>,
) -> serde_json::Map<String, serde_json::Value> {
    object
        .into_iter()
        .map(|(k, v)| match T::wire_to_logical(&k) {
            Some(logical) => (logical.to_string(), v),
            None => (k, v),
        })
        .collect()
}

/// Rename the keys of a logical-name object to wire names.
pub fn to_wire_keys<T: WireRecord>(
    object: serde_json::Map<String, serde_json::Value>,
) -> serde_json::Map<String, serde_json::Value> {
    object
        .into_iter()
        .map(|(k, v)| match T::logical_to_wire(&k) {
            Some(wire) => (wire.to_string(), v),
            None => (k, v),
        })
        .collect()
}
