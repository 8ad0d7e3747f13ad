//! JSON interop for values and objects.
//!
//! JSON arrays have no counterpart in [`Value`]; they become keyed objects
//! whose keys are the element indices. Reactive wrappers serialize as their
//! raw target and reading them for serialization is never tracked.
//!
//! Serialization stops with an error past [`MAX_SERIALIZE_DEPTH`] nested
//! objects, which is also how a cyclic object graph fails.

use serde::ser::{Error as _, Serialize, SerializeMap, Serializer};

use super::{Object, Value};
use crate::error::{Result, TetherError};
use crate::reactive::Reactive;

impl Value {
    /// Convert a parsed JSON document into a value.
    pub fn from_json(json: serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => n.as_f64().map_or(Value::Null, Value::Float),
            },
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => Value::Object(
                items
                    .into_iter()
                    .enumerate()
                    .map(|(index, item)| (index.to_string(), Value::from_json(item)))
                    .collect(),
            ),
            serde_json::Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(key, item)| (key, Value::from_json(item)))
                    .collect(),
            ),
        }
    }

    /// Produce a JSON document from this value.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

impl Object {
    /// Build an object from a JSON document, which must be a JSON object or
    /// array at the top level.
    pub fn from_json(json: serde_json::Value) -> Result<Object> {
        match Value::from_json(json) {
            Value::Object(object) => Ok(object),
            other => Err(TetherError::NotAnObject { kind: other.kind() }),
        }
    }

    /// Parse an object from JSON text.
    pub fn from_json_str(text: &str) -> Result<Object> {
        let json: serde_json::Value = serde_json::from_str(text)?;
        Object::from_json(json)
    }

    /// Produce a JSON document from this object.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Deepest object nesting that serializes; deeper graphs, cyclic ones
/// included, fail with an error instead of exhausting the stack.
pub const MAX_SERIALIZE_DEPTH: usize = 128;

/// A value together with the number of objects enclosing it.
struct Nested<'a> {
    value: &'a Value,
    depth: usize,
}

impl Serialize for Nested<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.value {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Str(s) => serializer.serialize_str(s),
            Value::Object(object) => serialize_object(object, self.depth, serializer),
            Value::Reactive(reactive) => serialize_object(&reactive.to_raw(), self.depth, serializer),
        }
    }
}

fn serialize_object<S: Serializer>(
    object: &Object,
    depth: usize,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    if depth >= MAX_SERIALIZE_DEPTH {
        return Err(S::Error::custom(format!(
            "object nesting exceeds {MAX_SERIALIZE_DEPTH} levels (cyclic object?)"
        )));
    }

    // Snapshot first so no lock is held while nested values serialize.
    let entries = object.entries();
    let mut map = serializer.serialize_map(Some(entries.len()))?;
    for (key, value) in &entries {
        map.serialize_entry(
            key,
            &Nested {
                value,
                depth: depth + 1,
            },
        )?;
    }
    map.end()
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        Nested {
            value: self,
            depth: 0,
        }
        .serialize(serializer)
    }
}

impl Serialize for Object {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serialize_object(self, 0, serializer)
    }
}

impl Serialize for Reactive {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_raw().serialize(serializer)
    }
}
