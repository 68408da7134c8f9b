//! Building node trees from JSON documents.
//!
//! JSON objects become records, arrays become lists, `null` is a null row and every other value is
//! a primitive. Integers map to `i64` when they fit and to `u64` otherwise; any other number maps
//! to `f64`. With [`JsonConverter::objects_as_records`] disabled, objects are instead treated as
//! lists of `{key, value}` records.
//!
//! ```
//! use colnest::json::from_json_str;
//!
//! let node = from_json_str(r#"[{"a": null, "b": [2, 3]}, {"a": 1, "b": [2, 4]}]"#).unwrap();
//! let element = node.list().unwrap();
//! assert_eq!(element.field("a").unwrap().null_indices(), &[0]);
//! assert_eq!(element.field("b").unwrap().list().unwrap().size(), 4);
//! ```
use std::{
    borrow::Cow,
    io::{BufReader, Read},
};

use serde_json::{Map, Value};

use crate::{
    builder::{Converter, TreeBuilder, ValueClass},
    node::Node,
    primitive::Primitive,
    utils::Result,
};

const KEY_FIELD: &str = "key";
const VALUE_FIELD: &str = "value";

/// A borrowed view of a JSON value, or of a synthesized map entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JsonValue<'v> {
    Value(&'v Value),
    /// The key of a map entry.
    Key(&'v str),
    /// A `{key, value}` record synthesized from one member of an object.
    Entry(&'v str, &'v Value),
}

impl<'v> From<&'v Value> for JsonValue<'v> {
    fn from(value: &'v Value) -> Self {
        JsonValue::Value(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JsonConverter {
    pub objects_as_records: bool,
}

impl Default for JsonConverter {
    fn default() -> Self {
        Self {
            objects_as_records: true,
        }
    }
}

impl JsonConverter {
    /// Objects become lists of `{key, value}` records instead of records.
    pub fn objects_as_entries() -> Self {
        Self {
            objects_as_records: false,
        }
    }

    fn entries<'v>(object: &'v Map<String, Value>) -> Vec<JsonValue<'v>> {
        object
            .iter()
            .map(|(key, value)| JsonValue::Entry(key, value))
            .collect()
    }
}

impl Converter for JsonConverter {
    type Value<'v> = JsonValue<'v>;

    fn classify(&self, value: &JsonValue<'_>) -> ValueClass {
        match value {
            JsonValue::Key(_) => ValueClass::Primitive,
            JsonValue::Entry(..) => ValueClass::Record,
            JsonValue::Value(Value::Null) => ValueClass::Null,
            JsonValue::Value(Value::Object(_)) if self.objects_as_records => ValueClass::Record,
            JsonValue::Value(Value::Object(_) | Value::Array(_)) => ValueClass::List,
            JsonValue::Value(_) => ValueClass::Primitive,
        }
    }

    fn field_names<'v>(&self, value: &JsonValue<'v>) -> Vec<Cow<'v, str>>
    where
        'v: 'v,
    {
        match *value {
            JsonValue::Entry(..) => vec![Cow::Borrowed(KEY_FIELD), Cow::Borrowed(VALUE_FIELD)],
            JsonValue::Value(Value::Object(object)) => {
                object.keys().map(|key| Cow::Borrowed(key.as_str())).collect()
            }
            _ => Vec::new(),
        }
    }

    fn extract_field<'v>(&self, value: &JsonValue<'v>, name: &str) -> Option<JsonValue<'v>>
    where
        'v: 'v,
    {
        match *value {
            JsonValue::Entry(key, _) if name == KEY_FIELD => Some(JsonValue::Key(key)),
            JsonValue::Entry(_, member) if name == VALUE_FIELD => Some(JsonValue::Value(member)),
            JsonValue::Value(Value::Object(object)) => object.get(name).map(JsonValue::Value),
            _ => None,
        }
    }

    fn extract_list<'v>(&self, value: &JsonValue<'v>) -> Vec<JsonValue<'v>>
    where
        'v: 'v,
    {
        match *value {
            JsonValue::Value(Value::Array(items)) => items.iter().map(JsonValue::Value).collect(),
            JsonValue::Value(Value::Object(object)) => Self::entries(object),
            _ => Vec::new(),
        }
    }

    fn extract_primitive(&self, value: &JsonValue<'_>) -> Option<Primitive> {
        match *value {
            JsonValue::Key(key) => Some(Primitive::Str(key.to_string())),
            JsonValue::Value(Value::Bool(b)) => Some(Primitive::Bool(*b)),
            JsonValue::Value(Value::String(s)) => Some(Primitive::Str(s.clone())),
            JsonValue::Value(Value::Number(n)) => n
                .as_i64()
                .map(Primitive::Int)
                .or_else(|| n.as_u64().map(Primitive::UInt))
                .or_else(|| n.as_f64().map(Primitive::Float)),
            _ => None,
        }
    }
}

/// Build a single-row tree from a parsed JSON value.
pub fn from_json_value(value: &Value) -> Result<Node> {
    let mut builder = TreeBuilder::new(JsonConverter::default());
    builder.push(value)?;
    Ok(builder.finish())
}

pub fn from_json_str(text: &str) -> Result<Node> {
    let value: Value = serde_json::from_str(text)?;
    from_json_value(&value)
}

pub fn from_json_slice(bytes: &[u8]) -> Result<Node> {
    let value: Value = serde_json::from_slice(bytes)?;
    from_json_value(&value)
}

/// Parse one JSON document from `reader`, e.g. the read end of a [`crate::handoff::pipe`].
pub fn from_json_reader<R: Read>(reader: R) -> Result<Node> {
    let value: Value = serde_json::from_reader(BufReader::new(reader))?;
    from_json_value(&value)
}
