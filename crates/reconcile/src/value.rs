//! Attribute kinds, typed values and the schema-driven snapshot decoder

use crate::attr::Attr;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A field of a nested object attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    /// Name in the resource model (snake_case)
    pub name: &'static str,
    /// Key in the remote representation
    pub remote: &'static str,
    pub kind: AttrKind,
}

impl Field {
    pub const fn new(name: &'static str, remote: &'static str, kind: AttrKind) -> Self {
        Self { name, remote, kind }
    }
}

/// Declared kind of an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrKind {
    String,
    Bool,
    Number,
    StringSet,
    Object(&'static [Field]),
    ObjectSet(&'static [Field]),
}

impl AttrKind {
    /// Human-readable shape, used in mismatch errors
    pub fn describe(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Bool => "bool",
            Self::Number => "number",
            Self::StringSet => "set of strings",
            Self::Object(_) => "object",
            Self::ObjectSet(_) => "set of objects",
        }
    }
}

/// Nested object payload: model field name to value
pub type Fields = BTreeMap<String, Attr<Value>>;

/// A typed attribute value
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    String(String),
    Bool(bool),
    Number(f64),
    StringSet(BTreeSet<String>),
    Object(Fields),
    ObjectSet(Vec<Fields>),
}

impl Value {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::StringSet(_) => "set of strings",
            Self::Object(_) => "object",
            Self::ObjectSet(_) => "set of objects",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Build a string set from anything yielding strings
    pub fn string_set<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::StringSet(items.into_iter().map(Into::into).collect())
    }

    /// Build an object set, dropping duplicate members
    pub fn object_set(items: impl IntoIterator<Item = Fields>) -> Self {
        let mut members: Vec<Fields> = Vec::new();
        for item in items {
            if !members.iter().any(|m| fields_identical(m, &item)) {
                members.push(item);
            }
        }
        Self::ObjectSet(members)
    }
}

fn fields_identical(a: &Fields, b: &Fields) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .all(|(k, v)| b.get(k).is_some_and(|other| v.is_identical(other)))
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::StringSet(a), Self::StringSet(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a == b,
            // Membership comparison, order-independent
            (Self::ObjectSet(a), Self::ObjectSet(b)) => {
                a.len() == b.len()
                    && a.iter().all(|m| b.contains(m))
                    && b.iter().all(|m| a.contains(m))
            }
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s:?}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::StringSet(items) => {
                let items: Vec<String> = items.iter().map(|s| format!("{s:?}")).collect();
                write!(f, "[{}]", items.join(", "))
            }
            Self::Object(fields) => write!(f, "{{{} fields}}", fields.len()),
            Self::ObjectSet(members) => write!(f, "[{} objects]", members.len()),
        }
    }
}

pub(crate) fn json_shape(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

/// Decode a dynamically-typed value against the declared kind.
///
/// JSON `null` decodes to [`Attr::Null`]. Any other shape mismatch is an
/// [`Error::SnapshotTypeMismatch`] naming `attribute`.
pub fn decode(attribute: &str, kind: AttrKind, value: &Json) -> Result<Attr<Value>> {
    if value.is_null() {
        return Ok(Attr::Null);
    }
    let mismatch = || Error::mismatch(attribute, kind.describe(), json_shape(value));

    let decoded = match (kind, value) {
        (AttrKind::String, Json::String(s)) => Value::String(s.clone()),
        (AttrKind::Bool, Json::Bool(b)) => Value::Bool(*b),
        (AttrKind::Number, Json::Number(n)) => Value::Number(n.as_f64().ok_or_else(mismatch)?),
        (AttrKind::StringSet, Json::Array(items)) => {
            let mut set = BTreeSet::new();
            for item in items {
                let s = item.as_str().ok_or_else(|| {
                    Error::mismatch(
                        attribute,
                        kind.describe(),
                        format!("array containing {}", json_shape(item)),
                    )
                })?;
                set.insert(s.to_string());
            }
            Value::StringSet(set)
        }
        (AttrKind::Object(fields), Json::Object(map)) => {
            Value::Object(decode_fields(attribute, fields, map)?)
        }
        (AttrKind::ObjectSet(fields), Json::Array(items)) => {
            let mut members = Vec::with_capacity(items.len());
            for item in items {
                let map = item.as_object().ok_or_else(|| {
                    Error::mismatch(
                        attribute,
                        kind.describe(),
                        format!("array containing {}", json_shape(item)),
                    )
                })?;
                members.push(decode_fields(attribute, fields, map)?);
            }
            Value::object_set(members)
        }
        _ => return Err(mismatch()),
    };
    Ok(Attr::Known(decoded))
}

fn decode_fields(
    attribute: &str,
    fields: &[Field],
    map: &serde_json::Map<String, Json>,
) -> Result<Fields> {
    let mut out = Fields::new();
    for field in fields {
        let path = format!("{attribute}.{}", field.name);
        let value = match map.get(field.remote) {
            Some(v) => decode(&path, field.kind, v)?,
            None => Attr::Null,
        };
        out.insert(field.name.to_string(), value);
    }
    Ok(out)
}

/// Encode a typed value back to its remote JSON shape.
///
/// Nested fields are renamed to their remote keys; `Null`/`Unknown` nested
/// fields are omitted.
pub fn encode(kind: AttrKind, value: &Value) -> Json {
    match value {
        Value::String(s) => Json::String(s.clone()),
        Value::Bool(b) => Json::Bool(*b),
        Value::Number(n) => serde_json::Number::from_f64(*n).map_or(Json::Null, Json::Number),
        Value::StringSet(items) => Json::Array(items.iter().cloned().map(Json::String).collect()),
        Value::Object(fields) => encode_fields(kind, fields),
        Value::ObjectSet(members) => {
            Json::Array(members.iter().map(|m| encode_fields(kind, m)).collect())
        }
    }
}

fn encode_fields(kind: AttrKind, fields: &Fields) -> Json {
    let declared: &[Field] = match kind {
        AttrKind::Object(f) | AttrKind::ObjectSet(f) => f,
        _ => &[],
    };
    let mut map = serde_json::Map::new();
    for field in declared {
        if let Some(Attr::Known(v)) = fields.get(field.name) {
            map.insert(field.remote.to_string(), encode(field.kind, v));
        }
    }
    Json::Object(map)
}
