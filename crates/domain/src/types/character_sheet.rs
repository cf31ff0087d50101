use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A node in a character document.
///
/// Stored untagged so a persisted sheet is plain JSON that a person can
/// edit by hand. Variant order matters for deserialization: integers are
/// tried before floats so `5` stays an integer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SheetValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<SheetValue>),
    Object(BTreeMap<String, SheetValue>),
    Null,
}

impl SheetValue {
    /// Coerce raw user text into a value: integer, else finite float, else string.
    ///
    /// This is the only place free-form input is typed; stored values are
    /// never re-coerced on read.
    pub fn coerce(raw: &str) -> Self {
        let trimmed = raw.trim();
        if let Ok(value) = trimmed.parse::<i64>() {
            return SheetValue::Integer(value);
        }
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => SheetValue::Float(value),
            _ => SheetValue::String(raw.to_string()),
        }
    }

    pub fn empty_object() -> Self {
        SheetValue::Object(BTreeMap::new())
    }

    /// Integer view. Integral floats count, since hand-edited sheets
    /// sometimes write `10.0`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SheetValue::Integer(value) => Some(*value),
            SheetValue::Float(value)
                if value.fract() == 0.0
                    && *value >= i64::MIN as f64
                    && *value <= i64::MAX as f64 =>
            {
                Some(*value as i64)
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SheetValue::String(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, SheetValue>> {
        match self {
            SheetValue::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut BTreeMap<String, SheetValue>> {
        match self {
            SheetValue::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self, SheetValue::Object(_))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            SheetValue::Boolean(_) => "boolean",
            SheetValue::Integer(_) => "integer",
            SheetValue::Float(_) => "float",
            SheetValue::String(_) => "string",
            SheetValue::List(_) => "list",
            SheetValue::Object(_) => "object",
            SheetValue::Null => "null",
        }
    }
}

impl From<i64> for SheetValue {
    fn from(value: i64) -> Self {
        SheetValue::Integer(value)
    }
}

impl From<&str> for SheetValue {
    fn from(value: &str) -> Self {
        SheetValue::String(value.to_string())
    }
}

impl From<String> for SheetValue {
    fn from(value: String) -> Self {
        SheetValue::String(value)
    }
}
