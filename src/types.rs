use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde_json::Value as JsonValue;

/// Values that can be bound as statement parameters or read back from a row.
///
/// The same enum is used on both sides of a session so statement objects never
/// depend on a driver's value type:
/// ```rust
/// use sql_mapper::prelude::*;
///
/// let mut params = ParamMap::new();
/// params.insert("id".into(), RowValues::Int(1));
/// params.insert("name".into(), RowValues::Text("alice".into()));
/// # let _ = params;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum RowValues {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Timestamp value
    Timestamp(NaiveDateTime),
    /// NULL value
    Null,
    /// JSON value
    JSON(JsonValue),
    /// Binary data
    Blob(Vec<u8>),
}

impl RowValues {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let RowValues::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let RowValues::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    /// Booleans come back from `SQLite` as 0/1 integers, so both forms are accepted.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            RowValues::Bool(value) => Some(*value),
            RowValues::Int(1) => Some(true),
            RowValues::Int(0) => Some(false),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        if let RowValues::Timestamp(value) = self {
            return Some(*value);
        } else if let Some(s) = self.as_text() {
            for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
                if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
                    return Some(dt);
                }
            }
        }
        None
    }

    /// Integers widen to floats; `SQLite` stores whole-number reals as integers.
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            RowValues::Float(value) => Some(*value),
            #[allow(clippy::cast_precision_loss)]
            RowValues::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let RowValues::Blob(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }

    /// Short variant name, used in mapping error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            RowValues::Int(_) => "Int",
            RowValues::Float(_) => "Float",
            RowValues::Text(_) => "Text",
            RowValues::Bool(_) => "Bool",
            RowValues::Timestamp(_) => "Timestamp",
            RowValues::Null => "Null",
            RowValues::JSON(_) => "JSON",
            RowValues::Blob(_) => "Blob",
        }
    }
}

/// String-keyed parameter object, the "by map" parameter shape.
pub type ParamMap = BTreeMap<String, RowValues>;

/// The parameter handed to a session for one call.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Params {
    /// The statement takes no parameter.
    #[default]
    None,
    /// A single scalar; every placeholder in the statement binds to it.
    Single(RowValues),
    /// Named values; each placeholder binds to the entry of the same name.
    Named(ParamMap),
}

impl Params {
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Params::None)
    }

    /// Resolve the value bound to placeholder `name`.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&RowValues> {
        match self {
            Params::None => None,
            Params::Single(value) => Some(value),
            Params::Named(map) => map.get(name),
        }
    }
}
