//! Conversion between caller types and the session's dynamic values.
//!
//! * [`ToParams`] turns a statement parameter into [`Params`].
//! * [`FromValue`] reads one column value (scalars and map keys).
//! * [`FromRow`] builds a result value from a whole row.
//! * [`GeneratedKeys`] receives a database-generated key after an insert.
//!
//! Plain `serde` records get `ToParams` + `FromRow` through
//! [`mapped_record!`](crate::mapped_record).

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map as JsonMap, Number, Value as JsonValue};

use crate::error::SqlMapperError;
use crate::results::MappedRow;
use crate::types::{ParamMap, Params, RowValues};

/// Convert a statement parameter into session parameters.
pub trait ToParams {
    /// # Errors
    /// Returns `SqlMapperError::ParameterError` if the value cannot be represented.
    fn to_params(&self) -> Result<Params, SqlMapperError>;
}

/// Read a single column value.
pub trait FromValue: Sized {
    /// # Errors
    /// Returns `SqlMapperError::ResultMapping` if the value has an incompatible type.
    fn from_value(value: &RowValues) -> Result<Self, SqlMapperError>;
}

/// Build a result value from a row.
pub trait FromRow: Sized {
    /// # Errors
    /// Returns `SqlMapperError::ResultMapping` if the row does not fit `Self`.
    fn from_row(row: &MappedRow) -> Result<Self, SqlMapperError>;
}

/// Accept a generated key after an insert.
pub trait GeneratedKeys {
    /// # Errors
    /// Implementations return `SqlMapperError::ResultMapping` for an unknown property
    /// or a key of the wrong type.
    fn set_generated_key(&mut self, property: &str, key: &RowValues) -> Result<(), SqlMapperError>;
}

fn mismatch<T>(value: &RowValues) -> SqlMapperError {
    SqlMapperError::ResultMapping(format!(
        "cannot read {} as {}",
        value.kind(),
        std::any::type_name::<T>()
    ))
}

impl ToParams for () {
    fn to_params(&self) -> Result<Params, SqlMapperError> {
        Ok(Params::None)
    }
}

impl ToParams for ParamMap {
    fn to_params(&self) -> Result<Params, SqlMapperError> {
        Ok(Params::Named(self.clone()))
    }
}

impl ToParams for HashMap<String, RowValues> {
    fn to_params(&self) -> Result<Params, SqlMapperError> {
        Ok(Params::Named(
            self.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        ))
    }
}

impl ToParams for RowValues {
    fn to_params(&self) -> Result<Params, SqlMapperError> {
        Ok(Params::Single(self.clone()))
    }
}

impl<T: ToParams + ?Sized> ToParams for &T {
    fn to_params(&self) -> Result<Params, SqlMapperError> {
        (**self).to_params()
    }
}

impl ToParams for str {
    fn to_params(&self) -> Result<Params, SqlMapperError> {
        Ok(Params::Single(RowValues::Text(self.to_owned())))
    }
}

impl<T> ToParams for Option<T>
where
    T: Clone + Into<RowValues>,
{
    fn to_params(&self) -> Result<Params, SqlMapperError> {
        Ok(Params::Single(
            self.clone().map_or(RowValues::Null, Into::into),
        ))
    }
}

impl FromValue for RowValues {
    fn from_value(value: &RowValues) -> Result<Self, SqlMapperError> {
        Ok(value.clone())
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &RowValues) -> Result<Self, SqlMapperError> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: &RowValues) -> Result<Self, SqlMapperError> {
        value.as_int().copied().ok_or_else(|| mismatch::<Self>(value))
    }
}

impl FromValue for i32 {
    fn from_value(value: &RowValues) -> Result<Self, SqlMapperError> {
        let wide = i64::from_value(value)?;
        i32::try_from(wide).map_err(|_| {
            SqlMapperError::ResultMapping(format!("{wide} does not fit in i32"))
        })
    }
}

impl FromValue for u64 {
    fn from_value(value: &RowValues) -> Result<Self, SqlMapperError> {
        let wide = i64::from_value(value)?;
        u64::try_from(wide).map_err(|_| {
            SqlMapperError::ResultMapping(format!("{wide} does not fit in u64"))
        })
    }
}

impl FromValue for f64 {
    fn from_value(value: &RowValues) -> Result<Self, SqlMapperError> {
        value.as_float().ok_or_else(|| mismatch::<Self>(value))
    }
}

impl FromValue for bool {
    fn from_value(value: &RowValues) -> Result<Self, SqlMapperError> {
        value.as_bool().ok_or_else(|| mismatch::<Self>(value))
    }
}

impl FromValue for String {
    fn from_value(value: &RowValues) -> Result<Self, SqlMapperError> {
        value
            .as_text()
            .map(str::to_owned)
            .ok_or_else(|| mismatch::<Self>(value))
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: &RowValues) -> Result<Self, SqlMapperError> {
        value.as_timestamp().ok_or_else(|| mismatch::<Self>(value))
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &RowValues) -> Result<Self, SqlMapperError> {
        value
            .as_blob()
            .map(<[u8]>::to_vec)
            .ok_or_else(|| mismatch::<Self>(value))
    }
}

impl FromValue for JsonValue {
    fn from_value(value: &RowValues) -> Result<Self, SqlMapperError> {
        match value {
            // JSON columns come back from SQLite as text; plain text stays a string.
            RowValues::Text(text) => {
                Ok(serde_json::from_str(text).unwrap_or_else(|_| JsonValue::String(text.clone())))
            }
            other => Ok(row_value_to_json(other)),
        }
    }
}

/// Scalars: one parameter bound to every placeholder, and result rows read
/// from their first column.
macro_rules! scalar_mapping {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for RowValues {
                fn from(value: $ty) -> Self {
                    RowValues::$variant(value.into())
                }
            }

            impl ToParams for $ty {
                fn to_params(&self) -> Result<Params, SqlMapperError> {
                    Ok(Params::Single(RowValues::from(self.clone())))
                }
            }

            impl FromRow for $ty {
                fn from_row(row: &MappedRow) -> Result<Self, SqlMapperError> {
                    first_column(row).and_then(<$ty as FromValue>::from_value)
                }
            }
        )*
    };
}

scalar_mapping! {
    i64 => Int,
    i32 => Int,
    f64 => Float,
    bool => Bool,
    String => Text,
    NaiveDateTime => Timestamp,
    Vec<u8> => Blob,
    JsonValue => JSON,
}

impl From<&str> for RowValues {
    fn from(value: &str) -> Self {
        RowValues::Text(value.to_owned())
    }
}

impl<T: FromValue> FromRow for Option<T> {
    fn from_row(row: &MappedRow) -> Result<Self, SqlMapperError> {
        first_column(row).and_then(<Option<T> as FromValue>::from_value)
    }
}

impl FromRow for MappedRow {
    fn from_row(row: &MappedRow) -> Result<Self, SqlMapperError> {
        Ok(row.clone())
    }
}

impl FromRow for ParamMap {
    fn from_row(row: &MappedRow) -> Result<Self, SqlMapperError> {
        Ok(row
            .iter()
            .map(|(name, value)| (name.to_owned(), value.clone()))
            .collect())
    }
}

impl GeneratedKeys for ParamMap {
    fn set_generated_key(&mut self, property: &str, key: &RowValues) -> Result<(), SqlMapperError> {
        self.insert(property.to_owned(), key.clone());
        Ok(())
    }
}

fn first_column(row: &MappedRow) -> Result<&RowValues, SqlMapperError> {
    row.get_by_index(0)
        .ok_or_else(|| SqlMapperError::ResultMapping("row has no columns".into()))
}

/// Lossless where JSON allows it; blobs become arrays of byte values.
#[must_use]
pub fn row_value_to_json(value: &RowValues) -> JsonValue {
    match value {
        RowValues::Int(i) => JsonValue::Number(Number::from(*i)),
        RowValues::Float(f) => Number::from_f64(*f).map_or(JsonValue::Null, JsonValue::Number),
        RowValues::Text(s) => JsonValue::String(s.clone()),
        RowValues::Bool(b) => JsonValue::Bool(*b),
        RowValues::Timestamp(dt) => {
            JsonValue::String(dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
        }
        RowValues::Null => JsonValue::Null,
        RowValues::JSON(json) => json.clone(),
        RowValues::Blob(bytes) => {
            JsonValue::Array(bytes.iter().map(|b| JsonValue::from(*b)).collect())
        }
    }
}

/// Nested arrays and objects stay JSON.
#[must_use]
pub fn json_to_row_value(value: &JsonValue) -> RowValues {
    match value {
        JsonValue::Null => RowValues::Null,
        JsonValue::Bool(b) => RowValues::Bool(*b),
        JsonValue::Number(n) => n
            .as_i64()
            .map(RowValues::Int)
            .or_else(|| n.as_f64().map(RowValues::Float))
            .unwrap_or(RowValues::Null),
        JsonValue::String(s) => RowValues::Text(s.clone()),
        other => RowValues::JSON(other.clone()),
    }
}

/// Serialize a record into named parameters, one per field.
///
/// # Errors
/// Returns `SqlMapperError::ParameterError` unless `value` serializes to a JSON object.
pub fn serde_to_params<T: Serialize + ?Sized>(value: &T) -> Result<Params, SqlMapperError> {
    match serde_json::to_value(value)? {
        JsonValue::Object(fields) => Ok(Params::Named(
            fields
                .iter()
                .map(|(k, v)| (k.clone(), json_to_row_value(v)))
                .collect(),
        )),
        other => Err(SqlMapperError::ParameterError(format!(
            "{} serialized to {other}, expected an object",
            std::any::type_name::<T>()
        ))),
    }
}

/// Deserialize a record from a row, matching fields to column names.
///
/// # Errors
/// Returns `SqlMapperError::ResultMapping` if deserialization fails.
pub fn serde_from_row<T: DeserializeOwned>(row: &MappedRow) -> Result<T, SqlMapperError> {
    let object: JsonMap<String, JsonValue> = row
        .iter()
        .map(|(name, value)| (name.to_owned(), row_value_to_json(value)))
        .collect();
    serde_json::from_value(JsonValue::Object(object)).map_err(SqlMapperError::from)
}

/// Implement [`ToParams`] and [`FromRow`] for `serde` records.
///
/// ```rust
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Person {
///     id: i64,
///     name: String,
/// }
///
/// sql_mapper::mapped_record!(Person);
/// ```
#[macro_export]
macro_rules! mapped_record {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::mapping::ToParams for $ty {
                fn to_params(
                    &self,
                ) -> ::std::result::Result<$crate::types::Params, $crate::SqlMapperError> {
                    $crate::mapping::serde_to_params(self)
                }
            }

            impl $crate::mapping::FromRow for $ty {
                fn from_row(
                    row: &$crate::results::MappedRow,
                ) -> ::std::result::Result<Self, $crate::SqlMapperError> {
                    $crate::mapping::serde_from_row(row)
                }
            }
        )+
    };
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Person {
        id: i64,
        name: String,
        nickname: Option<String>,
    }

    crate::mapped_record!(Person);

    #[test]
    fn scalar_reads_first_column() {
        let row = MappedRow::from_pairs([("n", RowValues::Int(3)), ("x", RowValues::Null)]);
        assert_eq!(i64::from_row(&row).unwrap(), 3);
        assert!(String::from_row(&row).is_err());
    }

    #[test]
    fn bool_accepts_integer_storage() {
        assert!(bool::from_value(&RowValues::Int(1)).unwrap());
        assert!(bool::from_value(&RowValues::Int(2)).is_err());
    }

    #[test]
    fn optional_value_maps_null_to_none() {
        let value: Option<i64> = FromValue::from_value(&RowValues::Null).unwrap();
        assert_eq!(value, None);
    }

    #[test]
    fn record_round_trips_through_row() {
        let row = MappedRow::from_pairs([
            ("id", RowValues::Int(1)),
            ("name", RowValues::Text("ann".into())),
            ("nickname", RowValues::Null),
        ]);
        let person = Person::from_row(&row).unwrap();
        assert_eq!(
            person,
            Person { id: 1, name: "ann".into(), nickname: None }
        );

        let Params::Named(map) = person.to_params().unwrap() else {
            panic!("records bind as named parameters");
        };
        assert_eq!(map.get("id"), Some(&RowValues::Int(1)));
        assert_eq!(map.get("nickname"), Some(&RowValues::Null));
    }

    #[test]
    fn scalar_parameter_binds_single() {
        assert_eq!(5_i64.to_params().unwrap(), Params::Single(RowValues::Int(5)));
        assert_eq!(().to_params().unwrap(), Params::None);
        assert_eq!(
            "x".to_params().unwrap(),
            Params::Single(RowValues::Text("x".into()))
        );
    }

    #[test]
    fn non_object_record_is_rejected() {
        assert!(matches!(
            serde_to_params(&vec![1, 2]),
            Err(SqlMapperError::ParameterError(_))
        ));
    }
}
