//! Rows as the session hands them to statement objects.

pub mod row;

pub use row::{MappedRow, RowColumns};

/// Map-shaped rows in engine production order: the key column's value paired
/// with its row. Duplicate keys are kept here; statement objects collapse them.
pub type KeyedRows = Vec<(crate::types::RowValues, MappedRow)>;
