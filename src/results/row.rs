use std::collections::HashMap;
use std::sync::Arc;

use crate::types::RowValues;

/// Column layout shared by every row of one result.
///
/// Built once per query so rows do not each carry their own name lookup table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowColumns {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl RowColumns {
    #[must_use]
    pub fn new(names: Vec<String>) -> Self {
        let mut index = HashMap::with_capacity(names.len());
        // First occurrence wins when a query repeats a column name.
        for (i, name) in names.iter().enumerate() {
            index.entry(name.clone()).or_insert(i);
        }
        Self { names, index }
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// A single row produced by a session.
///
/// Values are addressed by column (or result-map property) name or by index.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedRow {
    columns: Arc<RowColumns>,
    values: Vec<RowValues>,
}

impl MappedRow {
    /// Create a row over a shared column layout.
    ///
    /// Missing trailing values read as absent; extra values are unreachable by name.
    #[must_use]
    pub fn new(columns: Arc<RowColumns>, values: Vec<RowValues>) -> Self {
        Self { columns, values }
    }

    /// Build a standalone row from `(column, value)` pairs.
    #[must_use]
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, RowValues)>,
        S: Into<String>,
    {
        let (names, values): (Vec<String>, Vec<RowValues>) =
            pairs.into_iter().map(|(k, v)| (k.into(), v)).unzip();
        Self::new(Arc::new(RowColumns::new(names)), values)
    }

    #[must_use]
    pub fn columns(&self) -> &Arc<RowColumns> {
        &self.columns
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        self.columns.names()
    }

    /// Get a value from the row by column name
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&RowValues> {
        self.columns
            .position(column_name)
            .and_then(|idx| self.values.get(idx))
    }

    /// Get a value from the row by column index
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&RowValues> {
        self.values.get(index)
    }

    #[must_use]
    pub fn values(&self) -> &[RowValues] {
        &self.values
    }

    #[must_use]
    pub fn into_values(self) -> Vec<RowValues> {
        self.values
    }

    /// Iterate `(column, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RowValues)> {
        self.columns
            .names()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
