use std::sync::Arc;

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::types::RowValues;

/// Field names of one result, shared by all its rows.
///
/// Each distinct name maps to the position of the last select-list column carrying it,
/// so a repeated name keeps its first place and takes the later column's value.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSet {
    fields: Arc<IndexMap<String, usize>>,
}

impl ColumnSet {
    #[must_use]
    pub fn new(names: Vec<String>) -> Self {
        let mut fields = IndexMap::with_capacity(names.len());
        for (i, name) in names.into_iter().enumerate() {
            fields.insert(name, i);
        }
        Self {
            fields: Arc::new(fields),
        }
    }

    /// Distinct field names in first-appearance order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.get(name).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Build a row over these columns.
    #[must_use]
    pub fn row(&self, values: Vec<RowValues>) -> Row {
        Row {
            columns: self.clone(),
            values,
        }
    }
}

/// A row from a database query result
///
/// Values are kept in select-list order and can be read by position or by
/// (case-normalized) field name. As a mapping, and when serialized as a JSON object,
/// each field name appears once with the value of its last column.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: ColumnSet,
    values: Vec<RowValues>,
}

impl Row {
    /// Create a row from column names and values.
    #[must_use]
    pub fn new(column_names: Vec<String>, values: Vec<RowValues>) -> Self {
        ColumnSet::new(column_names).row(values)
    }

    /// Distinct field names in first-appearance order.
    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.names().collect()
    }

    #[must_use]
    pub fn values(&self) -> &[RowValues] {
        &self.values
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

    /// Number of distinct fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// `(field, value)` pairs in first-appearance order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RowValues)> {
        self.columns.fields.iter().filter_map(|(name, &idx)| {
            self.values.get(idx).map(|value| (name.as_str(), value))
        })
    }

    #[must_use]
    pub fn into_values(self) -> Vec<RowValues> {
        self.values
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
