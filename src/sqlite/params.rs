use rusqlite::types::{Value, ValueRef};

use crate::bind::BindType;
use crate::error::DriverError;
use crate::types::RowValues;

/// Map a rusqlite failure onto a driver diagnostic, keeping SQLite's extended result code.
pub(crate) fn driver_error(err: &rusqlite::Error) -> DriverError {
    match err {
        rusqlite::Error::SqliteFailure(code, message) => DriverError::new(
            code.extended_code,
            message.clone().unwrap_or_else(|| code.to_string()),
        ),
        other => DriverError::new(-1, other.to_string()),
    }
}

/// The SQLite value a placeholder receives for `text` under `bind_type`.
///
/// Row ids that parse as integers bind as integers so `rowid = :rid` matches; cursor
/// placeholders have no SQLite counterpart and bind as NULL.
pub(crate) fn to_sqlite_value(text: &str, bind_type: BindType) -> Value {
    match bind_type {
        BindType::Cursor => Value::Null,
        BindType::RowId => text
            .trim()
            .parse::<i64>()
            .map_or_else(|_| Value::Text(text.to_string()), Value::Integer),
        BindType::Chr | BindType::Clob => Value::Text(text.to_string()),
    }
}

/// Extract a `RowValues` from a column of a fetched row.
pub(crate) fn from_value_ref(value: ValueRef<'_>) -> RowValues {
    match value {
        ValueRef::Null => RowValues::Null,
        ValueRef::Integer(i) => RowValues::Int(i),
        ValueRef::Real(f) => RowValues::Float(f),
        ValueRef::Text(bytes) => RowValues::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(b) => RowValues::Blob(b.to_vec()),
    }
}

/// Text form of a value handed back through an OUT placeholder.
pub(crate) fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Text(s) => s.clone(),
        Value::Blob(b) => String::from_utf8_lossy(b).into_owned(),
    }
}
