use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::Serialize;

use crate::error::SqlSessionError;
use crate::executor::ErrorMode;
use crate::types::RowValues;

use super::keyed::Keyed;
use super::row::Row;

/// Shape of a query's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum ResultMode {
    /// Every row as a column map; zero rows is [`QueryResult::NoRows`].
    Raw,
    /// The first row as a column map; zero rows is [`QueryResult::NoRows`].
    FirstRow,
    /// The first column of the first row; zero rows is an empty string.
    FirstRowFirstColumn,
    /// Column 0 → column 1 for every row.
    AllKeyValuePairs,
    /// Column 0 of every row.
    AllFirstColumnValues,
    /// Every row as a column map; zero rows is an empty list.
    AllRows,
    /// Every row as a column map, keyed by the value of the index field.
    AllRowsAssoc,
}

impl ResultMode {
    pub const ALL: [ResultMode; 7] = [
        ResultMode::Raw,
        ResultMode::FirstRow,
        ResultMode::FirstRowFirstColumn,
        ResultMode::AllKeyValuePairs,
        ResultMode::AllFirstColumnValues,
        ResultMode::AllRows,
        ResultMode::AllRowsAssoc,
    ];

    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            ResultMode::Raw => 0,
            ResultMode::FirstRow => 1,
            ResultMode::FirstRowFirstColumn => 2,
            ResultMode::AllKeyValuePairs => 3,
            ResultMode::AllFirstColumnValues => 4,
            ResultMode::AllRows => 5,
            ResultMode::AllRowsAssoc => 6,
        }
    }

    /// Most rows this mode reads: one for the single-row modes, unbounded otherwise.
    #[must_use]
    pub fn row_limit(self) -> Option<usize> {
        match self {
            ResultMode::FirstRow | ResultMode::FirstRowFirstColumn => Some(1),
            _ => None,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            ResultMode::Raw => "raw",
            ResultMode::FirstRow => "first_row",
            ResultMode::FirstRowFirstColumn => "first_row_first_column",
            ResultMode::AllKeyValuePairs => "all_key_value_pairs",
            ResultMode::AllFirstColumnValues => "all_first_column_values",
            ResultMode::AllRows => "all_rows",
            ResultMode::AllRowsAssoc => "all_rows_assoc",
        }
    }
}

impl fmt::Display for ResultMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for ResultMode {
    type Error = SqlSessionError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        ResultMode::ALL
            .into_iter()
            .find(|m| m.code() == code)
            .ok_or_else(|| SqlSessionError::UnknownResultMode(code.to_string()))
    }
}

/// Accepts mode names in any case with `_` or `-` separators, or the numeric code.
impl FromStr for ResultMode {
    type Err = SqlSessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        if let Ok(code) = wanted.parse::<u8>() {
            return ResultMode::try_from(code);
        }
        ResultMode::ALL
            .into_iter()
            .find(|m| m.name() == wanted)
            .ok_or_else(|| SqlSessionError::UnknownResultMode(s.to_string()))
    }
}

/// Per-call query options.
///
/// ```rust
/// use sql_session::prelude::*;
///
/// let options = QueryOptions::default()
///     .with_index_field("id")
///     .with_exception_message("customer lookup failed");
/// assert!(options.error_mode.is_suppressed());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Column whose value keys the rows in [`ResultMode::AllRowsAssoc`].
    pub index_field: Option<String>,
    pub error_mode: ErrorMode,
}

impl QueryOptions {
    #[must_use]
    pub fn with_index_field(mut self, field: impl Into<String>) -> Self {
        self.index_field = Some(field.into());
        self
    }

    /// A non-empty message turns database failures into a `None` result.
    #[must_use]
    pub fn with_exception_message(mut self, message: &str) -> Self {
        self.error_mode = ErrorMode::from_message(Some(message));
        self
    }
}

/// A shaped query result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryResult {
    /// The query returned no rows (`Raw`, `FirstRow`).
    NoRows,
    Rows(Vec<Row>),
    Row(Row),
    Value(RowValues),
    Pairs(Keyed<RowValues>),
    Column(Vec<RowValues>),
    Keyed(Keyed<Row>),
}

impl QueryResult {
    #[must_use]
    pub fn is_no_rows(&self) -> bool {
        matches!(self, QueryResult::NoRows)
    }

    #[must_use]
    pub fn as_rows(&self) -> Option<&[Row]> {
        match self {
            QueryResult::Rows(rows) => Some(rows),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_row(&self) -> Option<&Row> {
        match self {
            QueryResult::Row(row) => Some(row),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_value(&self) -> Option<&RowValues> {
        match self {
            QueryResult::Value(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_pairs(&self) -> Option<&Keyed<RowValues>> {
        match self {
            QueryResult::Pairs(pairs) => Some(pairs),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_column(&self) -> Option<&[RowValues]> {
        match self {
            QueryResult::Column(values) => Some(values),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_keyed(&self) -> Option<&Keyed<Row>> {
        match self {
            QueryResult::Keyed(rows) => Some(rows),
            _ => None,
        }
    }

    /// Rows of a `Rows` result; `NoRows` yields an empty list.
    #[must_use]
    pub fn into_rows(self) -> Option<Vec<Row>> {
        match self {
            QueryResult::Rows(rows) => Some(rows),
            QueryResult::NoRows => Some(Vec::new()),
            _ => None,
        }
    }
}
