use crate::error::SqlSessionError;
use crate::executor::Statement;
use crate::types::{KeyCase, RowValues};

use super::keyed::Keyed;
use super::mode::{QueryResult, ResultMode};
use super::row::{ColumnSet, Row};

/// A shaped result plus the metadata recorded for it.
#[derive(Debug)]
pub(crate) struct Shaped {
    pub result: QueryResult,
    pub columns: Vec<String>,
    pub total_rows: usize,
}

/// The index field an `AllRowsAssoc` query needs, case-normalized.
///
/// # Errors
/// `MissingIndexField` if none (or an empty name) was supplied.
pub(crate) fn index_field(
    field: Option<&str>,
    case: KeyCase,
) -> Result<String, SqlSessionError> {
    field
        .filter(|f| !f.is_empty())
        .map(|f| case.apply(f))
        .ok_or(SqlSessionError::MissingIndexField)
}

fn fetch_rows(stmt: &mut Statement<'_>, columns: &ColumnSet) -> Result<Vec<Row>, SqlSessionError> {
    let mut rows = Vec::new();
    while let Some(values) = stmt.fetch()? {
        rows.push(columns.row(values));
    }
    Ok(rows)
}

/// Shape an executed query according to `mode`.
pub(crate) fn shape(
    stmt: &mut Statement<'_>,
    mode: ResultMode,
    index_field_name: Option<&str>,
    case: KeyCase,
) -> Result<Shaped, SqlSessionError> {
    let names: Vec<String> = stmt
        .column_names()?
        .iter()
        .map(|name| case.apply(name))
        .collect();
    let columns = ColumnSet::new(names.clone());

    let (result, total_rows) = match mode {
        ResultMode::Raw => {
            let rows = fetch_rows(stmt, &columns)?;
            let total = rows.len();
            if rows.is_empty() {
                (QueryResult::NoRows, 0)
            } else {
                (QueryResult::Rows(rows), total)
            }
        }
        ResultMode::FirstRow => match stmt.fetch()? {
            Some(values) => (QueryResult::Row(columns.row(values)), 1),
            None => (QueryResult::NoRows, 0),
        },
        ResultMode::FirstRowFirstColumn => match stmt.fetch()? {
            Some(values) => {
                let first = values.into_iter().next().unwrap_or(RowValues::Null);
                (QueryResult::Value(first), 1)
            }
            None => (QueryResult::Value(RowValues::Text(String::new())), 0),
        },
        ResultMode::AllKeyValuePairs => {
            let mut pairs = Keyed::new();
            while let Some(values) = stmt.fetch()? {
                let mut values = values.into_iter();
                let key = values.next().unwrap_or(RowValues::Null).to_key();
                let value = values.next().unwrap_or(RowValues::Null);
                pairs.insert(key, value);
            }
            let total = pairs.len();
            (QueryResult::Pairs(pairs), total)
        }
        ResultMode::AllFirstColumnValues => {
            let mut column = Vec::new();
            while let Some(values) = stmt.fetch()? {
                column.push(values.into_iter().next().unwrap_or(RowValues::Null));
            }
            let total = column.len();
            (QueryResult::Column(column), total)
        }
        ResultMode::AllRows => {
            let rows = fetch_rows(stmt, &columns)?;
            let total = rows.len();
            (QueryResult::Rows(rows), total)
        }
        ResultMode::AllRowsAssoc => {
            let field = index_field(index_field_name, case)?;
            let position = columns
                .position(&field)
                .ok_or_else(|| SqlSessionError::UnknownIndexField(field.clone()))?;
            let mut keyed = Keyed::new();
            while let Some(values) = stmt.fetch()? {
                let key = values
                    .get(position)
                    .map(RowValues::to_key)
                    .unwrap_or_default();
                keyed.insert(key, columns.row(values));
            }
            let total = keyed.len();
            (QueryResult::Keyed(keyed), total)
        }
    };

    Ok(Shaped {
        result,
        columns: names,
        total_rows,
    })
}
