//! Helpers for building SQL text from untrusted values.
//!
//! Prefer bind variables. These exist for the places a placeholder cannot go, such as an
//! `IN (...)` list of variable length.

/// Quote `value` as a SQL string literal, doubling embedded quotes.
#[must_use]
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// `NULL` for a missing or empty value, otherwise the quoted literal.
#[must_use]
pub fn quote_or_null(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => quote(v),
        _ => "NULL".to_string(),
    }
}

/// The quoted literal, or `default` (inserted verbatim) when `value` is missing or empty.
#[must_use]
pub fn quote_or_default(value: Option<&str>, default: &str) -> String {
    match value {
        Some(v) if !v.is_empty() => quote(v),
        _ => default.to_string(),
    }
}

/// A parenthesised, comma-separated list of quoted literals; `(NULL)` when empty.
#[must_use]
pub fn sql_list<I, S>(values: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let items: Vec<String> = values.into_iter().map(|v| quote(v.as_ref())).collect();
    if items.is_empty() {
        "(NULL)".to_string()
    } else {
        format!("({})", items.join(", "))
    }
}
