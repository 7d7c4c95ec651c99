#![cfg(feature = "sqlite")]

mod common;

use common::{connected, seed_customers};
use serde_json::json;
use sql_session::ERROR_SLOT;
use sql_session::prelude::*;

const ALL_CUSTOMERS: &str = "SELECT cust_id, name, city FROM customers ORDER BY cust_id";
const NO_CUSTOMERS: &str = "SELECT cust_id, name FROM customers WHERE 1 = 0";

#[test]
fn raw_and_all_rows_return_every_row() -> Result<(), Box<dyn std::error::Error>> {
    let (mut conn, _) = connected(&[])?;
    seed_customers(&mut conn)?;

    let rows = conn.query(ResultMode::Raw, ALL_CUSTOMERS)?;
    let rows = rows.as_rows().unwrap_or_default();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].column_names(), ["CUST_ID", "NAME", "CITY"]);
    assert_eq!(rows[1].get("NAME"), Some(&RowValues::Text("Grace".into())));
    assert_eq!(conn.last_total_rows(), 3);
    assert_eq!(conn.last_column_names(), ["CUST_ID", "NAME", "CITY"]);

    let all = conn.query(ResultMode::AllRows, ALL_CUSTOMERS)?;
    assert_eq!(all.as_rows().map(<[Row]>::len), Some(3));
    Ok(())
}

#[test]
fn empty_results_per_mode() -> Result<(), Box<dyn std::error::Error>> {
    let (mut conn, _) = connected(&[])?;
    seed_customers(&mut conn)?;

    assert!(conn.query(ResultMode::Raw, NO_CUSTOMERS)?.is_no_rows());
    assert!(conn.query(ResultMode::FirstRow, NO_CUSTOMERS)?.is_no_rows());
    assert_eq!(
        conn.query(ResultMode::FirstRowFirstColumn, NO_CUSTOMERS)?,
        QueryResult::Value(RowValues::Text(String::new()))
    );
    assert_eq!(conn.query(ResultMode::AllRows, NO_CUSTOMERS)?, QueryResult::Rows(vec![]));
    assert_eq!(
        conn.query(ResultMode::AllFirstColumnValues, NO_CUSTOMERS)?,
        QueryResult::Column(vec![])
    );
    assert_eq!(
        conn.query(ResultMode::AllKeyValuePairs, NO_CUSTOMERS)?,
        QueryResult::Pairs(Keyed::new())
    );
    assert_eq!(conn.last_total_rows(), 0);
    assert_eq!(conn.last_column_names(), ["CUST_ID", "NAME"]);
    Ok(())
}

#[test]
fn first_row_modes() -> Result<(), Box<dyn std::error::Error>> {
    let (mut conn, _) = connected(&[("caseQuery", "lower")])?;
    seed_customers(&mut conn)?;

    let first = conn.query(ResultMode::FirstRow, ALL_CUSTOMERS)?;
    let first = first.as_row().ok_or("expected a row")?;
    assert_eq!(first.get("name"), Some(&RowValues::Text("Ada".into())));
    assert_eq!(first.get("NAME"), None);
    assert_eq!(conn.last_total_rows(), 1);

    let count = conn.query(
        ResultMode::FirstRowFirstColumn,
        "SELECT count(*) AS n FROM customers",
    )?;
    assert_eq!(count, QueryResult::Value(RowValues::Int(3)));
    Ok(())
}

#[test]
fn single_row_modes_never_read_past_the_first_row() -> Result<(), Box<dyn std::error::Error>> {
    // The second row overflows; only reading it can fail.
    const SECOND_ROW_FAILS: &str = "SELECT CASE WHEN x = 1 THEN 'ok' \
        ELSE abs(-9223372036854775807 - 1) END AS v \
        FROM (SELECT 1 AS x UNION ALL SELECT 2)";
    let (mut conn, log) = connected(&[])?;

    let first = conn.query(ResultMode::FirstRow, SECOND_ROW_FAILS)?;
    assert_eq!(
        first.as_row().and_then(|r| r.get("V")),
        Some(&RowValues::Text("ok".into()))
    );
    assert_eq!(conn.last_total_rows(), 1);
    assert_eq!(
        conn.query(ResultMode::FirstRowFirstColumn, SECOND_ROW_FAILS)?,
        QueryResult::Value(RowValues::Text("ok".into()))
    );
    assert_eq!(log.count("ROW LIMIT 1"), 2);

    let err = conn.query(ResultMode::AllRows, SECOND_ROW_FAILS).unwrap_err();
    assert!(matches!(err, SqlSessionError::ExecuteFailed(ref e) if e.message.contains("overflow")));
    assert_eq!(log.count("ROW LIMIT 1"), 2);
    Ok(())
}

#[test]
fn repeated_column_names_collapse_to_the_last_value() -> Result<(), Box<dyn std::error::Error>> {
    let (mut conn, _) = connected(&[])?;
    let rows = conn.query(ResultMode::AllRows, "SELECT 1 AS a, 2 AS A")?;
    assert_eq!(serde_json::to_value(&rows)?, json!([{"A": 2}]));
    let row = &rows.as_rows().ok_or("expected rows")?[0];
    assert_eq!(row.column_names(), ["A"]);
    assert_eq!(row.get("A"), Some(&RowValues::Int(2)));
    assert_eq!(conn.last_column_names(), ["A", "A"]);
    Ok(())
}

#[test]
fn key_value_pairs_keep_first_position_and_last_value() -> Result<(), Box<dyn std::error::Error>> {
    let (mut conn, _) = connected(&[])?;
    seed_customers(&mut conn)?;
    conn.execute_dml("INSERT INTO customers VALUES (4, 'Ada', 'Paris')")?;

    let pairs = conn.query(
        ResultMode::AllKeyValuePairs,
        "SELECT name, city FROM customers ORDER BY cust_id",
    )?;
    let pairs = pairs.as_pairs().ok_or("expected pairs")?;
    assert_eq!(pairs.keys().collect::<Vec<_>>(), ["Ada", "Grace", "Linus"]);
    assert_eq!(pairs.get("Ada"), Some(&RowValues::Text("Paris".into())));
    assert_eq!(conn.last_total_rows(), 3);

    let single = conn.query(ResultMode::AllKeyValuePairs, "SELECT name FROM customers")?;
    assert_eq!(
        single.as_pairs().and_then(|p| p.get("Linus")),
        Some(&RowValues::Null)
    );
    Ok(())
}

#[test]
fn first_column_values() -> Result<(), Box<dyn std::error::Error>> {
    let (mut conn, _) = connected(&[])?;
    seed_customers(&mut conn)?;
    let cities = conn.query(
        ResultMode::AllFirstColumnValues,
        "SELECT city, name FROM customers ORDER BY city",
    )?;
    assert_eq!(
        cities,
        QueryResult::Column(vec![
            RowValues::Text("Arlington".into()),
            RowValues::Text("Helsinki".into()),
            RowValues::Text("London".into()),
        ])
    );
    Ok(())
}

#[test]
fn rows_keyed_by_index_field() -> Result<(), Box<dyn std::error::Error>> {
    let (mut conn, _) = connected(&[("caseQuery", "lower")])?;
    seed_customers(&mut conn)?;

    let options = QueryOptions::default().with_index_field("CITY");
    let keyed = conn
        .query_with(ResultMode::AllRowsAssoc, ALL_CUSTOMERS, &options)?
        .ok_or("not suppressed")?;
    let keyed = keyed.as_keyed().ok_or("expected keyed rows")?;
    assert_eq!(keyed.keys().collect::<Vec<_>>(), ["London", "Arlington", "Helsinki"]);
    assert_eq!(
        keyed.get("Helsinki").and_then(|r| r.get("name")),
        Some(&RowValues::Text("Linus".into()))
    );
    Ok(())
}

#[test]
fn index_field_misuse_always_raises() -> Result<(), Box<dyn std::error::Error>> {
    let (mut conn, log) = connected(&[])?;
    seed_customers(&mut conn)?;
    log.clear();

    let quiet = QueryOptions::default().with_exception_message("lookup failed");
    let err = conn
        .query_with(ResultMode::AllRowsAssoc, ALL_CUSTOMERS, &quiet)
        .unwrap_err();
    assert!(matches!(err, SqlSessionError::MissingIndexField));
    assert!(log.entries().is_empty(), "no statement reaches the driver");
    assert_eq!(conn.last_total_rows(), 0);

    let unknown = quiet.with_index_field("zip");
    let err = conn
        .query_with(ResultMode::AllRowsAssoc, ALL_CUSTOMERS, &unknown)
        .unwrap_err();
    assert!(matches!(err, SqlSessionError::UnknownIndexField(ref f) if f == "ZIP"));
    Ok(())
}

#[test]
fn database_failures_can_be_suppressed() -> Result<(), Box<dyn std::error::Error>> {
    let (mut conn, _) = connected(&[])?;

    let err = conn.query(ResultMode::Raw, "SELECT * FROM nowhere").unwrap_err();
    assert!(matches!(err, SqlSessionError::ParseFailed(_)));

    let quiet = QueryOptions::default().with_exception_message("report unavailable");
    let none = conn.query_with(ResultMode::Raw, "SELECT * FROM nowhere2", &quiet)?;
    assert_eq!(none, None);
    let slot = conn.last_error().unwrap_or_default();
    assert!(slot.contains("no such table: nowhere2"));
    assert!(slot.ends_with("\nSELECT * FROM nowhere2"));
    assert_eq!(conn.store().get(ERROR_SLOT).as_deref(), Some(slot.as_str()));
    Ok(())
}

#[test]
fn crlf_is_normalized_before_parsing() -> Result<(), Box<dyn std::error::Error>> {
    let (mut conn, log) = connected(&[])?;
    conn.query(ResultMode::Raw, "SELECT 1 AS one\r\nFROM dual")?;
    assert_eq!(log.entries().last().map(String::as_str), Some("SELECT 1 AS one\nFROM dual"));
    Ok(())
}

#[test]
fn results_serialize_as_plain_json() -> Result<(), Box<dyn std::error::Error>> {
    let (mut conn, _) = connected(&[("caseQuery", "lower")])?;
    seed_customers(&mut conn)?;

    let first = conn.query(ResultMode::FirstRow, ALL_CUSTOMERS)?;
    assert_eq!(
        serde_json::to_value(&first)?,
        json!({"cust_id": 1, "name": "Ada", "city": "London"})
    );
    let none = conn.query(ResultMode::Raw, NO_CUSTOMERS)?;
    assert_eq!(serde_json::to_value(&none)?, json!(null));
    Ok(())
}

#[test]
fn result_modes_parse_from_names_and_codes() {
    assert_eq!("all_rows_assoc".parse::<ResultMode>().ok(), Some(ResultMode::AllRowsAssoc));
    assert_eq!("3".parse::<ResultMode>().ok(), Some(ResultMode::AllKeyValuePairs));
    assert!(matches!(
        "sideways".parse::<ResultMode>(),
        Err(SqlSessionError::UnknownResultMode(_))
    ));
}
